//! Result delivery
//!
//! Every processed fix produces exactly three callbacks on the listener task,
//! always in this order: progress, milestones, off-route.

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::milestone::{Announcement, FiredMilestone};
use crate::progress::RouteProgress;
use crate::types::{Location, NavigationUpdate};

/// Receiver of navigation results.
///
/// Runs on the session's listener task, never on the worker.
pub trait NavigationListener: Send + 'static {
    /// `location` is the display (possibly snapped) location.
    fn on_progress_change(&mut self, location: &Location, progress: &RouteProgress);

    /// Called for every fix; `milestones` is empty when none fired.
    fn on_milestone_event(&mut self, milestones: &[FiredMilestone], progress: &RouteProgress);

    fn on_off_route(&mut self, location: &Location, off_route: bool);
}

/// Deliver one update as the three ordered callbacks.
pub(crate) fn deliver<L: NavigationListener + ?Sized>(listener: &mut L, update: &NavigationUpdate) {
    listener.on_progress_change(&update.location, &update.progress);
    listener.on_milestone_event(&update.milestones, &update.progress);
    listener.on_off_route(&update.location, update.off_route);
}

// ============================================================================
// Channel Listener
// ============================================================================

/// One listener callback, as forwarded by [`ChannelListener`].
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    Progress {
        location: Location,
        progress: RouteProgress,
    },
    Milestones {
        milestones: Vec<FiredMilestone>,
        progress: RouteProgress,
    },
    OffRoute {
        location: Location,
        off_route: bool,
    },
}

/// Forwards every callback to an unbounded channel.
///
/// Useful for hosts that consume results from their own task, and for tests.
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<ListenerEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ListenerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: ListenerEvent) {
        // receiver gone: the host stopped listening
        let _ = self.tx.send(event);
    }
}

impl NavigationListener for ChannelListener {
    fn on_progress_change(&mut self, location: &Location, progress: &RouteProgress) {
        self.forward(ListenerEvent::Progress {
            location: location.clone(),
            progress: progress.clone(),
        });
    }

    fn on_milestone_event(&mut self, milestones: &[FiredMilestone], progress: &RouteProgress) {
        self.forward(ListenerEvent::Milestones {
            milestones: milestones.to_vec(),
            progress: progress.clone(),
        });
    }

    fn on_off_route(&mut self, location: &Location, off_route: bool) {
        self.forward(ListenerEvent::OffRoute {
            location: location.clone(),
            off_route,
        });
    }
}

// ============================================================================
// Logging Listener
// ============================================================================

/// Logs every result. Used by the replay binary.
#[derive(Debug, Default)]
pub struct LoggingListener {
    last_off_route: bool,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NavigationListener for LoggingListener {
    fn on_progress_change(&mut self, location: &Location, progress: &RouteProgress) {
        debug!(
            lat = location.latitude,
            lon = location.longitude,
            leg = progress.leg_index,
            step = progress.step_index,
            step_remaining_m = format!("{:.1}", progress.step_distance_remaining),
            route_remaining_m = format!("{:.1}", progress.distance_remaining),
            fraction = format!("{:.3}", progress.fraction_traveled),
            "Progress"
        );
    }

    fn on_milestone_event(&mut self, milestones: &[FiredMilestone], progress: &RouteProgress) {
        for fired in milestones {
            let text = match &fired.announcement {
                Announcement::Voice { text, .. } | Announcement::Custom(text) => text.as_str(),
                Announcement::Banner(banner) => banner.primary.text.as_str(),
                Announcement::Step { instruction, .. } => instruction.as_str(),
            };
            info!(
                id = fired.identifier,
                step = progress.step_index,
                "🔔 {}",
                text
            );
        }
    }

    fn on_off_route(&mut self, location: &Location, off_route: bool) {
        if off_route && !self.last_off_route {
            info!(
                lat = location.latitude,
                lon = location.longitude,
                "⚠️  Off route - new route required"
            );
        } else if !off_route && self.last_off_route {
            info!("Back on route");
        }
        self.last_off_route = off_route;
    }
}
