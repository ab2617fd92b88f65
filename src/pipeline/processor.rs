//! Route Processor - fixed-order per-fix decision sequence
//!
//! ```text
//! PHASE 1: Route progress (indices clamped, maneuver-zone advance)
//! PHASE 2: Off-route decision (+ early advance applied to the indices)
//! PHASE 3: Milestones against (previous, current) progress
//! PHASE 4: Snapped display location
//! PHASE 5: Current progress becomes previous
//! ```
//!
//! Phases 2-4 run isolated: a panic inside one of them is reported to the
//! failure observer and replaced by a fallback (last off-route value, no
//! announcement from the failing milestone, raw fix) so the other results
//! are still delivered.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::NavigationOptions;
use crate::error::{Component, NavigationError};
use crate::milestone::{FiredMilestone, Milestone, MilestoneRegistry};
use crate::observer::{FailureObserver, TracingObserver};
use crate::offroute::{OffRouteDecision, OffRouteDetector, OffRouteEngine};
use crate::progress::RouteProgress;
use crate::snap::{SnapEngine, SnapToRoute};
use crate::types::{Location, NavigationUpdate, Route};

/// Counters kept across the life of a processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub fixes_processed: u64,
    pub fixes_rejected: u64,
    pub off_route_reports: u64,
    pub index_advances: u64,
    pub milestones_fired: u64,
    pub component_failures: u64,
    pub routes_installed: u64,
}

impl std::fmt::Display for ProcessorStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processor: {} fixes ({} rejected), {} off-route, {} advances, {} milestones, {} failures, {} routes",
            self.fixes_processed,
            self.fixes_rejected,
            self.off_route_reports,
            self.index_advances,
            self.milestones_fired,
            self.component_failures,
            self.routes_installed
        )
    }
}

/// Owns all per-session navigation state and turns fixes into updates.
pub struct RouteProcessor {
    route: Arc<Route>,
    options: Arc<NavigationOptions>,
    leg_index: usize,
    step_index: usize,
    /// Progress of the last processed fix, for milestone deltas
    previous: Option<RouteProgress>,
    off_route_engine: Box<dyn OffRouteEngine>,
    snap_engine: Box<dyn SnapEngine>,
    milestones: MilestoneRegistry,
    observer: Arc<dyn FailureObserver>,
    /// Off-route fallback when the engine fails
    last_off_route: bool,
    stats: ProcessorStats,
}

impl RouteProcessor {
    /// Processor with the default engines and, unless disabled in `options`,
    /// the built-in voice and banner milestones.
    pub fn new(route: impl Into<Arc<Route>>, options: Arc<NavigationOptions>) -> Result<Self, NavigationError> {
        let route = route.into();
        route.validate()?;

        info!(
            legs = route.legs.len(),
            steps = route.total_steps(),
            distance_m = route.distance,
            default_milestones = options.default_milestones_enabled,
            "Route processor initialised"
        );

        Ok(Self {
            milestones: MilestoneRegistry::with_defaults(options.default_milestones_enabled),
            route,
            options,
            leg_index: 0,
            step_index: 0,
            previous: None,
            off_route_engine: Box::new(OffRouteDetector::new()),
            snap_engine: Box::new(SnapToRoute),
            observer: Arc::new(TracingObserver),
            last_off_route: false,
            stats: ProcessorStats {
                routes_installed: 1,
                ..ProcessorStats::default()
            },
        })
    }

    #[must_use]
    pub fn with_off_route_engine(mut self, engine: Box<dyn OffRouteEngine>) -> Self {
        info!(engine = engine.name(), "Off-route engine replaced");
        self.off_route_engine = engine;
        self
    }

    #[must_use]
    pub fn with_snap_engine(mut self, engine: Box<dyn SnapEngine>) -> Self {
        info!(engine = engine.name(), "Snap engine replaced");
        self.snap_engine = engine;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn options(&self) -> &NavigationOptions {
        &self.options
    }

    /// `(leg, step)` the next fix will be measured against.
    pub const fn indices(&self) -> (usize, usize) {
        (self.leg_index, self.step_index)
    }

    pub const fn previous_progress(&self) -> Option<&RouteProgress> {
        self.previous.as_ref()
    }

    pub const fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub const fn milestones(&self) -> &MilestoneRegistry {
        &self.milestones
    }

    pub fn milestones_mut(&mut self) -> &mut MilestoneRegistry {
        &mut self.milestones
    }

    pub fn add_milestone(&mut self, milestone: Milestone) -> bool {
        self.milestones.add(milestone)
    }

    /// Install a new route (reroute).
    ///
    /// Indices, previous progress, off-route state and milestone firing
    /// state are reset. An invalid route is rejected and nothing changes.
    pub fn set_route(&mut self, route: impl Into<Arc<Route>>) -> Result<(), NavigationError> {
        let route = route.into();
        if let Err(e) = route.validate() {
            warn!(error = %e, "Rejected new route");
            self.observer.on_failure(&e);
            return Err(e);
        }

        self.route = route;
        self.leg_index = 0;
        self.step_index = 0;
        self.previous = None;
        self.last_off_route = false;
        self.off_route_engine.reset();
        self.milestones.reset();
        self.stats.routes_installed += 1;

        info!(
            legs = self.route.legs.len(),
            steps = self.route.total_steps(),
            distance_m = self.route.distance,
            "New route installed, navigation state reset"
        );
        Ok(())
    }

    /// Run one fix through every phase.
    pub fn process(&mut self, fix: &Location) -> Result<NavigationUpdate, NavigationError> {
        // === PHASE 1: Route progress ===
        let progress = match RouteProgress::build(
            Arc::clone(&self.route),
            self.leg_index,
            self.step_index,
            fix,
            self.options.maneuver_zone_radius,
        ) {
            Ok(p) => p,
            Err(e) => {
                self.stats.fixes_rejected += 1;
                self.observer.on_failure(&e);
                return Err(e);
            }
        };

        if (progress.leg_index, progress.step_index) != (self.leg_index, self.step_index) {
            self.stats.index_advances += 1;
            info!(
                leg = progress.leg_index,
                step = progress.step_index,
                "Advanced to next step"
            );
        }
        self.leg_index = progress.leg_index;
        self.step_index = progress.step_index;

        // === PHASE 2: Off-route decision ===
        let fallback = OffRouteDecision {
            off_route: self.last_off_route,
            advance_index: false,
        };
        let decision = isolate(
            Component::OffRoute,
            self.observer.as_ref(),
            &mut self.stats,
            || self.off_route_engine.evaluate(fix, &progress, &self.options),
        )
        .unwrap_or(fallback);

        if decision.off_route {
            self.stats.off_route_reports += 1;
        }
        if decision.off_route != self.last_off_route {
            info!(
                off_route = decision.off_route,
                leg = progress.leg_index,
                step = progress.step_index,
                "Off-route status changed"
            );
        }
        // affects only the next fix; this fix keeps its progress
        if decision.advance_index {
            self.advance_index();
        }

        // === PHASE 3: Milestones ===
        // isolated per milestone: a failure drops only that announcement
        let previous = self.previous.as_ref();
        let mut fired = Vec::new();
        for milestone in self.milestones.iter_mut() {
            let identifier = milestone.identifier();
            let announcement = isolate(
                Component::Milestones,
                self.observer.as_ref(),
                &mut self.stats,
                || milestone.evaluate(previous, &progress),
            );
            if let Some(Some(announcement)) = announcement {
                fired.push(FiredMilestone {
                    identifier,
                    announcement,
                });
            }
        }

        // === PHASE 4: Snapped location ===
        let location = isolate(
            Component::Snap,
            self.observer.as_ref(),
            &mut self.stats,
            || {
                self.snap_engine.snap(
                    fix,
                    progress.current_step_points(),
                    decision.off_route,
                    self.options.snap_to_route,
                )
            },
        )
        .unwrap_or_else(|| fix.clone());

        // === PHASE 5: Progress becomes previous ===
        self.previous = Some(progress.clone());
        self.last_off_route = decision.off_route;
        self.stats.fixes_processed += 1;
        self.stats.milestones_fired += fired.len() as u64;

        debug!(
            leg = progress.leg_index,
            step = progress.step_index,
            distance_remaining_m = progress.distance_remaining,
            off_route = decision.off_route,
            milestones = fired.len(),
            "Fix processed"
        );

        Ok(NavigationUpdate {
            progress,
            milestones: fired,
            location,
            off_route: decision.off_route,
        })
    }

    /// Report a failure raised outside the per-fix phases.
    pub fn report_failure(&mut self, error: &NavigationError) {
        if matches!(error, NavigationError::ComponentFailure { .. }) {
            self.stats.component_failures += 1;
        }
        self.observer.on_failure(error);
    }

    fn advance_index(&mut self) {
        if let Some((leg, step)) = self.route.next_step_indices(self.leg_index, self.step_index) {
            self.leg_index = leg;
            self.step_index = step;
            self.stats.index_advances += 1;
            info!(leg, step, "Advanced to next step ahead of maneuver zone");
        }
    }
}

/// Run one component, converting a panic into a reported failure.
fn isolate<T>(
    component: Component,
    observer: &dyn FailureObserver,
    stats: &mut ProcessorStats,
    f: impl FnOnce() -> T,
) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            stats.component_failures += 1;
            observer.on_failure(&NavigationError::from_panic(component, payload.as_ref()));
            None
        }
    }
}
