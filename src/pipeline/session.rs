//! Navigation Session - worker and listener tasks behind a cloneable handle
//!
//! ```text
//! producer ──submit──▶ [command mailbox] ──▶ worker task (RouteProcessor)
//!                                                 │
//!                                   [dispatch mailbox]
//!                                                 ▼
//!                                          listener task ──▶ NavigationListener
//! ```
//!
//! Both mailboxes are unbounded so `submit` never blocks and no fix is
//! coalesced. Ending the session cancels both tasks: queued fixes are dropped
//! and results not yet delivered are discarded. If the listener task stops
//! (a panicking listener), the worker reports a listener failure and ends the
//! session itself.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

use super::listener::{deliver, NavigationListener};
use super::processor::{ProcessorStats, RouteProcessor};
use crate::error::{Component, NavigationError};
use crate::milestone::Milestone;
use crate::types::{Location, NavigationUpdate, Route};

// ============================================================================
// Commands
// ============================================================================

/// Commands for the session worker
pub enum NavigationCommand {
    /// Process one fix
    Fix(Location),
    /// Install a new route (reroute)
    SetRoute {
        route: Route,
        response_tx: oneshot::Sender<Result<(), NavigationError>>,
    },
    AddMilestone(Milestone),
    AddMilestones(Vec<Milestone>),
    /// Remove one milestone, or all of them for `None`
    RemoveMilestone(Option<Milestone>),
    RemoveMilestoneById(i64),
    ClearMilestones,
    GetMilestones {
        response_tx: oneshot::Sender<Vec<Milestone>>,
    },
    GetStats {
        response_tx: oneshot::Sender<ProcessorStats>,
    },
    /// Answered by the listener task once everything before it was delivered
    Flush {
        response_tx: oneshot::Sender<()>,
    },
}

/// Worker to listener messages.
enum DispatchEvent {
    Update(Box<NavigationUpdate>),
    Flush(oneshot::Sender<()>),
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to a running navigation session.
///
/// Cheap to clone; every clone feeds the same worker.
#[derive(Clone)]
pub struct NavigationHandle {
    tx: mpsc::UnboundedSender<NavigationCommand>,
    cancel_token: CancellationToken,
}

impl NavigationHandle {
    fn send(&self, cmd: NavigationCommand) -> Result<(), NavigationError> {
        if self.cancel_token.is_cancelled() {
            return Err(NavigationError::SessionEnded);
        }
        self.tx.send(cmd).map_err(|_| NavigationError::SessionEnded)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> NavigationCommand,
    ) -> Result<T, NavigationError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.send(build(response_tx))?;
        response_rx.await.map_err(|_| NavigationError::SessionEnded)
    }

    /// Queue a fix for processing. Never blocks.
    pub fn submit(&self, fix: Location) -> Result<(), NavigationError> {
        self.send(NavigationCommand::Fix(fix))
    }

    /// Install a new route after every fix queued before it.
    pub async fn set_route(&self, route: Route) -> Result<(), NavigationError> {
        self.request(|response_tx| NavigationCommand::SetRoute { route, response_tx })
            .await?
    }

    pub fn add_milestone(&self, milestone: Milestone) -> Result<(), NavigationError> {
        self.send(NavigationCommand::AddMilestone(milestone))
    }

    pub fn add_milestones(&self, milestones: Vec<Milestone>) -> Result<(), NavigationError> {
        self.send(NavigationCommand::AddMilestones(milestones))
    }

    /// Remove the matching milestone, or every milestone for `None`.
    pub fn remove_milestone(&self, milestone: Option<Milestone>) -> Result<(), NavigationError> {
        self.send(NavigationCommand::RemoveMilestone(milestone))
    }

    pub fn remove_milestone_by_id(&self, identifier: i64) -> Result<(), NavigationError> {
        self.send(NavigationCommand::RemoveMilestoneById(identifier))
    }

    pub fn clear_milestones(&self) -> Result<(), NavigationError> {
        self.send(NavigationCommand::ClearMilestones)
    }

    /// Registered milestones, in evaluation order.
    pub async fn milestones(&self) -> Result<Vec<Milestone>, NavigationError> {
        self.request(|response_tx| NavigationCommand::GetMilestones { response_tx })
            .await
    }

    pub async fn stats(&self) -> Result<ProcessorStats, NavigationError> {
        self.request(|response_tx| NavigationCommand::GetStats { response_tx })
            .await
    }

    /// Resolves once every fix submitted before this call has been delivered
    /// to the listener.
    pub async fn flush(&self) -> Result<(), NavigationError> {
        self.request(|response_tx| NavigationCommand::Flush { response_tx })
            .await
    }

    /// End the session without waiting for the tasks.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_ended(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Resolves once the session has ended, for whatever reason.
    pub async fn ended(&self) {
        self.cancel_token.cancelled().await;
    }
}

// ============================================================================
// Session
// ============================================================================

/// Final counters of an ended session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSummary {
    pub stats: ProcessorStats,
    /// Fixes still queued when the session ended
    pub dropped_fixes: u64,
    /// Updates handed to the listener
    pub delivered_updates: u64,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} | {} delivered, {} dropped",
            self.stats, self.delivered_updates, self.dropped_fixes
        )
    }
}

/// Owner of the worker and listener tasks.
///
/// Dropping the session ends it; [`shutdown`](Self::shutdown) also waits for
/// both tasks and returns their counters.
pub struct NavigationSession {
    handle: NavigationHandle,
    worker: JoinHandle<(ProcessorStats, u64)>,
    listener: JoinHandle<u64>,
    _guard: DropGuard,
}

impl NavigationSession {
    /// Spawn the worker and listener tasks. Must be called inside a Tokio runtime.
    pub fn start<L: NavigationListener>(processor: RouteProcessor, listener: L) -> Self {
        let cancel_token = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(run_worker(processor, rx, events_tx, cancel_token.clone()));
        let listener = tokio::spawn(run_listener(listener, events_rx, cancel_token.clone()));

        info!("Navigation session started");

        Self {
            handle: NavigationHandle {
                tx,
                cancel_token: cancel_token.clone(),
            },
            worker,
            listener,
            _guard: cancel_token.drop_guard(),
        }
    }

    pub fn handle(&self) -> NavigationHandle {
        self.handle.clone()
    }

    /// End the session and wait for both tasks.
    pub async fn shutdown(self) -> SessionSummary {
        let Self {
            handle,
            worker,
            listener,
            _guard,
        } = self;
        handle.cancel();

        let (stats, dropped_fixes) = worker.await.unwrap_or_else(|e| {
            warn!("Navigation worker task failed: {}", e);
            (ProcessorStats::default(), 0)
        });
        let delivered_updates = listener.await.unwrap_or_else(|e| {
            warn!("Navigation listener task failed: {}", e);
            0
        });

        let summary = SessionSummary {
            stats,
            dropped_fixes,
            delivered_updates,
        };
        info!("Navigation session ended: {}", summary);
        summary
    }
}

// ============================================================================
// Tasks
// ============================================================================

async fn run_worker(
    mut processor: RouteProcessor,
    mut rx: mpsc::UnboundedReceiver<NavigationCommand>,
    events_tx: mpsc::UnboundedSender<DispatchEvent>,
    cancel_token: CancellationToken,
) -> (ProcessorStats, u64) {
    info!("Navigation worker starting");

    loop {
        let cmd = tokio::select! {
            biased;
            () = cancel_token.cancelled() => break,
            cmd = rx.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };

        match cmd {
            NavigationCommand::Fix(fix) => {
                // rejected fixes were already reported to the failure observer
                if let Ok(update) = processor.process(&fix) {
                    if cancel_token.is_cancelled() {
                        debug!("Session ended during processing, result discarded");
                        break;
                    }
                    if events_tx.send(DispatchEvent::Update(Box::new(update))).is_err() {
                        listener_lost(&mut processor, &cancel_token);
                        break;
                    }
                }
            }
            NavigationCommand::SetRoute { route, response_tx } => {
                let _ = response_tx.send(processor.set_route(route));
            }
            NavigationCommand::AddMilestone(milestone) => {
                processor.add_milestone(milestone);
            }
            NavigationCommand::AddMilestones(milestones) => {
                processor.milestones_mut().add_all(milestones);
            }
            NavigationCommand::RemoveMilestone(milestone) => {
                processor.milestones_mut().remove(milestone.as_ref());
            }
            NavigationCommand::RemoveMilestoneById(identifier) => {
                processor.milestones_mut().remove_by_id(identifier);
            }
            NavigationCommand::ClearMilestones => processor.milestones_mut().clear(),
            NavigationCommand::GetMilestones { response_tx } => {
                let _ = response_tx.send(processor.milestones().snapshot());
            }
            NavigationCommand::GetStats { response_tx } => {
                let _ = response_tx.send(processor.stats());
            }
            NavigationCommand::Flush { response_tx } => {
                if events_tx.send(DispatchEvent::Flush(response_tx)).is_err() {
                    listener_lost(&mut processor, &cancel_token);
                    break;
                }
            }
        }
    }

    rx.close();
    let mut dropped_fixes = 0u64;
    while let Ok(cmd) = rx.try_recv() {
        if matches!(cmd, NavigationCommand::Fix(_)) {
            dropped_fixes += 1;
        }
    }

    info!(
        processed = processor.stats().fixes_processed,
        dropped = dropped_fixes,
        "Navigation worker stopped"
    );
    (processor.stats(), dropped_fixes)
}

/// The listener task is gone, so nothing processed from now on could be
/// delivered: report it and end the session.
fn listener_lost(processor: &mut RouteProcessor, cancel_token: &CancellationToken) {
    error!("Listener task stopped, ending navigation session");
    processor.report_failure(&NavigationError::ComponentFailure {
        component: Component::Listener,
        message: "listener task stopped, updates can no longer be delivered".to_string(),
    });
    cancel_token.cancel();
}

async fn run_listener<L: NavigationListener>(
    mut listener: L,
    mut rx: mpsc::UnboundedReceiver<DispatchEvent>,
    cancel_token: CancellationToken,
) -> u64 {
    let mut delivered = 0u64;

    loop {
        let event = tokio::select! {
            biased;
            () = cancel_token.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            DispatchEvent::Update(update) => {
                deliver(&mut listener, &update);
                delivered += 1;
            }
            DispatchEvent::Flush(response_tx) => {
                let _ = response_tx.send(());
            }
        }
    }

    debug!(delivered, "Navigation listener stopped");
    delivered
}
