//! Off-route detection
//!
//! Decides, fix by fix, whether the traveler has left the planned route.
//! Single-fix excursions are tolerated: a deviation is reported only for a
//! coherent run of fixes moving away from the current maneuver.
//!
//! ## Decision order
//!
//! 1. Zero distance remaining: off-route
//! 2. First fix of the session: on-route, state recorded
//! 3. Debounce against the last reroute-check origin
//! 4. Effective radius from the fix accuracy
//! 5. Beyond the radius but near the upcoming maneuver: on-route, advance index
//! 6. Moving-away run sustained: off-route, otherwise on-route

mod detector;
mod state;

pub use detector::OffRouteDetector;
pub use state::{DistanceSample, MovingAwayHistory, OffRouteState, RerouteOrigin, SampleOutcome};

use crate::config::NavigationOptions;
use crate::progress::RouteProgress;
use crate::types::Location;

/// Outcome of one off-route evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffRouteDecision {
    pub off_route: bool,
    /// The traveler already reached the next maneuver; the route processor
    /// moves to the next step before the following fix.
    pub advance_index: bool,
}

impl OffRouteDecision {
    pub const fn on_route() -> Self {
        Self {
            off_route: false,
            advance_index: false,
        }
    }

    pub const fn off_route() -> Self {
        Self {
            off_route: true,
            advance_index: false,
        }
    }

    pub const fn advance() -> Self {
        Self {
            off_route: false,
            advance_index: true,
        }
    }
}

/// Pluggable off-route classifier.
///
/// The engine is owned by the route processor and only ever called from the
/// session worker, so implementations may keep mutable state without locks.
pub trait OffRouteEngine: Send {
    /// Engine name used in logs
    fn name(&self) -> &str;

    /// Classify one fix against the progress computed for it.
    fn evaluate(
        &mut self,
        location: &Location,
        progress: &RouteProgress,
        options: &NavigationOptions,
    ) -> OffRouteDecision;

    /// Forget all session state. Called when a new route is installed.
    fn reset(&mut self);
}
