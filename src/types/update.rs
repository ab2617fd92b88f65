//! Per-fix pipeline output

use super::Location;
use crate::milestone::FiredMilestone;
use crate::progress::RouteProgress;

/// Everything the route processor decided for one fix.
#[derive(Debug, Clone)]
pub struct NavigationUpdate {
    pub progress: RouteProgress,
    /// Fired milestones in registration order, possibly empty
    pub milestones: Vec<FiredMilestone>,
    /// Snapped location, or the raw fix when snapping does not apply
    pub location: Location,
    pub off_route: bool,
}

impl NavigationUpdate {
    /// The fix the update was computed from.
    pub fn raw_location(&self) -> &Location {
        &self.progress.location
    }
}
