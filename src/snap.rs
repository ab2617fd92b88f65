//! Display location snapping
//!
//! Projects a raw fix onto the current step geometry so the displayed
//! position stays on the road. The raw fix is returned untouched whenever
//! snapping does not apply.

use crate::geometry;
use crate::types::{Location, Point};

/// Pluggable display-location engine.
pub trait SnapEngine: Send {
    /// Engine name used in logs
    fn name(&self) -> &str;

    fn snap(&self, raw: &Location, geometry: &[Point], off_route: bool, enabled: bool) -> Location;
}

/// Default engine: nearest point on the step polyline.
#[derive(Debug, Default, Clone, Copy)]
pub struct SnapToRoute;

impl SnapEngine for SnapToRoute {
    fn name(&self) -> &str {
        "SnapToRoute"
    }

    fn snap(&self, raw: &Location, geometry: &[Point], off_route: bool, enabled: bool) -> Location {
        snap(raw, geometry, off_route, enabled)
    }
}

/// Snap `raw` onto `geometry`.
///
/// Returns `raw` unchanged when snapping is disabled, the traveler is off
/// route, or the geometry has fewer than two coordinates. Otherwise only the
/// position changes; bearing, speed, accuracy and timestamp are carried over.
pub fn snap(raw: &Location, geometry: &[Point], off_route: bool, enabled: bool) -> Location {
    if !enabled || off_route {
        return raw.clone();
    }
    match geometry::project_on_line(&raw.point(), geometry) {
        Some(projection) => raw.relocated(projection.point),
        None => raw.clone(),
    }
}
