//! Default off-route engine

use tracing::{debug, info};

use super::state::{DistanceSample, OffRouteState, SampleOutcome};
use super::{OffRouteDecision, OffRouteEngine};
use crate::config::NavigationOptions;
use crate::geometry;
use crate::progress::RouteProgress;
use crate::types::{Location, Point};

/// Radius and moving-away classifier.
#[derive(Debug, Clone, Default)]
pub struct OffRouteDetector {
    state: OffRouteState,
}

impl OffRouteDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector resuming from previously captured state.
    pub const fn with_state(state: OffRouteState) -> Self {
        Self { state }
    }

    pub const fn state(&self) -> &OffRouteState {
        &self.state
    }

    fn report_off_route(&mut self, location: &Location) -> OffRouteDecision {
        self.state.move_origin(location);
        self.state.history_mut().clear();
        OffRouteDecision::off_route()
    }
}

impl OffRouteEngine for OffRouteDetector {
    fn name(&self) -> &str {
        "OffRouteDetector"
    }

    fn evaluate(
        &mut self,
        location: &Location,
        progress: &RouteProgress,
        options: &NavigationOptions,
    ) -> OffRouteDecision {
        if progress.distance_remaining <= 0.0 {
            return OffRouteDecision::off_route();
        }

        let position = location.point();
        let Some(origin) = self.state.reroute_origin().cloned() else {
            self.state.move_origin(location);
            self.state.track_step((progress.leg_index, progress.step_index));
            debug!("First fix of session, anchoring reroute origin");
            return OffRouteDecision::on_route();
        };

        // the first fix on a new step only re-anchors the history
        if self.state.track_step((progress.leg_index, progress.step_index)) {
            debug!(
                leg = progress.leg_index,
                step = progress.step_index,
                "Step changed, moving-away history cleared"
            );
            return OffRouteDecision::on_route();
        }

        let moved_m = geometry::haversine(&origin.point, &position);
        if moved_m <= options.off_route_minimum_distance_meters {
            return OffRouteDecision::on_route();
        }

        let radius_m = options.effective_radius(location.accuracy);
        let step_points = progress.current_step_points();
        let offset_m = geometry::distance_to_line(&position, step_points);
        let within_radius = offset_m.is_some_and(|d| d <= radius_m);

        if !within_radius {
            if let Some(upcoming) = progress.upcoming_step() {
                let to_upcoming_m = geometry::haversine(&position, &upcoming.maneuver.location);
                if to_upcoming_m <= radius_m {
                    info!(
                        leg = progress.leg_index,
                        step = progress.step_index,
                        distance_m = to_upcoming_m,
                        "Close to upcoming maneuver, advancing step"
                    );
                    self.state.move_origin(location);
                    self.state.history_mut().clear();
                    return OffRouteDecision::advance();
                }
            }
        }

        let right_direction_m = options.off_route_minimum_distance_before_right_direction;
        let outcome = distance_to_maneuver_m(&position, step_points).map(|distance_m| {
            self.state
                .history_mut()
                .push(DistanceSample { distance_m }, right_direction_m)
        });

        let history = self.state.history();
        if history.is_sustained(options.moving_away_run_length, right_direction_m) {
            info!(
                offset_m = offset_m.unwrap_or_default(),
                radius_m,
                increases = history.increases(),
                growth_m = history.growth_m(),
                within_radius,
                "Sustained divergence from route"
            );
            return self.report_off_route(location);
        }

        debug!(
            offset_m = offset_m.unwrap_or_default(),
            radius_m,
            within_radius,
            outcome = ?outcome.unwrap_or(SampleOutcome::Jitter),
            increases = history.increases(),
            "On route"
        );
        OffRouteDecision::on_route()
    }

    fn reset(&mut self) {
        self.state.reset();
    }
}

/// Lateral offset plus the remaining step length ahead of the projection.
///
/// The sum is floored to whole meters, so sub-meter movement never counts as
/// an increase. Returns `None` when the sum is under one meter (the fix is at
/// the maneuver itself) or when the step has fewer than two points.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn distance_to_maneuver_m(position: &Point, step_points: &[Point]) -> Option<u32> {
    let projection = geometry::project_on_line(position, step_points)?;
    let ahead = geometry::slice_from_projection(step_points, &projection);
    let total = projection.distance_m + geometry::line_length(&ahead);
    (total >= 1.0).then(|| total.floor() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::destination;
    use crate::types::{LegStep, Route, RouteLeg, StepManeuver};
    use chrono::Utc;
    use std::sync::Arc;

    const ORIGIN: Point = Point::new(-77.0339, 38.8999);

    fn step_along(points: Vec<Point>) -> LegStep {
        let distance = geometry::line_length(&points);
        LegStep {
            maneuver: StepManeuver {
                location: points[0],
                bearing_before: 0.0,
                bearing_after: 90.0,
                kind: "depart".to_string(),
                modifier: None,
                instruction: String::new(),
            },
            geometry: points,
            distance,
            duration: distance / 10.0,
            name: String::new(),
            voice_instructions: Vec::new(),
            banner_instructions: Vec::new(),
        }
    }

    /// One eastbound step with ten vertices 25 m apart.
    fn ten_point_step() -> Vec<Point> {
        (0..10)
            .map(|i| destination(&ORIGIN, f64::from(i) * 25.0, 90.0))
            .collect()
    }

    fn progress_for(route: Route) -> RouteProgress {
        let fix = Location::at_point(ORIGIN, Utc::now());
        RouteProgress::build(Arc::new(route), 0, 0, &fix, 0.0).unwrap()
    }

    fn fix(point: Point) -> Location {
        Location::at_point(point, Utc::now())
    }

    #[test]
    fn first_fix_is_on_route() {
        let progress = progress_for(Route::from_legs(vec![RouteLeg::from_steps(vec![
            step_along(ten_point_step()),
        ])]));
        let mut detector = OffRouteDetector::new();

        let decision = detector.evaluate(&fix(ORIGIN), &progress, &NavigationOptions::default());
        assert_eq!(decision, OffRouteDecision::on_route());
        assert!(detector.state().reroute_origin().is_some());
    }

    #[test]
    fn zero_distance_remaining_is_off_route() {
        let points = ten_point_step();
        let route = Route::from_legs(vec![RouteLeg::from_steps(vec![step_along(points.clone())])]);
        let at_end = RouteProgress::build(Arc::new(route), 0, 0, &fix(points[9]), 0.0).unwrap();
        let mut detector = OffRouteDetector::new();

        let decision = detector.evaluate(&fix(points[9]), &at_end, &NavigationOptions::default());
        assert!(decision.off_route);
    }

    #[test]
    fn reset_forgets_origin() {
        let progress = progress_for(Route::from_legs(vec![RouteLeg::from_steps(vec![
            step_along(ten_point_step()),
        ])]));
        let mut detector = OffRouteDetector::new();
        detector.evaluate(&fix(ORIGIN), &progress, &NavigationOptions::default());

        detector.reset();
        assert!(detector.state().reroute_origin().is_none());
        assert!(detector.state().history().is_empty());
    }

    #[test]
    fn distance_to_maneuver_skips_the_maneuver_itself() {
        let points = ten_point_step();
        assert_eq!(distance_to_maneuver_m(&points[9], &points), None);
        let d = distance_to_maneuver_m(&points[5], &points).unwrap();
        assert!((99..=100).contains(&d), "got {d}");
        assert_eq!(distance_to_maneuver_m(&points[5], &points[..1]), None);
    }

    #[test]
    fn distance_to_maneuver_floors_to_whole_meters() {
        let points = ten_point_step();
        let just_short = destination(&points[9], 0.6, 270.0);
        assert_eq!(distance_to_maneuver_m(&just_short, &points), None);

        let further = destination(&points[9], 1.7, 270.0);
        assert_eq!(distance_to_maneuver_m(&further, &points), Some(1));
    }
}
