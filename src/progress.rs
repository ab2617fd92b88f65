//! Route progress snapshots
//!
//! A `RouteProgress` is rebuilt from scratch for every fix. It never mutates
//! and holds the route by `Arc`, so a snapshot can be handed to the listener
//! while the worker goes on building the next one.

use std::sync::Arc;

use tracing::debug;

use crate::error::NavigationError;
use crate::geometry;
use crate::types::{BannerInstruction, LegStep, Location, Point, Route, RouteLeg, VoiceInstruction};

/// Remainders shorter than this are projection noise at the maneuver (meters).
const ARRIVAL_TOLERANCE_M: f64 = 0.01;

/// Position of a traveler along a route at the time of one fix.
#[derive(Debug, Clone)]
pub struct RouteProgress {
    route: Arc<Route>,
    pub leg_index: usize,
    pub step_index: usize,
    /// Meters left until the end of the route
    pub distance_remaining: f64,
    /// Seconds left, scaled from the route duration
    pub duration_remaining: f64,
    /// Share of the route already covered, in `[0, 1]`
    pub fraction_traveled: f64,
    pub leg_distance_remaining: f64,
    pub step_distance_remaining: f64,
    pub step_distance_traveled: f64,
    pub step_fraction_traveled: f64,
    /// Current step geometry from the traveler's projection to the maneuver
    pub remaining_step_points: Vec<Point>,
    pub current_voice_instruction: Option<VoiceInstruction>,
    pub current_banner_instruction: Option<BannerInstruction>,
    /// The raw fix this snapshot was built from
    pub location: Location,
    /// Requested indices were out of range and replaced by the last valid ones
    pub index_clamped: bool,
}

impl RouteProgress {
    /// Build the snapshot for `location` on step `(leg_index, step_index)`.
    ///
    /// Out-of-range indices are clamped to the final leg and step. When the
    /// traveler is within `maneuver_zone_radius` of the end of the step the
    /// snapshot moves to the following step, at most once, and never past the
    /// final step of the route.
    pub fn build(
        route: Arc<Route>,
        leg_index: usize,
        step_index: usize,
        location: &Location,
        maneuver_zone_radius: f64,
    ) -> Result<Self, NavigationError> {
        let (mut leg, mut step, index_clamped) = clamp_indices(&route, leg_index, step_index)?;
        let mut measure = StepMeasure::new(current_step(&route, leg, step)?, location);

        if measure.remaining <= maneuver_zone_radius {
            if let Some((next_leg, next_step)) = route.next_step_indices(leg, step) {
                debug!(
                    from_leg = leg,
                    from_step = step,
                    to_leg = next_leg,
                    to_step = next_step,
                    remaining_m = measure.remaining,
                    "Maneuver zone reached, advancing step"
                );
                leg = next_leg;
                step = next_step;
                measure = StepMeasure::new(current_step(&route, leg, step)?, location);
            }
        }

        let current = current_step(&route, leg, step)?;
        let current_leg = &route.legs[leg];

        let leg_distance_remaining = measure.remaining
            + current_leg.steps[step + 1..]
                .iter()
                .map(|s| s.distance)
                .sum::<f64>();
        let distance_remaining = leg_distance_remaining
            + route.legs[leg + 1..]
                .iter()
                .map(|l| l.distance)
                .sum::<f64>();

        let fraction_traveled = if route.distance > 0.0 {
            (1.0 - distance_remaining / route.distance).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let step_distance_traveled = (current.distance - measure.remaining).max(0.0);
        let step_fraction_traveled = if current.distance > 0.0 {
            (step_distance_traveled / current.distance).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let current_voice_instruction = current
            .voice_instructions
            .iter()
            .filter(|v| v.distance_along_geometry >= measure.remaining)
            .min_by(|a, b| a.distance_along_geometry.total_cmp(&b.distance_along_geometry))
            .cloned();
        let current_banner_instruction = current
            .banner_instructions
            .iter()
            .filter(|b| b.distance_along_geometry >= measure.remaining)
            .min_by(|a, b| a.distance_along_geometry.total_cmp(&b.distance_along_geometry))
            .cloned();

        Ok(Self {
            duration_remaining: (1.0 - fraction_traveled) * route.duration,
            route,
            leg_index: leg,
            step_index: step,
            distance_remaining,
            fraction_traveled,
            leg_distance_remaining,
            step_distance_remaining: measure.remaining,
            step_distance_traveled,
            step_fraction_traveled,
            remaining_step_points: measure.remaining_points,
            current_voice_instruction,
            current_banner_instruction,
            location: location.clone(),
            index_clamped,
        })
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn current_leg(&self) -> &RouteLeg {
        &self.route.legs[self.leg_index]
    }

    pub fn current_step(&self) -> &LegStep {
        &self.current_leg().steps[self.step_index]
    }

    /// The step after the current one, possibly the first step of the next leg.
    pub fn upcoming_step(&self) -> Option<&LegStep> {
        self.route.step_after(self.leg_index, self.step_index)
    }

    /// Full geometry of the current step.
    pub fn current_step_points(&self) -> &[Point] {
        &self.current_step().geometry
    }

    pub fn is_first_step(&self) -> bool {
        self.leg_index == 0 && self.step_index == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.upcoming_step().is_none()
    }

    /// Step duration scaled by the share of the step still ahead.
    pub fn step_duration_remaining(&self) -> f64 {
        (1.0 - self.step_fraction_traveled) * self.current_step().duration
    }
}

/// Where the traveler sits on one step's geometry.
struct StepMeasure {
    remaining: f64,
    remaining_points: Vec<Point>,
}

impl StepMeasure {
    fn new(step: &LegStep, location: &Location) -> Self {
        match geometry::project_on_line(&location.point(), &step.geometry) {
            Some(projection) => {
                let remaining_points = geometry::slice_from_projection(&step.geometry, &projection);
                let remaining = geometry::line_length(&remaining_points);
                Self {
                    remaining: if remaining < ARRIVAL_TOLERANCE_M { 0.0 } else { remaining },
                    remaining_points,
                }
            }
            // a single-point step is already at its maneuver
            None => Self {
                remaining: 0.0,
                remaining_points: step.geometry.clone(),
            },
        }
    }
}

fn current_step(route: &Route, leg: usize, step: usize) -> Result<&LegStep, NavigationError> {
    route.step(leg, step).ok_or_else(|| {
        NavigationError::InvalidRoute(format!("route has no step at leg {leg}, step {step}"))
    })
}

/// Clamp indices into the route, reporting whether clamping happened.
fn clamp_indices(
    route: &Route,
    leg_index: usize,
    step_index: usize,
) -> Result<(usize, usize, bool), NavigationError> {
    let last_leg = route
        .legs
        .len()
        .checked_sub(1)
        .ok_or_else(|| NavigationError::InvalidRoute("route has no legs".to_string()))?;

    let (leg, step_index, leg_clamped) = if leg_index > last_leg {
        // past the final leg means the final step of the final leg
        (last_leg, usize::MAX, true)
    } else {
        (leg_index, step_index, false)
    };

    let last_step = route.legs[leg]
        .steps
        .len()
        .checked_sub(1)
        .ok_or_else(|| NavigationError::InvalidRoute(format!("leg {leg} has no steps")))?;

    let step = step_index.min(last_step);
    Ok((leg, step, leg_clamped || step != step_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::destination;
    use crate::types::{BannerText, RouteLeg, StepManeuver};
    use chrono::Utc;

    const ORIGIN: Point = Point::new(13.4050, 52.5200);

    /// Straight eastbound step of `len` meters starting at `start`.
    fn east_step(start: Point, len: f64) -> LegStep {
        let end = destination(&start, len, 90.0);
        LegStep {
            geometry: vec![start, end],
            maneuver: StepManeuver {
                location: start,
                bearing_before: 90.0,
                bearing_after: 90.0,
                kind: "continue".to_string(),
                modifier: None,
                instruction: String::new(),
            },
            distance: len,
            duration: len / 10.0,
            name: String::new(),
            voice_instructions: Vec::new(),
            banner_instructions: Vec::new(),
        }
    }

    fn two_step_route() -> Arc<Route> {
        let first = east_step(ORIGIN, 500.0);
        let second = east_step(first.geometry[1], 300.0);
        Arc::new(Route::from_legs(vec![RouteLeg::from_steps(vec![first, second])]))
    }

    fn fix_at(distance_east: f64) -> Location {
        Location::at_point(destination(&ORIGIN, distance_east, 90.0), Utc::now())
    }

    #[test]
    fn start_of_route_has_everything_remaining() {
        let progress = RouteProgress::build(two_step_route(), 0, 0, &fix_at(0.0), 40.0).unwrap();
        assert_eq!(progress.step_index, 0);
        assert!((progress.distance_remaining - 800.0).abs() < 1.0);
        assert!(progress.fraction_traveled < 0.01);
        assert!(progress.is_first_step());
        assert!(!progress.index_clamped);
    }

    #[test]
    fn midway_distances_add_up() {
        let progress = RouteProgress::build(two_step_route(), 0, 0, &fix_at(200.0), 40.0).unwrap();
        assert!((progress.step_distance_remaining - 300.0).abs() < 1.0);
        assert!((progress.step_distance_traveled - 200.0).abs() < 1.0);
        assert!((progress.leg_distance_remaining - 600.0).abs() < 1.0);
        assert!((progress.fraction_traveled - 0.25).abs() < 0.01);
        assert!((progress.duration_remaining - 60.0).abs() < 1.0);
        assert_eq!(progress.remaining_step_points.len(), 2);
    }

    #[test]
    fn maneuver_zone_advances_one_step() {
        let progress = RouteProgress::build(two_step_route(), 0, 0, &fix_at(480.0), 40.0).unwrap();
        assert_eq!(progress.step_index, 1);
        assert!(progress.is_last_step());
        assert!(progress.step_distance_remaining > 290.0);
    }

    #[test]
    fn final_step_never_advances() {
        let progress = RouteProgress::build(two_step_route(), 0, 1, &fix_at(800.0), 40.0).unwrap();
        assert_eq!(progress.step_index, 1);
        assert!(progress.distance_remaining < 1.0);
    }

    #[test]
    fn out_of_range_indices_are_clamped() {
        let progress = RouteProgress::build(two_step_route(), 3, 9, &fix_at(600.0), 40.0).unwrap();
        assert_eq!((progress.leg_index, progress.step_index), (0, 1));
        assert!(progress.index_clamped);
    }

    #[test]
    fn advance_rolls_over_to_next_leg() {
        let first = east_step(ORIGIN, 200.0);
        let second = east_step(first.geometry[1], 200.0);
        let route = Arc::new(Route::from_legs(vec![
            RouteLeg::from_steps(vec![first]),
            RouteLeg::from_steps(vec![second]),
        ]));
        let progress = RouteProgress::build(route, 0, 0, &fix_at(190.0), 40.0).unwrap();
        assert_eq!((progress.leg_index, progress.step_index), (1, 0));
    }

    #[test]
    fn empty_route_is_invalid() {
        let route = Arc::new(Route::from_legs(Vec::new()));
        let err = RouteProgress::build(route, 0, 0, &fix_at(0.0), 40.0).unwrap_err();
        assert!(matches!(err, NavigationError::InvalidRoute(_)));
    }

    #[test]
    fn current_instructions_follow_distance_remaining() {
        let mut step = east_step(ORIGIN, 500.0);
        step.voice_instructions = vec![
            VoiceInstruction {
                distance_along_geometry: 500.0,
                announcement: "Continue for 500 meters".into(),
                ssml_announcement: None,
            },
            VoiceInstruction {
                distance_along_geometry: 100.0,
                announcement: "In 100 meters, arrive".into(),
                ssml_announcement: None,
            },
        ];
        step.banner_instructions = vec![BannerInstruction {
            distance_along_geometry: 500.0,
            primary: BannerText::new("Main Street"),
            secondary: None,
            sub: None,
        }];
        let route = Arc::new(Route::from_legs(vec![RouteLeg::from_steps(vec![step])]));

        let early = RouteProgress::build(Arc::clone(&route), 0, 0, &fix_at(100.0), 40.0).unwrap();
        assert_eq!(
            early.current_voice_instruction.unwrap().announcement,
            "Continue for 500 meters"
        );

        let late = RouteProgress::build(route, 0, 0, &fix_at(420.0), 40.0).unwrap();
        assert_eq!(
            late.current_voice_instruction.unwrap().announcement,
            "In 100 meters, arrive"
        );
        assert_eq!(late.current_banner_instruction.unwrap().primary.text, "Main Street");
    }
}
