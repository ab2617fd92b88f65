//! Route structure as produced by the directions provider
//!
//! A route is immutable once installed in a session. Replacing it is the only
//! mutation and goes through the route processor, which resets every piece of
//! state derived from the previous route.

use serde::{Deserialize, Serialize};

use super::Point;
use crate::error::NavigationError;

/// A complete route: legs between waypoints, each split into steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
    /// Total distance in meters
    pub distance: f64,
    /// Total expected travel time in seconds
    pub duration: f64,
}

impl Route {
    /// Build a route whose totals are summed from its legs.
    pub fn from_legs(legs: Vec<RouteLeg>) -> Self {
        let distance = legs.iter().map(|l| l.distance).sum();
        let duration = legs.iter().map(|l| l.duration).sum();
        Self {
            legs,
            distance,
            duration,
        }
    }

    /// Reject routes with no legs or with a leg that has no steps.
    pub fn validate(&self) -> Result<(), NavigationError> {
        if self.legs.is_empty() {
            return Err(NavigationError::InvalidRoute(
                "route has no legs".to_string(),
            ));
        }
        if let Some(index) = self.legs.iter().position(|leg| leg.steps.is_empty()) {
            return Err(NavigationError::InvalidRoute(format!(
                "leg {index} has no steps"
            )));
        }
        Ok(())
    }

    pub fn step(&self, leg_index: usize, step_index: usize) -> Option<&LegStep> {
        self.legs.get(leg_index)?.steps.get(step_index)
    }

    /// The step after `(leg_index, step_index)`, crossing into the next leg
    /// when the current step is the last of its leg.
    pub fn step_after(&self, leg_index: usize, step_index: usize) -> Option<&LegStep> {
        let leg = self.legs.get(leg_index)?;
        if step_index + 1 < leg.steps.len() {
            return leg.steps.get(step_index + 1);
        }
        self.legs.get(leg_index + 1)?.steps.first()
    }

    /// Indices of the step after `(leg_index, step_index)`, `None` at the
    /// final step of the route.
    pub fn next_step_indices(&self, leg_index: usize, step_index: usize) -> Option<(usize, usize)> {
        if step_index + 1 < self.legs.get(leg_index)?.steps.len() {
            Some((leg_index, step_index + 1))
        } else if self
            .legs
            .get(leg_index + 1)
            .is_some_and(|l| !l.steps.is_empty())
        {
            Some((leg_index + 1, 0))
        } else {
            None
        }
    }

    pub fn total_steps(&self) -> usize {
        self.legs.iter().map(|l| l.steps.len()).sum()
    }
}

/// Waypoint-to-waypoint section of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub steps: Vec<LegStep>,
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub summary: String,
}

impl RouteLeg {
    /// Build a leg whose totals are summed from its steps.
    pub fn from_steps(steps: Vec<LegStep>) -> Self {
        let distance = steps.iter().map(|s| s.distance).sum();
        let duration = steps.iter().map(|s| s.duration).sum();
        Self {
            steps,
            distance,
            duration,
            summary: String::new(),
        }
    }
}

/// Maneuver-to-maneuver section of a leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegStep {
    /// Ordered coordinates; the last one is where the next maneuver happens
    pub geometry: Vec<Point>,
    pub maneuver: StepManeuver,
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub name: String,
    /// Ordered by decreasing `distance_along_geometry`
    #[serde(default)]
    pub voice_instructions: Vec<VoiceInstruction>,
    /// Ordered by decreasing `distance_along_geometry`
    #[serde(default)]
    pub banner_instructions: Vec<BannerInstruction>,
}

/// The instruction applying at the start of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepManeuver {
    pub location: Point,
    #[serde(default)]
    pub bearing_before: f64,
    #[serde(default)]
    pub bearing_after: f64,
    /// Maneuver type, e.g. "turn", "depart", "arrive"
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
    #[serde(default)]
    pub instruction: String,
}

/// A spoken announcement, due once the traveler is within
/// `distance_along_geometry` meters of the end of the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceInstruction {
    pub distance_along_geometry: f64,
    pub announcement: String,
    #[serde(default)]
    pub ssml_announcement: Option<String>,
}

/// A visual banner, due once the traveler is within
/// `distance_along_geometry` meters of the end of the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerInstruction {
    pub distance_along_geometry: f64,
    pub primary: BannerText,
    #[serde(default)]
    pub secondary: Option<BannerText>,
    #[serde(default)]
    pub sub: Option<BannerText>,
}

impl BannerInstruction {
    /// Whether two banners would render identically.
    pub fn same_text(&self, other: &Self) -> bool {
        self.primary == other.primary && self.secondary == other.secondary && self.sub == other.sub
    }
}

/// One line of a banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerText {
    pub text: String,
    /// Maneuver type shown by the banner icon
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub modifier: Option<String>,
    /// Roundabout exit angle
    #[serde(default)]
    pub degrees: Option<f64>,
}

impl BannerText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            modifier: None,
            degrees: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(distance: f64) -> LegStep {
        LegStep {
            geometry: vec![Point::new(0.0, 0.0), Point::new(0.001, 0.0)],
            maneuver: StepManeuver {
                location: Point::new(0.0, 0.0),
                bearing_before: 0.0,
                bearing_after: 90.0,
                kind: "turn".to_string(),
                modifier: Some("right".to_string()),
                instruction: "Turn right".to_string(),
            },
            distance,
            duration: distance / 10.0,
            name: String::new(),
            voice_instructions: Vec::new(),
            banner_instructions: Vec::new(),
        }
    }

    #[test]
    fn empty_route_is_rejected() {
        let route = Route::from_legs(Vec::new());
        assert!(matches!(
            route.validate(),
            Err(NavigationError::InvalidRoute(_))
        ));
    }

    #[test]
    fn leg_without_steps_is_rejected() {
        let route = Route::from_legs(vec![
            RouteLeg::from_steps(vec![step(100.0)]),
            RouteLeg::from_steps(Vec::new()),
        ]);
        let err = route.validate().unwrap_err();
        assert!(err.to_string().contains("leg 1"));
    }

    #[test]
    fn totals_are_summed() {
        let route = Route::from_legs(vec![
            RouteLeg::from_steps(vec![step(100.0), step(50.0)]),
            RouteLeg::from_steps(vec![step(25.0)]),
        ]);
        assert!((route.distance - 175.0).abs() < 1e-9);
        assert_eq!(route.total_steps(), 3);
        assert!(route.validate().is_ok());
    }

    #[test]
    fn step_after_crosses_leg_boundary() {
        let route = Route::from_legs(vec![
            RouteLeg::from_steps(vec![step(100.0)]),
            RouteLeg::from_steps(vec![step(25.0)]),
        ]);
        let next = route.step_after(0, 0).unwrap();
        assert!((next.distance - 25.0).abs() < 1e-9);
        assert!(route.step_after(1, 0).is_none());
        assert_eq!(route.next_step_indices(0, 0), Some((1, 0)));
        assert_eq!(route.next_step_indices(1, 0), None);
    }

    #[test]
    fn maneuver_type_uses_directions_field_name() {
        let json = r#"{"location":{"longitude":1.0,"latitude":2.0},"type":"arrive"}"#;
        let maneuver: StepManeuver = serde_json::from_str(json).unwrap();
        assert_eq!(maneuver.kind, "arrive");
        assert!(maneuver.instruction.is_empty());
    }
}
