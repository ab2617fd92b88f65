//! Declarative trigger conditions over route progress

use serde::{Deserialize, Serialize};

use crate::progress::RouteProgress;

/// Progress value a trigger can compare against.
///
/// Boolean properties evaluate to `1.0` when true and `0.0` when false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerProperty {
    StepDistanceRemaining,
    StepDistanceTraveled,
    StepDurationRemaining,
    RouteDistanceRemaining,
    FractionTraveled,
    LegIndex,
    StepIndex,
    /// The step differs from the previous snapshot's (or there is none)
    NewStep,
    FirstStep,
    LastStep,
}

impl TriggerProperty {
    #[allow(clippy::cast_precision_loss)]
    fn value(self, previous: Option<&RouteProgress>, current: &RouteProgress) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Self::StepDistanceRemaining => current.step_distance_remaining,
            Self::StepDistanceTraveled => current.step_distance_traveled,
            Self::StepDurationRemaining => current.step_duration_remaining(),
            Self::RouteDistanceRemaining => current.distance_remaining,
            Self::FractionTraveled => current.fraction_traveled,
            Self::LegIndex => current.leg_index as f64,
            Self::StepIndex => current.step_index as f64,
            Self::NewStep => flag(previous.map_or(true, |p| {
                (p.leg_index, p.step_index) != (current.leg_index, current.step_index)
            })),
            Self::FirstStep => flag(current.is_first_step()),
            Self::LastStep => flag(current.is_last_step()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        let equal = (lhs - rhs).abs() < f64::EPSILON;
        match self {
            Self::Eq => equal,
            Self::Ne => !equal,
            Self::Lt => lhs < rhs,
            Self::Le => lhs < rhs || equal,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs > rhs || equal,
        }
    }
}

/// Condition tree evaluated against a (previous, current) progress pair.
///
/// ```ignore
/// // within 100 m of the maneuver, on any step but the last
/// let trigger = Trigger::all(vec![
///     Trigger::compare(TriggerProperty::StepDistanceRemaining, Comparison::Le, 100.0),
///     Trigger::is_false(TriggerProperty::LastStep),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Every child holds; an empty list always holds
    All(Vec<Trigger>),
    /// At least one child holds; an empty list never holds
    Any(Vec<Trigger>),
    Compare {
        property: TriggerProperty,
        op: Comparison,
        value: f64,
    },
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new_step()
    }
}

impl Trigger {
    pub const fn compare(property: TriggerProperty, op: Comparison, value: f64) -> Self {
        Self::Compare {
            property,
            op,
            value,
        }
    }

    pub const fn all(triggers: Vec<Self>) -> Self {
        Self::All(triggers)
    }

    pub const fn any(triggers: Vec<Self>) -> Self {
        Self::Any(triggers)
    }

    pub const fn is_true(property: TriggerProperty) -> Self {
        Self::compare(property, Comparison::Eq, 1.0)
    }

    pub const fn is_false(property: TriggerProperty) -> Self {
        Self::compare(property, Comparison::Eq, 0.0)
    }

    /// Holds on the first snapshot of every step.
    pub const fn new_step() -> Self {
        Self::is_true(TriggerProperty::NewStep)
    }

    pub fn holds(&self, previous: Option<&RouteProgress>, current: &RouteProgress) -> bool {
        match self {
            Self::All(children) => children.iter().all(|t| t.holds(previous, current)),
            Self::Any(children) => children.iter().any(|t| t.holds(previous, current)),
            Self::Compare {
                property,
                op,
                value,
            } => op.apply(property.value(previous, current), *value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_handle_equality_edges() {
        assert!(Comparison::Le.apply(5.0, 5.0));
        assert!(Comparison::Ge.apply(5.0, 5.0));
        assert!(!Comparison::Lt.apply(5.0, 5.0));
        assert!(Comparison::Ne.apply(5.0, 5.1));
        assert!(Comparison::Gt.apply(6.0, 5.0));
    }

    #[test]
    fn trigger_deserializes_from_json() {
        let json = r#"{"all":[
            {"compare":{"property":"step_distance_remaining","op":"le","value":100.0}},
            {"compare":{"property":"last_step","op":"eq","value":0.0}}
        ]}"#;
        let trigger: Trigger = serde_json::from_str(json).unwrap();
        assert_eq!(
            trigger,
            Trigger::all(vec![
                Trigger::compare(TriggerProperty::StepDistanceRemaining, Comparison::Le, 100.0),
                Trigger::is_false(TriggerProperty::LastStep),
            ])
        );
    }

    #[test]
    fn default_trigger_is_new_step() {
        assert_eq!(Trigger::default(), Trigger::new_step());
    }
}
