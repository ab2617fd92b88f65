//! Session-scoped off-route state
//!
//! Owned by a single detector and mutated only from the session worker.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::config::defaults::MOVING_AWAY_HISTORY_CAPACITY;
use crate::types::{Location, Point};

/// Where and when the last reroute check was anchored.
#[derive(Debug, Clone, PartialEq)]
pub struct RerouteOrigin {
    pub point: Point,
    pub timestamp: DateTime<Utc>,
}

impl RerouteOrigin {
    pub fn from_location(location: &Location) -> Self {
        Self {
            point: location.point(),
            timestamp: location.timestamp,
        }
    }
}

/// One moving-away sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    /// Distance to the current maneuver along the route, whole meters
    pub distance_m: u32,
}

/// How a sample changed the moving-away run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// First sample; the run starts here
    Started,
    /// Farther from the maneuver than the last accepted sample
    Increased,
    /// Same distance as before; the run restarts
    Stationary,
    /// Traveled toward the maneuver by more than the threshold; the run restarts
    Reversed,
    /// Small step toward the maneuver; ignored
    Jitter,
}

/// Bounded history of distance-to-maneuver samples.
///
/// Only the most recent samples are kept. The run origin and increase count
/// are tracked separately so a run longer than the buffer is still measured
/// from where it began.
#[derive(Debug, Clone)]
pub struct MovingAwayHistory {
    samples: VecDeque<DistanceSample>,
    capacity: usize,
    run_origin_m: Option<u32>,
    increases: usize,
}

impl Default for MovingAwayHistory {
    fn default() -> Self {
        Self::with_capacity(MOVING_AWAY_HISTORY_CAPACITY)
    }
}

impl MovingAwayHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            run_origin_m: None,
            increases: 0,
        }
    }

    /// Fold a sample into the run.
    ///
    /// `right_direction_m` separates jitter from genuine travel toward the
    /// maneuver.
    pub fn push(&mut self, sample: DistanceSample, right_direction_m: f64) -> SampleOutcome {
        let Some(last) = self.samples.back().map(|s| s.distance_m) else {
            self.restart(sample);
            return SampleOutcome::Started;
        };

        if sample.distance_m > last {
            if self.samples.len() == self.capacity {
                self.samples.pop_front();
            }
            self.samples.push_back(sample);
            self.increases += 1;
            SampleOutcome::Increased
        } else if sample.distance_m == last {
            self.restart(sample);
            SampleOutcome::Stationary
        } else if f64::from(last - sample.distance_m) > right_direction_m {
            self.restart(sample);
            SampleOutcome::Reversed
        } else {
            SampleOutcome::Jitter
        }
    }

    /// At least `run_length` increases and more than `min_growth_m` meters of
    /// growth since the run began.
    pub fn is_sustained(&self, run_length: usize, min_growth_m: f64) -> bool {
        self.increases >= run_length && f64::from(self.growth_m()) > min_growth_m
    }

    /// Meters gained since the run began.
    pub fn growth_m(&self) -> u32 {
        match (self.run_origin_m, self.samples.back()) {
            (Some(origin), Some(last)) => last.distance_m.saturating_sub(origin),
            _ => 0,
        }
    }

    pub const fn increases(&self) -> usize {
        self.increases
    }

    pub fn samples(&self) -> impl Iterator<Item = &DistanceSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.run_origin_m = None;
        self.increases = 0;
    }

    fn restart(&mut self, sample: DistanceSample) {
        self.clear();
        self.run_origin_m = Some(sample.distance_m);
        self.samples.push_back(sample);
    }
}

/// Everything the detector remembers between fixes.
#[derive(Debug, Clone, Default)]
pub struct OffRouteState {
    reroute_origin: Option<RerouteOrigin>,
    history: MovingAwayHistory,
    /// `(leg, step)` the history was sampled against
    sampled_step: Option<(usize, usize)>,
}

impl OffRouteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State as if `location` had already been evaluated as the first fix.
    pub fn anchored_at(location: &Location) -> Self {
        let mut state = Self::default();
        state.move_origin(location);
        state
    }

    pub const fn reroute_origin(&self) -> Option<&RerouteOrigin> {
        self.reroute_origin.as_ref()
    }

    pub const fn history(&self) -> &MovingAwayHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut MovingAwayHistory {
        &mut self.history
    }

    pub fn move_origin(&mut self, location: &Location) {
        self.reroute_origin = Some(RerouteOrigin::from_location(location));
    }

    /// Clear the history when the step it was sampled against changes.
    ///
    /// Returns `true` when the history was cleared.
    pub fn track_step(&mut self, step: (usize, usize)) -> bool {
        if self.sampled_step == Some(step) {
            return false;
        }
        let changed = self.sampled_step.is_some();
        self.sampled_step = Some(step);
        self.history.clear();
        changed
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
