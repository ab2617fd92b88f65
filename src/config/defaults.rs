//! System-wide default constants.
//!
//! Grouped by subsystem. `NavigationOptions::default()` draws from these, so a
//! session without a config file behaves exactly as documented here.

// ============================================================================
// Off-Route Detection
// ============================================================================

/// Base tolerance around the current step geometry (meters).
pub const OFF_ROUTE_RADIUS_M: f64 = 50.0;

/// Displacement from the last reroute-check origin required before the
/// detector evaluates again (meters).
pub const OFF_ROUTE_MINIMUM_DISTANCE_M: f64 = 50.0;

/// Fix accuracy is scaled by this before being compared with the base radius.
pub const ACCURACY_MULTIPLIER: f64 = 1.0;

/// Upper bound for the accuracy-scaled radius (meters).
pub const MAX_RADIUS_M: f64 = 300.0;

/// Growth in distance-to-maneuver a moving-away run must exceed (meters).
pub const MINIMUM_DISTANCE_BEFORE_RIGHT_DIRECTION_M: f64 = 20.0;

/// Consecutive strictly increasing samples that make a run sustained.
pub const MOVING_AWAY_RUN_LENGTH: usize = 3;

/// Capacity of the moving-away sample history.
///
/// Older samples are discarded first; a run longer than this is still
/// sustained because the run origin is tracked separately.
pub const MOVING_AWAY_HISTORY_CAPACITY: usize = 16;

// ============================================================================
// Route Progress
// ============================================================================

/// Distance from the end of a step at which the step counts as completed
/// and the index advances (meters).
pub const MANEUVER_ZONE_RADIUS_M: f64 = 40.0;

// ============================================================================
// Milestones
// ============================================================================

/// Identifier reserved for the built-in voice instruction milestone.
pub const VOICE_INSTRUCTION_MILESTONE_ID: i64 = -1;

/// Identifier reserved for the built-in banner instruction milestone.
pub const BANNER_INSTRUCTION_MILESTONE_ID: i64 = -2;

// ============================================================================
// Simulation
// ============================================================================

/// Delay between simulated fixes at `--speed 1` (milliseconds).
///
/// `delay_ms = SIMULATION_BASE_DELAY_MS / speed`
pub const SIMULATION_BASE_DELAY_MS: u64 = 1_000;
