//! Fix Simulation
//!
//! Generates a noisy positioning stream along a route for testing the
//! navigation engine. Simulates:
//! - Normal driving along the route geometry
//! - GPS jitter (Gaussian position noise, occasional multipath outliers)
//! - A deliberate wrong turn leaving the route at a chosen fraction
//!
//! # Usage
//! ```bash
//! fix-simulator --route route.json --speed 10 --deviate-at 0.6 | navigation-core --route route.json --stdin
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use navigation_core::config::defaults::SIMULATION_BASE_DELAY_MS;
use navigation_core::geometry::{bearing, destination, haversine, normalize_bearing};
use navigation_core::{Location, Point, Route};

/// Probability of a multipath outlier per fix
const OUTLIER_PROBABILITY: f64 = 0.02;
/// Extra displacement of a multipath outlier (meters)
const OUTLIER_DISTANCE_M: f64 = 35.0;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "fix-simulator")]
#[command(about = "Noisy positioning stream along a route, for navigation engine testing")]
#[command(version = "1.0")]
struct Args {
    /// Route JSON file to drive along
    #[arg(long)]
    route: PathBuf,

    /// Travel speed (m/s)
    #[arg(long, default_value = "12.0")]
    velocity: f64,

    /// Fixes per simulated second
    #[arg(long, default_value = "1")]
    sample_rate: u32,

    /// Time compression factor (1 = real-time, 0 = no delay)
    #[arg(short, long, default_value = "0")]
    speed: u64,

    /// Standard deviation of position noise (meters)
    #[arg(long, default_value = "4.0")]
    noise: f64,

    /// Reported horizontal accuracy (meters)
    #[arg(long, default_value = "8.0")]
    accuracy: f64,

    /// Leave the route after this fraction of its length (0.0-1.0)
    #[arg(long)]
    deviate_at: Option<f64>,

    /// Heading change of the wrong turn (degrees, relative to the route)
    #[arg(long, default_value = "90.0")]
    deviate_turn: f64,

    /// Suppress the mission log on stderr
    #[arg(short, long)]
    quiet: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Simulation Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    OnRoute,
    Deviating,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::OnRoute => "On Route",
            Self::Deviating => "Deviating (wrong turn)",
        }
    }
}

// ============================================================================
// Route Walker
// ============================================================================

/// Route geometry flattened into one polyline with cumulative distances.
struct RoutePath {
    points: Vec<Point>,
    cumulative: Vec<f64>,
}

impl RoutePath {
    fn from_route(route: &Route) -> Self {
        let mut points: Vec<Point> = Vec::new();
        for step in route.legs.iter().flat_map(|leg| leg.steps.iter()) {
            for p in &step.geometry {
                if points.last() != Some(p) {
                    points.push(*p);
                }
            }
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += haversine(&points[i - 1], p);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Position and heading `distance` meters along the path.
    fn at(&self, distance: f64) -> Option<(Point, f64)> {
        let segment = self
            .cumulative
            .windows(2)
            .position(|w| distance <= w[1])
            .unwrap_or(self.points.len().checked_sub(2)?);
        let (a, b) = (self.points[segment], self.points[segment + 1]);
        let heading = bearing(&a, &b);
        let into = (distance - self.cumulative[segment]).max(0.0);
        Some((destination(&a, into, heading), heading))
    }
}

// ============================================================================
// Simulation State
// ============================================================================

struct SimulationState {
    rng: StdRng,
    noise: Normal<f64>,
    phase: Phase,
    /// Distance travelled along the route before any deviation
    traveled_m: f64,
    /// True position and heading once off the route
    deviation: Option<(Point, f64)>,
    timestamp: DateTime<Utc>,
    fixes_generated: u64,
    outliers: u64,
}

impl SimulationState {
    fn new(noise_m: f64, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            noise: Normal::new(0.0, noise_m).context("Invalid noise standard deviation")?,
            phase: Phase::OnRoute,
            traveled_m: 0.0,
            deviation: None,
            timestamp: Utc::now(),
            fixes_generated: 0,
            outliers: 0,
        })
    }

    /// Jittered observation of `truth`.
    fn observe(&mut self, truth: Point, heading: f64, speed: f64, accuracy: f64) -> Location {
        let mut offset = self.noise.sample(&mut self.rng).abs();
        if self.rng.gen_bool(OUTLIER_PROBABILITY) {
            offset += OUTLIER_DISTANCE_M;
            self.outliers += 1;
        }
        let direction = self.rng.gen_range(0.0..360.0);
        let observed = destination(&truth, offset, direction);
        self.fixes_generated += 1;

        Location::at_point(observed, self.timestamp)
            .with_bearing(normalize_bearing(heading + self.noise.sample(&mut self.rng)))
            .with_speed(speed)
            .with_accuracy(accuracy)
    }
}

fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn log_mission(time: f64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[{}] {}", format_time(time), message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    let contents = std::fs::read_to_string(&args.route)
        .with_context(|| format!("Failed to read route {}", args.route.display()))?;
    let route: Route = serde_json::from_str(&contents).context("Invalid route JSON")?;
    route.validate()?;

    let path = RoutePath::from_route(&route);
    let length = path.length();
    let deviate_at_m = args.deviate_at.map(|f| f.clamp(0.0, 1.0) * length);

    let sample_rate = f64::from(args.sample_rate.max(1));
    let step_m = args.velocity / sample_rate;
    let step_time = TimeDelta::milliseconds((1000.0 / sample_rate) as i64);
    let delay = (args.speed > 0)
        .then(|| Duration::from_millis(SIMULATION_BASE_DELAY_MS / args.speed / u64::from(args.sample_rate.max(1))));

    let mut state = SimulationState::new(args.noise, args.seed)?;

    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, "FIX SIMULATION v1.0", args.quiet);
    log_mission(0.0, &"=".repeat(70), args.quiet);
    log_mission(0.0, &format!("  Route: {:.0} m, {} steps", length, route.total_steps()), args.quiet);
    log_mission(0.0, &format!("  Velocity: {:.1} m/s at {} Hz", args.velocity, args.sample_rate), args.quiet);
    log_mission(0.0, &format!("  Noise: {:.1} m (accuracy {:.1} m)", args.noise, args.accuracy), args.quiet);
    if let Some(at) = deviate_at_m {
        log_mission(0.0, &format!("  Wrong turn at {:.0} m ({:+.0}°)", at, args.deviate_turn), args.quiet);
    }
    if let Some(seed) = args.seed {
        log_mission(0.0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0.0, &"=".repeat(70), args.quiet);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut sim_time = 0.0;
    // after a wrong turn keep driving for as long as the rest of the route would take
    let mut deviation_budget_m = 0.0;

    loop {
        let (truth, heading) = match state.deviation {
            Some((position, heading)) => {
                if deviation_budget_m <= 0.0 {
                    break;
                }
                deviation_budget_m -= step_m;
                let next = destination(&position, step_m, heading);
                state.deviation = Some((next, heading));
                (next, heading)
            }
            None => {
                if state.traveled_m > length {
                    break;
                }
                let Some((position, heading)) = path.at(state.traveled_m) else {
                    break;
                };
                if deviate_at_m.is_some_and(|at| state.traveled_m >= at) {
                    state.phase = Phase::Deviating;
                    let turned = normalize_bearing(heading + args.deviate_turn);
                    state.deviation = Some((position, turned));
                    deviation_budget_m = (length - state.traveled_m).max(200.0);
                    log_mission(sim_time, &format!(">>> PHASE: {}", state.phase.name()), args.quiet);
                }
                state.traveled_m += step_m;
                (position, heading)
            }
        };

        let fix = state.observe(truth, heading, args.velocity, args.accuracy);
        writeln!(out, "{}", serde_json::to_string(&fix)?)?;
        out.flush()?;

        state.timestamp += step_time;
        sim_time += 1.0 / sample_rate;

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
    }

    log_mission(sim_time, &"=".repeat(70), args.quiet);
    log_mission(
        sim_time,
        &format!(
            "SIMULATION COMPLETE: {} fixes ({} outliers), final phase: {}",
            state.fixes_generated,
            state.outliers,
            state.phase.name()
        ),
        args.quiet,
    );
    Ok(())
}
