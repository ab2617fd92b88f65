//! Navigation Core - route replay driver
//!
//! Replays a fix stream against a JSON route through a navigation session and
//! logs every progress update, milestone and off-route transition.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recorded fix file
//! navigation-core --route route.json --fixes drive.jsonl
//!
//! # Live input from the simulator
//! fix-simulator --route route.json --deviate-at 0.5 | navigation-core --route route.json --stdin
//! ```
//!
//! # Environment Variables
//!
//! - `NAVIGATION_CONFIG`: Path to the options file (default: ./navigation.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use navigation_core::pipeline::{FeedEnd, FixFeed, JsonLinesSource, ReplaySource};
use navigation_core::{LoggingListener, NavigationOptions, NavigationSession, Route, RouteProcessor};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "navigation-core")]
#[command(about = "Turn-by-turn navigation engine: replay fixes against a route")]
#[command(version)]
struct CliArgs {
    /// Route JSON file (legs, steps, maneuvers, instructions)
    #[arg(long)]
    route: PathBuf,

    /// Newline-delimited JSON fix file
    #[arg(long, conflicts_with = "stdin")]
    fixes: Option<PathBuf>,

    /// Read newline-delimited JSON fixes from stdin
    #[arg(long)]
    stdin: bool,

    /// Delay between replayed fixes in milliseconds (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Options file (overrides NAVIGATION_CONFIG and ./navigation.toml)
    #[arg(long, env = "NAVIGATION_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_options(path: Option<&PathBuf>) -> Result<NavigationOptions> {
    match path {
        Some(path) => NavigationOptions::load_from_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display())),
        None => Ok(NavigationOptions::load()),
    }
}

fn load_route(path: &PathBuf) -> Result<Route> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read route {}", path.display()))?;
    let route: Route = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid route JSON in {}", path.display()))?;
    route.validate()?;
    Ok(route)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Navigation Core v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let options = Arc::new(load_options(args.config.as_ref())?);
    let route = load_route(&args.route)?;
    info!(
        legs = route.legs.len(),
        steps = route.total_steps(),
        distance_m = route.distance,
        "Route loaded from {}",
        args.route.display()
    );

    let processor = RouteProcessor::new(route, options)?;
    let session = NavigationSession::start(processor, LoggingListener::new());
    let handle = session.handle();

    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let feed = FixFeed::new(handle.clone(), cancel_token);
    let report = match (&args.fixes, args.stdin) {
        (Some(path), _) => {
            let contents = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read fixes {}", path.display()))?;
            let mut source = ReplaySource::from_json_lines(&contents, args.delay_ms)?;
            feed.run(&mut source).await
        }
        (None, true) => {
            let mut source = JsonLinesSource::stdin();
            feed.run(&mut source).await
        }
        (None, false) => bail!("No fix input: pass --fixes <FILE> or --stdin"),
    };

    // deliver everything already submitted unless the user interrupted
    if report.end == FeedEnd::Eof {
        handle.flush().await?;
    }

    let summary = session.shutdown().await;
    info!("✅ {} fixes fed, {}", report.fixes_submitted, summary);
    Ok(())
}
