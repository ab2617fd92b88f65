//! Navigation Core: turn-by-turn navigation engine
//!
//! Turns a stream of positioning fixes into route progress, milestone
//! announcements, off-route decisions and a snapped display location.
//!
//! ## Architecture
//!
//! - **Route Processor**: fixed-order per-fix decision sequence
//! - **Off-Route Detector**: jitter-tolerant deviation classifier
//! - **Milestone Registry**: ordered announcement conditions
//! - **Snap Engine**: projects fixes onto the step geometry
//! - **Session**: worker and listener tasks fed through an unbounded mailbox
//!
//! ```ignore
//! let processor = RouteProcessor::new(route, Arc::new(NavigationOptions::load()))?;
//! let session = NavigationSession::start(processor, LoggingListener::new());
//! session.handle().submit(fix)?;
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod milestone;
pub mod observer;
pub mod offroute;
pub mod pipeline;
pub mod progress;
pub mod snap;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, NavigationOptions};

// Re-export commonly used types
pub use types::{
    BannerInstruction, BannerText, LegStep, Location, NavigationUpdate, Point, Route, RouteLeg,
    StepManeuver, VoiceInstruction,
};

pub use error::{Component, NavigationError};
pub use observer::{FailureLog, FailureObserver, TracingObserver};
pub use progress::RouteProgress;

// Re-export engines
pub use milestone::{Announcement, FiredMilestone, Milestone, MilestoneRegistry, Trigger};
pub use offroute::{OffRouteDecision, OffRouteDetector, OffRouteEngine};
pub use snap::{SnapEngine, SnapToRoute};

// Re-export pipeline
pub use pipeline::{
    ChannelListener, FixFeed, FixSource, ListenerEvent, LoggingListener, NavigationHandle,
    NavigationListener, NavigationSession, ProcessorStats, RouteProcessor,
};
