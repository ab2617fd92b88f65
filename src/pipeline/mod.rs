//! Processing Pipeline Module
//!
//! ## Per-Fix Pipeline
//!
//! ```text
//! PHASE 1: Submission (producer context, never blocks)
//! PHASE 2: Route progress (worker task)
//! PHASE 3: Off-route decision (worker task, isolated)
//! PHASE 4: Milestone evaluation (worker task, isolated)
//! PHASE 5: Snapped display location (worker task, isolated)
//! PHASE 6: Delivery: progress, milestones, off-route (listener task)
//! ```
//!
//! CRITICAL GUARANTEE: fixes are processed and delivered in submission order,
//! one at a time, and every processed fix yields all three callbacks.

pub mod feed;
pub mod listener;
pub mod processor;
pub mod session;
pub mod source;

pub use feed::{FeedEnd, FeedReport, FixFeed};
pub use listener::{ChannelListener, ListenerEvent, LoggingListener, NavigationListener};
pub use processor::{ProcessorStats, RouteProcessor};
pub use session::{NavigationCommand, NavigationHandle, NavigationSession, SessionSummary};
pub use source::{FixEvent, FixSource, JsonLinesSource, ReplaySource};
