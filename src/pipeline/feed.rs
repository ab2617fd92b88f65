//! Pumps a fix source into a running session.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::session::NavigationHandle;
use super::source::{FixEvent, FixSource};

/// Why a feed stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEnd {
    /// Source exhausted
    Eof,
    /// Cancellation token fired
    Cancelled,
    /// Source returned an unrecoverable error
    SourceError,
    /// The session ended underneath the feed
    SessionEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedReport {
    pub fixes_submitted: u64,
    pub end: FeedEnd,
}

/// Reads fixes from a [`FixSource`] and submits them to a session until the
/// source ends, the token is cancelled or the session goes away.
pub struct FixFeed {
    handle: NavigationHandle,
    cancel_token: CancellationToken,
}

impl FixFeed {
    pub const fn new(handle: NavigationHandle, cancel_token: CancellationToken) -> Self {
        Self {
            handle,
            cancel_token,
        }
    }

    pub async fn run<S: FixSource>(self, source: &mut S) -> FeedReport {
        let mut fixes_submitted = 0u64;

        info!("📡 Feeding fixes from {}...", source.source_name());

        let end = loop {
            let event = tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("[FixFeed] Shutdown signal received");
                    break FeedEnd::Cancelled;
                }
                result = source.next_fix() => match result {
                    Ok(ev) => ev,
                    Err(e) => {
                        warn!("[FixFeed] Source error: {:#}", e);
                        break FeedEnd::SourceError;
                    }
                },
            };

            let fix = match event {
                FixEvent::Fix(fix) => fix,
                FixEvent::Eof => {
                    info!(
                        "[FixFeed] Source reached end ({} fixes submitted)",
                        fixes_submitted
                    );
                    break FeedEnd::Eof;
                }
            };

            if self.handle.submit(fix).is_err() {
                warn!("[FixFeed] Session ended, stopping feed");
                break FeedEnd::SessionEnded;
            }
            fixes_submitted += 1;
        };

        FeedReport {
            fixes_submitted,
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::config::NavigationOptions;
    use crate::geometry::destination;
    use crate::pipeline::listener::ChannelListener;
    use crate::pipeline::processor::RouteProcessor;
    use crate::pipeline::session::NavigationSession;
    use crate::pipeline::source::ReplaySource;
    use crate::types::{LegStep, Location, Point, Route, RouteLeg, StepManeuver};

    const ORIGIN: Point = Point::new(4.8952, 52.3702);

    fn session() -> NavigationSession {
        let step = LegStep {
            geometry: vec![ORIGIN, destination(&ORIGIN, 500.0, 0.0)],
            maneuver: StepManeuver {
                location: ORIGIN,
                bearing_before: 0.0,
                bearing_after: 0.0,
                kind: "depart".to_string(),
                modifier: None,
                instruction: "Head north".to_string(),
            },
            distance: 500.0,
            duration: 50.0,
            name: String::new(),
            voice_instructions: Vec::new(),
            banner_instructions: Vec::new(),
        };
        let route = Route::from_legs(vec![RouteLeg::from_steps(vec![step])]);
        let processor = RouteProcessor::new(route, Arc::new(NavigationOptions::default())).unwrap();
        let (listener, _rx) = ChannelListener::new();
        NavigationSession::start(processor, listener)
    }

    fn fixes(count: u32) -> Vec<Location> {
        (0..count)
            .map(|i| Location::at_point(destination(&ORIGIN, f64::from(i) * 10.0, 0.0), Utc::now()))
            .collect()
    }

    #[tokio::test]
    async fn replay_runs_to_eof() {
        let session = session();
        let feed = FixFeed::new(session.handle(), CancellationToken::new());

        let report = feed.run(&mut ReplaySource::new(fixes(4), 0)).await;
        assert_eq!(report.end, FeedEnd::Eof);
        assert_eq!(report.fixes_submitted, 4);

        session.handle().flush().await.unwrap();
        assert_eq!(session.shutdown().await.stats.fixes_processed, 4);
    }

    #[tokio::test]
    async fn ended_session_stops_the_feed() {
        let session = session();
        let handle = session.handle();
        session.shutdown().await;

        let report = FixFeed::new(handle, CancellationToken::new())
            .run(&mut ReplaySource::new(fixes(3), 0))
            .await;
        assert_eq!(report.end, FeedEnd::SessionEnded);
        assert_eq!(report.fixes_submitted, 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_slow_source() {
        let session = session();
        let token = CancellationToken::new();
        token.cancel();

        let report = FixFeed::new(session.handle(), token)
            .run(&mut ReplaySource::new(fixes(3), 60_000))
            .await;
        assert_eq!(report.end, FeedEnd::Cancelled);
        assert!(report.fixes_submitted <= 1);

        session.shutdown().await;
    }
}
