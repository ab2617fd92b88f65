//! Fix source abstraction for positioning data.
//!
//! Provides a unified trait for reading fixes from different sources:
//! pre-loaded fixes (replay) and newline-delimited JSON (files, stdin).

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::types::Location;

/// Events produced by a fix source.
#[derive(Debug)]
pub enum FixEvent {
    /// A valid fix was read.
    Fix(Location),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where fixes come from.
///
/// Implementations handle format parsing and pacing internally.
/// [`FixFeed`](super::FixFeed) calls [`next_fix`](Self::next_fix) in a
/// `select!` with cancellation.
#[async_trait]
pub trait FixSource: Send + 'static {
    /// Read the next fix from the source.
    ///
    /// Returns `FixEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable I/O errors.
    async fn next_fix(&mut self) -> Result<FixEvent>;

    /// Human-readable name for logging (e.g. "replay", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source
// ============================================================================

/// Replays pre-loaded fixes with optional inter-fix delay.
pub struct ReplaySource {
    fixes: std::vec::IntoIter<Location>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(fixes: Vec<Location>, delay_ms: u64) -> Self {
        Self {
            fixes: fixes.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }

    /// Parse newline-delimited JSON fixes, skipping blank lines.
    pub fn from_json_lines(contents: &str, delay_ms: u64) -> Result<Self> {
        let fixes = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str::<Location>(line)
                    .with_context(|| format!("Invalid fix on line {}", n + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(fixes, delay_ms))
    }

    /// Fixes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.fixes.len()
    }
}

#[async_trait]
impl FixSource for ReplaySource {
    async fn next_fix(&mut self) -> Result<FixEvent> {
        // no delay before the first fix
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.fixes.next() {
            Some(fix) => {
                self.yielded_first = true;
                Ok(FixEvent::Fix(fix))
            }
            None => Ok(FixEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// JSON Lines Source
// ============================================================================

/// Reads JSON fixes, one per line, from any async reader.
///
/// Used with the simulator:
/// `fix-simulator --route route.json | navigation-core --route route.json --stdin`
pub struct JsonLinesSource<R> {
    reader: R,
    line_buffer: String,
    name: String,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin + Send + 'static> JsonLinesSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            line_buffer: String::with_capacity(512),
            name: name.into(),
            skipped: 0,
        }
    }

    /// Malformed lines skipped so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl JsonLinesSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> FixSource for JsonLinesSource<R> {
    async fn next_fix(&mut self) -> Result<FixEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self
                .reader
                .read_line(&mut self.line_buffer)
                .await
                .with_context(|| format!("Failed to read from {}", self.name))?;
            if bytes == 0 {
                return Ok(FixEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Location>(line) {
                Ok(fix) => return Ok(FixEvent::Fix(fix)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("[{}] Failed to parse fix: {}", self.name, e);
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
