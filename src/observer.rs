//! Failure reporting for isolated component errors
//!
//! The route processor never propagates a component failure across the
//! pipeline boundary. Instead each failure is handed to a `FailureObserver`
//! and processing continues with the component's fallback value.

use std::sync::{Arc, Mutex};

use tracing::error;

use crate::error::NavigationError;

/// Receives every error raised while processing fixes.
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, error: &NavigationError);
}

/// Default observer: logs each failure.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn on_failure(&self, err: &NavigationError) {
        error!(error = %err, "Navigation component failure");
    }
}

/// Observer that keeps every failure for later inspection.
#[derive(Debug, Default, Clone)]
pub struct FailureLog {
    entries: Arc<Mutex<Vec<NavigationError>>>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the failures recorded so far.
    pub fn entries(&self) -> Vec<NavigationError> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FailureObserver for FailureLog {
    fn on_failure(&self, err: &NavigationError) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.push(err.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Component;

    #[test]
    fn failure_log_collects_in_order() {
        let log = FailureLog::new();
        assert!(log.is_empty());

        log.on_failure(&NavigationError::InvalidRoute("no legs".into()));
        log.on_failure(&NavigationError::ComponentFailure {
            component: Component::Snap,
            message: "bad geometry".into(),
        });

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], NavigationError::InvalidRoute(_)));
    }

    #[test]
    fn clones_share_storage() {
        let log = FailureLog::new();
        let observer: Arc<dyn FailureObserver> = Arc::new(log.clone());
        observer.on_failure(&NavigationError::SessionEnded);
        assert_eq!(log.len(), 1);
    }
}
