//! Error types surfaced by the navigation core

use thiserror::Error;

/// Pipeline stage that can fail.
///
/// Off-route, milestone and snap failures are isolated per fix. A listener
/// failure ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    OffRoute,
    Milestones,
    Snap,
    Listener,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OffRoute => "off-route",
            Self::Milestones => "milestones",
            Self::Snap => "snap",
            Self::Listener => "listener",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Route with no legs or with a leg that has no steps
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A component panicked while handling a fix; its fallback value was used
    #[error("{component} component failed: {message}")]
    ComponentFailure {
        component: Component,
        message: String,
    },

    /// The navigation session is no longer accepting commands
    #[error("navigation session has ended")]
    SessionEnded,
}

impl NavigationError {
    /// Build a `ComponentFailure` from a caught panic payload.
    pub fn from_panic(component: Component, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self::ComponentFailure { component, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_is_extracted() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        let err = NavigationError::from_panic(Component::Snap, payload.as_ref());
        assert_eq!(err.to_string(), "snap component failed: boom 7");
    }

    #[test]
    fn static_str_panic_message_is_extracted() {
        let payload = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        let err = NavigationError::from_panic(Component::OffRoute, payload.as_ref());
        assert!(matches!(
            err,
            NavigationError::ComponentFailure { component: Component::OffRoute, ref message } if message == "static"
        ));
    }
}
