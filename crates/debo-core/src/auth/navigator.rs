//! Redirect side effect for forced re-authentication.

use std::sync::{Arc, Mutex};

use tracing::info;

/// Sends the user somewhere else, typically the login route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Logs the redirect and does nothing else.
#[derive(Debug, Clone, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        info!(route = route, "Redirecting");
    }
}

/// Remembers every route it was sent to. Clones share the history.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.routes().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(route.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator_keeps_history() {
        let nav = RecordingNavigator::new();
        assert!(nav.last().is_none());

        let shared = nav.clone();
        shared.navigate("/login");
        shared.navigate("/login");

        assert_eq!(nav.routes(), vec!["/login", "/login"]);
        assert_eq!(nav.last().as_deref(), Some("/login"));
    }
}
