use std::sync::{Mutex, PoisonError};

use tracing::info;

/// The page location the user is on, and a way to move them elsewhere.
pub trait Navigator: Send + Sync {
    fn current_location(&self) -> String;
    fn navigate(&self, target: &str);
}

/// Navigator that tracks location in memory and records every navigation.
#[derive(Debug)]
pub struct RecordingNavigator {
    location: Mutex<String>,
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location.into();
    }

    /// Every target passed to `navigate`, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_location(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn navigate(&self, target: &str) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
        self.set_location(target);
    }
}

/// Navigator for headless use: there is no page to leave, so it only logs.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn current_location(&self) -> String {
        "/".to_string()
    }

    fn navigate(&self, target: &str) {
        info!(
            event_name = "navigation.requested",
            event_domain = "navigation",
            destination = target,
            "login required, navigation requested"
        );
    }
}
