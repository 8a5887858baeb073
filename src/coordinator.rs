//! Refresh-in-progress tracking.
//!
//! Whatever performs an explicit token refresh holds a [`RefreshGuard`] for
//! the duration of the call. The interceptor reads the flag exactly once per
//! request, when deciding whether to attach credentials. A refresh that begins
//! just after that read still races the request already on the wire; no lock
//! or queue closes that window.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct RefreshCoordinator {
    in_flight: Arc<AtomicUsize>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Marks a refresh as started. The flag stays set until every guard handed
    /// out has been dropped.
    #[must_use = "the refresh flag clears as soon as the guard is dropped"]
    pub fn begin_refresh(&self) -> RefreshGuard {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        debug!(
            event_name = "coordinator.refresh.begin",
            event_domain = "coordinator",
            in_flight = previous + 1,
            "token refresh started"
        );
        RefreshGuard {
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Clears its share of the refresh flag on drop.
#[derive(Debug)]
pub struct RefreshGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        let previous = self.in_flight.fetch_sub(1, Ordering::SeqCst);
        debug!(
            event_name = "coordinator.refresh.end",
            event_domain = "coordinator",
            in_flight = previous.saturating_sub(1),
            "token refresh finished"
        );
    }
}
