use std::sync::{PoisonError, RwLock};

use tracing::info;

use crate::models::Identity;

/// Receives the latest user identity decoded from a front token.
pub trait IdentitySink: Send + Sync {
    fn publish(&self, identity: Identity);
}

/// Shared application state holding whichever identity was published last.
#[derive(Default, Debug)]
pub struct SharedIdentity {
    current: RwLock<Option<Identity>>,
}

impl SharedIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Identity> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IdentitySink for SharedIdentity {
    fn publish(&self, identity: Identity) {
        info!(
            event_name = "identity.published",
            event_domain = "identity",
            user_id = identity.user_id.as_str(),
            has_email = identity.email.is_some(),
            "user identity updated"
        );
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }
}
