use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::TokenStore;
use crate::models::CredentialSet;

#[derive(Default, Debug)]
struct Slots {
    access_token: Option<String>,
    access_token_expiry: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    refresh_token_expiry: Option<DateTime<Utc>>,
    session_id: Option<String>,
}

/// In-process token store. Last writer wins across concurrent responses.
#[derive(Default, Debug)]
pub struct MemoryTokenStore {
    slots: RwLock<Slots>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `credentials`, as after a successful login.
    pub fn with_credentials(credentials: CredentialSet) -> Self {
        let store = Self::new();
        store.store_tokens(credentials);
        store
    }

    // A panic elsewhere while holding the lock leaves plain strings behind,
    // which are still safe to read and overwrite.
    fn read(&self) -> RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        non_empty(&self.read().access_token)
    }

    fn refresh_token(&self) -> Option<String> {
        non_empty(&self.read().refresh_token)
    }

    fn session_id(&self) -> Option<String> {
        non_empty(&self.read().session_id)
    }

    fn credentials(&self) -> Option<CredentialSet> {
        let slots = self.read();
        Some(CredentialSet {
            access_token: slots.access_token.clone()?,
            refresh_token: slots.refresh_token.clone()?,
            access_token_expiry: slots.access_token_expiry?,
            refresh_token_expiry: slots.refresh_token_expiry?,
            session_id: slots.session_id.clone().unwrap_or_default(),
        })
    }

    fn store_tokens(&self, credentials: CredentialSet) {
        let mut slots = self.write();
        *slots = Slots {
            access_token: Some(credentials.access_token),
            access_token_expiry: Some(credentials.access_token_expiry),
            refresh_token: Some(credentials.refresh_token),
            refresh_token_expiry: Some(credentials.refresh_token_expiry),
            session_id: Some(credentials.session_id),
        };
        debug!(
            event_name = "store.tokens.stored",
            event_domain = "store",
            access_token_expiry = %credentials.access_token_expiry,
            "stored full credential set"
        );
    }

    fn store_access_token(&self, token: String, expiry: DateTime<Utc>) {
        let mut slots = self.write();
        slots.access_token = Some(token);
        slots.access_token_expiry = Some(expiry);
        debug!(
            event_name = "store.access_token.stored",
            event_domain = "store",
            access_token_expiry = %expiry,
            "stored renewed access token"
        );
    }

    fn clear_all_tokens(&self) {
        *self.write() = Slots::default();
        debug!(
            event_name = "store.tokens.cleared",
            event_domain = "store",
            "cleared all tokens"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_credentials() -> CredentialSet {
        let now = Utc::now();
        CredentialSet {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            access_token_expiry: now + Duration::hours(1),
            refresh_token_expiry: now + Duration::days(30),
            session_id: "session-1".to_string(),
        }
    }

    #[test]
    fn test_empty_store_reports_nothing() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.session_id(), None);
        assert_eq!(store.credentials(), None);
    }

    #[test]
    fn test_store_tokens_replaces_everything() {
        let store = MemoryTokenStore::with_credentials(sample_credentials());
        let mut next = sample_credentials();
        next.access_token = "access-2".to_string();
        next.refresh_token = "refresh-2".to_string();
        next.session_id = "session-2".to_string();
        store.store_tokens(next.clone());

        assert_eq!(store.credentials(), Some(next));
    }

    #[test]
    fn test_store_access_token_leaves_refresh_and_session() {
        let store = MemoryTokenStore::with_credentials(sample_credentials());
        let expiry = Utc::now() + Duration::minutes(5);
        store.store_access_token("access-2".to_string(), expiry);

        let creds = store.credentials().expect("credentials should be present");
        assert_eq!(creds.access_token, "access-2");
        assert_eq!(creds.access_token_expiry, expiry);
        assert_eq!(creds.refresh_token, "refresh-1");
        assert_eq!(creds.session_id, "session-1");
    }

    #[test]
    fn test_access_token_alone_is_not_a_full_set() {
        let store = MemoryTokenStore::new();
        store.store_access_token("access-only".to_string(), Utc::now());
        assert_eq!(store.access_token().as_deref(), Some("access-only"));
        assert_eq!(store.credentials(), None);
    }

    #[test]
    fn test_empty_session_id_reads_as_absent() {
        let mut creds = sample_credentials();
        creds.session_id = String::new();
        let store = MemoryTokenStore::with_credentials(creds);
        assert_eq!(store.session_id(), None);
    }

    #[test]
    fn test_clear_all_tokens_is_idempotent() {
        let store = MemoryTokenStore::with_credentials(sample_credentials());
        store.clear_all_tokens();
        let once = (store.access_token(), store.refresh_token(), store.session_id());
        store.clear_all_tokens();
        let twice = (store.access_token(), store.refresh_token(), store.session_id());

        assert_eq!(once, (None, None, None));
        assert_eq!(once, twice);
        assert_eq!(store.credentials(), None);
    }
}
