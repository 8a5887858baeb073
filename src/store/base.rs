use chrono::{DateTime, Utc};

use crate::models::CredentialSet;

/// The TokenStore trait abstracts credential storage (read, rotate, clear).
///
/// Every operation is total: implementations swallow their own failures
/// rather than surfacing them to the interceptor. Reads must not block on I/O.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn session_id(&self) -> Option<String>;

    /// Snapshot of the full set, if both tokens and their expiries are known.
    fn credentials(&self) -> Option<CredentialSet>;

    /// Replaces all five fields in one step.
    fn store_tokens(&self, credentials: CredentialSet);

    /// Replaces the access token and its expiry, leaving everything else alone.
    fn store_access_token(&self, token: String, expiry: DateTime<Utc>);

    /// Resets every field. Calling it on an empty store is a no-op.
    fn clear_all_tokens(&self);
}
