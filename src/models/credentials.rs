use chrono::{DateTime, Utc};

/// The full set of credentials the token store tracks.
///
/// Access and refresh tokens are always written together through
/// `TokenStore::store_tokens`; only the access-token renewal path touches
/// the access token on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSet {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expiry: DateTime<Utc>,
    pub refresh_token_expiry: DateTime<Utc>,
    pub session_id: String,
}

impl CredentialSet {
    /// True once `now` has reached the access token's expiry.
    pub fn is_access_token_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.access_token_expiry
    }

    pub fn is_refresh_token_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_token_expiry
    }
}
