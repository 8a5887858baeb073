/// Errors surfaced by the interceptor and its collaborators.
///
/// Only `Network` ever reaches a caller of [`crate::interceptor::Fetch`];
/// decode and storage failures are absorbed by the response processor.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A token could not be decoded.
    #[error("Token decode error: {0}")]
    Decode(String),

    /// The underlying request failed before a response arrived.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Ephemeral storage rejected a write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}
