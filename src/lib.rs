//! Library exports for authfetch, shared between the binary and tests.

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod interceptor;
pub mod models;
pub mod sinks;
pub mod store;
pub mod threads;
pub mod utils;

pub use coordinator::{RefreshCoordinator, RefreshGuard};
pub use error::Error;
pub use interceptor::{AuthInterceptor, Collaborators, Fetch, ProcessOutcome};
pub use models::{CredentialSet, Identity};
pub use store::{MemoryTokenStore, TokenStore};
