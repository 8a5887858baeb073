//! Collaborators the interceptor reports to: shared identity state and navigation.

pub mod identity;
pub mod navigation;

pub use identity::{IdentitySink, SharedIdentity};
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator};
