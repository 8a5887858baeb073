pub mod credentials;
pub mod identity;

pub use credentials::CredentialSet;
pub use identity::Identity;
