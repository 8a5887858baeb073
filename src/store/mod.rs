pub mod base;
pub mod ephemeral;
pub mod memory_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{TokenStore, MemoryTokenStore};"
pub use base::TokenStore;
pub use ephemeral::{EphemeralStorage, MemoryEphemeralStorage};
pub use memory_store::MemoryTokenStore;
