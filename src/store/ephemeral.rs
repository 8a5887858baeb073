use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::Error;

/// Session-scoped key/value storage for short-lived markers.
pub trait EphemeralStorage: Send + Sync {
    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;
    fn get_item(&self, key: &str) -> Option<String>;
}

/// EphemeralStorage backed by a process-local map.
#[derive(Default, Debug)]
pub struct MemoryEphemeralStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryEphemeralStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EphemeralStorage for MemoryEphemeralStorage {
    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
