//! Durable client-side storage for the cart and session identity.
//!
//! The platform hands the core an opaque string key-value store (browser
//! local storage in production). The core writes on every mutating cart or
//! session operation and reads once at session start. Storage failures are
//! never fatal: writes are logged and swallowed, reads degrade to "no
//! persisted state".

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Namespaced key holding the serialized cart entry list.
pub const CART_KEY: &str = "branch_orders.cart";

/// Namespaced key holding the serialized session identity.
pub const SESSION_KEY: &str = "branch_orders.session";

/// Errors from the durable storage backend.
///
/// Callers inside the core swallow these (degrading to unpersisted state);
/// the type exists so implementations can report what went wrong for logs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Durable string key-value storage.
///
/// Implementations must be cheap to call from synchronous code paths; the
/// cart persists on every mutation.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local [`KeyValueStore`] used by tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
