//! In-memory `KeyValueStore` for tests.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use super::kv::{KeyValueStore, StorageError};

/// `set_read_only` makes every write fail, which is how tests exercise the
/// durable-write error path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        store
    }

    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock().unwrap() = read_only;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if *self.read_only.lock().unwrap() {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only").into());
        }
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_rejects_writes() {
        let store = MemoryStore::with_entry("k", "v");
        store.set_read_only(true);
        assert!(matches!(store.set("k", "w"), Err(StorageError::Io(_))));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        store.set_read_only(false);
        store.set("k", "w").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("w"));
    }
}
