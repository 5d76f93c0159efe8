//! In-process key-value store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::StorageError;

/// Key-value store kept in memory.
///
/// Writes can be made to fail on demand, which lets callers exercise the
/// write-failure path without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    fail_writes: AtomicBool,
    failing_keys: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `save` fail for `key` only (or succeed again).
    pub async fn set_fail_key(&self, key: &str, fail: bool) {
        let mut failing = self.failing_keys.write().await;
        if fail {
            failing.insert(key.to_string());
        } else {
            failing.remove(key);
        }
    }

    /// Store a raw value, bypassing failure injection.
    pub async fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing_keys.read().await.contains(key)
        {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: "writes disabled".to_string(),
            });
        }
        self.insert_raw(key, value).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_writes_keeps_previous_value() {
        let store = MemoryStore::new();
        store.save("k", "1").await.unwrap();
        store.set_fail_writes(true);
        assert!(store.save("k", "2").await.is_err());
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_fail_key_only_affects_that_key() {
        let store = MemoryStore::new();
        store.set_fail_key("a", true).await;
        assert!(store.save("a", "1").await.is_err());
        store.save("b", "1").await.unwrap();

        store.set_fail_key("a", false).await;
        store.save("a", "2").await.unwrap();
        assert_eq!(store.load("a").await.unwrap().as_deref(), Some("2"));
    }
}
