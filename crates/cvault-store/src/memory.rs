use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::SessionStorage;

/// Browser session storage quota, in UTF-16 code units.
pub const BROWSER_SESSION_QUOTA: usize = 5 * 1024 * 1024;

/// In-memory, HashMap-based session storage.
///
/// Intended for tests and embedding. Entries live behind a `RwLock`. An
/// optional quota counts UTF-16 code units of every key and value, which is
/// how browsers meter `sessionStorage`.
pub struct InMemorySessionStorage {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    read_only: AtomicBool,
}

impl InMemorySessionStorage {
    /// Create a new empty store with no quota.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: None,
            read_only: AtomicBool::new(false),
        }
    }

    /// Create a new empty store that refuses writes past `quota` units.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::new()
        }
    }

    /// Create a store metered like a browser tab.
    pub fn browser_like() -> Self {
        Self::with_quota(BROWSER_SESSION_QUOTA)
    }

    /// Make every subsequent write fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().expect("lock poisoned").is_empty()
    }

    /// UTF-16 code units used by all keys and values.
    pub fn used_units(&self) -> usize {
        self.items
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(k, v)| entry_units(k, v))
            .sum()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.items.write().expect("lock poisoned").clear();
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let map = self.items.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn entry_units(key: &str, value: &str) -> usize {
    key.encode_utf16().count() + value.encode_utf16().count()
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self.items.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.items.write().expect("lock poisoned");
        if let Some(quota) = self.quota {
            let current: usize = map.iter().map(|(k, v)| entry_units(k, v)).sum();
            let replaced = map.get(key).map_or(0, |old| entry_units(key, old));
            let requested = current - replaced + entry_units(key, value);
            if requested > quota {
                return Err(StoreError::QuotaExceeded { requested, quota });
            }
        }
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        self.items.write().expect("lock poisoned").remove(key);
        Ok(())
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.items.read().expect("lock poisoned").contains_key(key))
    }
}

impl std::fmt::Debug for InMemorySessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySessionStorage")
            .field("key_count", &self.len())
            .field("quota", &self.quota)
            .finish()
    }
}
