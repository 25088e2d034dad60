use crate::error::StoreResult;

/// String key/value storage scoped to one session.
///
/// All implementations must satisfy these invariants:
/// - `set_item` is atomic: afterwards the key holds either the new value or,
///   on error, exactly the value it held before.
/// - `get_item` on a missing key returns `Ok(None)`.
/// - `remove_item` on a missing key succeeds.
/// - Values are opaque strings.
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key` and its value.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Check whether a value is stored under `key`.
    ///
    /// Default implementation reads the value. Backends may override with a
    /// cheaper existence check.
    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}

impl<T: SessionStorage + ?Sized> SessionStorage for &T {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        (**self).remove_item(key)
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        (**self).contains_key(key)
    }
}
