//! In-memory [`Store`] for tests and benchmarks.
//!
//! Behaves like the real backends (typed values, default on missing or
//! mismatched type) without touching the file system.  Tests can seed raw
//! values of any type with [`MemoryStore::insert`] and observe how many writes
//! reached the store with [`MemoryStore::write_count`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Store, StoreError};
use crate::registry::ScalarValue;

/// A [`Store`] backed by a map behind a mutex.
pub struct MemoryStore {
    name: &'static str,
    values: Mutex<BTreeMap<String, ScalarValue>>,
    writes: Mutex<u32>,
}

impl MemoryStore {
    /// Creates an empty store labelled `"memory"`.
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Creates an empty store with a custom log label.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            values: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(0),
        }
    }

    /// Stores `value` verbatim, bypassing typed puts and the write counter.
    ///
    /// Useful for seeding malformed data, e.g. a non-numeric string under a
    /// key that is read as a string-encoded integer.
    pub fn insert(&self, key: &str, value: ScalarValue) {
        self.lock().insert(key.to_string(), value);
    }

    /// Returns the raw stored value, if any.
    pub fn raw(&self, key: &str) -> Option<ScalarValue> {
        self.lock().get(key).cloned()
    }

    /// All stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of successful `put_*` and `remove` calls so far.
    pub fn write_count(&self) -> u32 {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ScalarValue>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_write(&self) {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
    }

    fn put(&self, key: &str, value: ScalarValue) {
        self.lock().insert(key.to_string(), value);
        self.record_write();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(match self.lock().get(key) {
            Some(ScalarValue::Str(s)) => s.clone(),
            _ => default.to_string(),
        })
    }

    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        Ok(match self.lock().get(key) {
            Some(ScalarValue::Int(v)) => *v,
            _ => default,
        })
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        Ok(match self.lock().get(key) {
            Some(ScalarValue::Bool(v)) => *v,
            _ => default,
        })
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.put(key, ScalarValue::Str(value.to_string()));
        Ok(())
    }

    fn put_int(&self, key: &str, value: i32) -> Result<(), StoreError> {
        self.put(key, ScalarValue::Int(value));
        Ok(())
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.put(key, ScalarValue::Bool(value));
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        self.record_write();
        Ok(())
    }
}
