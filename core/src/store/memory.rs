//! In-memory parameter store for tests.
//!
//! Records every successful write and can be told to fail writes, making it
//! easy to drive rollback paths in bindings and panels deterministically.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::key::validate_key;
use super::Params;
use crate::error::StoreError;


/// A test double that keeps values in a map and records writes.
#[derive(Debug, Default)]
pub struct MemoryParams {
    values: Mutex<HashMap<String, Vec<u8>>>,
    /// Keys written or removed, in order. `None` marks a removal.
    writes: Mutex<Vec<(String, Option<Vec<u8>>)>>,
    fail_writes: AtomicBool,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with `(key, value)` pairs. Seeding is not
    /// recorded as writes.
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Self {
        let params = Self::new();
        if let Ok(mut map) = params.values.lock() {
            for (k, v) in values {
                map.insert(k.to_string(), v.to_vec());
            }
        }
        params
    }

    /// Make every following `put` / `remove` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Writes recorded so far.
    pub fn writes(&self) -> Vec<(String, Option<Vec<u8>>)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Clear the write log.
    pub fn clear_writes(&self) {
        if let Ok(mut w) = self.writes.lock() {
            w.clear();
        }
    }

    fn check_write(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                key,
                io::Error::new(io::ErrorKind::PermissionDenied, "injected write failure"),
            ));
        }
        Ok(())
    }

    fn record(&self, key: &str, value: Option<Vec<u8>>) {
        if let Ok(mut w) = self.writes.lock() {
            w.push((key.to_string(), value));
        }
    }
}

impl Params for MemoryParams {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check_write(key)?;
        if let Ok(mut map) = self.values.lock() {
            map.insert(key.to_string(), value.to_vec());
        }
        self.record(key, Some(value.to_vec()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check_write(key)?;
        if let Ok(mut map) = self.values.lock() {
            map.remove(key);
        }
        self.record(key, None);
        Ok(())
    }

    fn exists(&self, key: &str) -> bool {
        self.values
            .lock()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }
}
