//! Durable parameter store: one file per key under a single directory.
//!
//! Every component receives a [`ParamHandle`] at construction instead of
//! opening its own store. Production code hands out a file-backed
//! [`ParamStore`]; tests hand out a [`MemoryParams`] double.
//!
//! Values are opaque bytes. By convention booleans are `"1"` / `"0"` and
//! numbers or strings are their text form.

pub mod file;
pub mod key;
pub mod memory;

use std::sync::Arc;

use crate::error::StoreError;

pub use file::{ParamStore, StagedWrite};
pub use key::{decode_bool, encode_bool, validate_key};
pub use memory::MemoryParams;


/// Shared handle to a parameter store.
pub type ParamHandle = Arc<dyn Params>;


/// Key-value operations every parameter store provides.
///
/// Reads never fail: an unreadable key is reported as absent so callers can
/// fall back to their declared default. Writes surface their errors.
pub trait Params: Send + Sync {
    /// Current value of `key`, or `None` if it does not exist or cannot be read.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Atomically replace the value of `key`.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Whether `key` currently exists.
    fn exists(&self, key: &str) -> bool;

    /// Boolean view of `key`; absent or malformed reads as `false`.
    fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(|v| decode_bool(&v)).unwrap_or(false)
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.put(key, encode_bool(value))
    }

    /// Lossy UTF-8 view of `key`.
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| String::from_utf8_lossy(&v).into_owned())
    }

    /// Integer view of `key`; surrounding whitespace is ignored, anything
    /// unparseable reads as `None`.
    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_string(key)
            .and_then(|s| s.trim().parse::<i64>().ok())
    }
}
