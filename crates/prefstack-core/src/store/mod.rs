//! Backend adapter contract.
//!
//! Both physical stores (the local preference file and the structured
//! settings store) are reached only through [`Store`]: typed get/put for
//! strings, integers and booleans, each read carrying the caller's default.
//!
//! # Error policy
//!
//! A missing key is never an error: it yields the default.  So does a value of
//! the wrong type or encoding.  `Err` is reserved for catastrophic storage
//! faults (I/O failure, a corrupt backing file, a database error) and is
//! fatal to the one call that hit it.  Nothing in this crate retries.

pub mod memory;

use std::path::PathBuf;

use thiserror::Error;

/// Catastrophic backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file-system operation on the backing file failed.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but cannot be decoded at all.
    #[error("backing file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// The backend's own engine reported a failure.
    #[error("{backend} backend failure: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Narrow typed read/write contract over one physical store.
///
/// # Guarantees implementors must provide
///
/// - Reads never fail for a missing key or a value of the wrong type; they
///   return `default`.
/// - Puts are write-through: when `put_*` returns `Ok`, a subsequent read
///   through any handle observes the new value.
/// - Each call is atomic on its own.  No ordering is promised across calls.
///
/// Implementations hold no per-key cache that could make two handles for the
/// same key disagree.
#[cfg_attr(test, mockall::automock)]
pub trait Store: Send + Sync {
    /// Short backend label for logs.
    fn name(&self) -> &'static str;

    fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError>;
    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError>;
    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError>;

    fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn put_int(&self, key: &str, value: i32) -> Result<(), StoreError>;
    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError>;

    /// Whether any value is stored under `key`.
    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// Deletes `key`.  Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
