//! Typed property delegates.
//!
//! A delegate binds one key, one declared default, and one backend into a
//! read/write accessor.  Delegates hold only a shared handle to the backend
//! and never cache, so two delegates for the same key always agree.
//!
//! ```text
//! Property<T>        native type matches the backend (bool / i32 / String)
//! StrIntProperty     logical i32 stored as a decimal string
//! EnumProperty<E,P>  closed enumeration over any i32 accessor
//! Gated<P>           stored flag AND a live external condition
//! Reactive<P,T>      pass-through get, compare-write-react set
//! ```
//!
//! Wrappers compose over [`Accessor`], never by subclassing a config base.

mod delegate;
mod derived;

use std::fmt::Debug;

use crate::store::{Store, StoreError};

pub use delegate::{EnumProperty, Property, StrIntProperty};
pub use derived::{Condition, Gated, Reactive};

/// Read/write access to one logical configuration value.
pub trait Accessor<T>: Send + Sync {
    /// The stored key name.
    fn key(&self) -> &'static str;

    /// Current value, or the declared default when nothing valid is stored.
    fn get(&self) -> Result<T, StoreError>;

    /// Writes `value` through to the backend.
    fn set(&self, value: T) -> Result<(), StoreError>;
}

/// A scalar type a backend can hold natively.
pub trait Scalar: Clone + PartialEq + Debug + Send + Sync + 'static {
    fn load(store: &dyn Store, key: &str, default: &Self) -> Result<Self, StoreError>;
    fn save(store: &dyn Store, key: &str, value: &Self) -> Result<(), StoreError>;
}

impl Scalar for bool {
    fn load(store: &dyn Store, key: &str, default: &Self) -> Result<Self, StoreError> {
        store.get_bool(key, *default)
    }

    fn save(store: &dyn Store, key: &str, value: &Self) -> Result<(), StoreError> {
        store.put_bool(key, *value)
    }
}

impl Scalar for i32 {
    fn load(store: &dyn Store, key: &str, default: &Self) -> Result<Self, StoreError> {
        store.get_int(key, *default)
    }

    fn save(store: &dyn Store, key: &str, value: &Self) -> Result<(), StoreError> {
        store.put_int(key, *value)
    }
}

impl Scalar for String {
    fn load(store: &dyn Store, key: &str, default: &Self) -> Result<Self, StoreError> {
        store.get_string(key, default)
    }

    fn save(store: &dyn Store, key: &str, value: &Self) -> Result<(), StoreError> {
        store.put_string(key, value)
    }
}
