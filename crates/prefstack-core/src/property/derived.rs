//! Properties that add logic around another accessor.
//!
//! # Gated
//!
//! The visible value is `condition && stored flag`.  The condition is
//! evaluated on every read and never cached, so a change in the outside world
//! changes the visible value without any write.  The setter only ever writes
//! the stored flag.
//!
//! # Reactive
//!
//! `get` passes through.  `set` reads the current value, stops if it equals
//! the new one, otherwise writes and then runs the reaction exactly once, on
//! the calling thread, after the write has returned.  There is no
//! compare-and-swap: callers serialize writes to one key themselves.

use std::fmt::Debug;

use tracing::debug;

use super::Accessor;
use crate::store::StoreError;

/// A live external check, such as "the device has a secure lock screen".
pub trait Condition: Send + Sync {
    fn holds(&self) -> bool;
}

impl<F> Condition for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn holds(&self) -> bool {
        self()
    }
}

// ── Gated ─────────────────────────────────────────────────────────────────────

/// Boolean property visible only while an external condition holds.
pub struct Gated<P: Accessor<bool>> {
    inner: P,
    condition: Box<dyn Condition>,
}

impl<P: Accessor<bool>> Gated<P> {
    pub fn new(inner: P, condition: impl Condition + 'static) -> Self {
        Self {
            inner,
            condition: Box::new(condition),
        }
    }

    /// The stored flag, ignoring the condition.
    pub fn stored(&self) -> Result<bool, StoreError> {
        self.inner.get()
    }
}

impl<P: Accessor<bool>> Accessor<bool> for Gated<P> {
    fn key(&self) -> &'static str {
        self.inner.key()
    }

    fn get(&self) -> Result<bool, StoreError> {
        // The backend is not consulted while the gate is closed.
        if !self.condition.holds() {
            return Ok(false);
        }
        self.inner.get()
    }

    fn set(&self, value: bool) -> Result<(), StoreError> {
        self.inner.set(value)
    }
}

// ── Reactive ──────────────────────────────────────────────────────────────────

/// Property that runs a side effect when, and only when, its value changes.
///
/// The reaction receives the new value but no handle to this property, so it
/// cannot re-enter the setter.
pub struct Reactive<P: Accessor<T>, T> {
    inner: P,
    reaction: Box<dyn Fn(&T) + Send + Sync>,
}

impl<P, T> Reactive<P, T>
where
    P: Accessor<T>,
    T: Clone + PartialEq + Debug,
{
    pub fn new(inner: P, reaction: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self {
            inner,
            reaction: Box::new(reaction),
        }
    }

    /// Like [`Accessor::set`], but reports whether the value changed and the
    /// reaction ran.
    pub fn replace(&self, value: T) -> Result<bool, StoreError> {
        let current = self.inner.get()?;
        if current == value {
            return Ok(false);
        }
        self.inner.set(value.clone())?;
        debug!(key = self.inner.key(), ?current, new = ?value, "value changed; reacting");
        (self.reaction)(&value);
        Ok(true)
    }
}

impl<P, T> Accessor<T> for Reactive<P, T>
where
    P: Accessor<T>,
    T: Clone + PartialEq + Debug + Send + Sync,
{
    fn key(&self) -> &'static str {
        self.inner.key()
    }

    fn get(&self) -> Result<T, StoreError> {
        self.inner.get()
    }

    fn set(&self, value: T) -> Result<(), StoreError> {
        self.replace(value).map(|_| ())
    }
}
