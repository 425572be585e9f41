//! Direct, string-encoded, and enumerated delegates.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{Accessor, Scalar};
use crate::registry::Enumerated;
use crate::store::{Store, StoreError};

// ── Direct delegate ───────────────────────────────────────────────────────────

/// Delegate whose logical type is the backend's native type.
pub struct Property<T: Scalar> {
    key: &'static str,
    default: T,
    store: Arc<dyn Store>,
}

impl<T: Scalar> Property<T> {
    pub fn new(key: &'static str, default: T, store: Arc<dyn Store>) -> Self {
        Self {
            key,
            default,
            store,
        }
    }

    /// The declared default.
    pub fn default_value(&self) -> &T {
        &self.default
    }
}

impl<T: Scalar> Accessor<T> for Property<T> {
    fn key(&self) -> &'static str {
        self.key
    }

    fn get(&self) -> Result<T, StoreError> {
        T::load(self.store.as_ref(), self.key, &self.default)
    }

    fn set(&self, value: T) -> Result<(), StoreError> {
        debug!(key = self.key, backend = self.store.name(), ?value, "write");
        T::save(self.store.as_ref(), self.key, &value)
    }
}

// ── String-encoded integer delegate ───────────────────────────────────────────

/// Delegate for a logical `i32` kept in a backend slot that only holds strings.
///
/// A stored string that does not parse as an integer reads as the default;
/// the parse error never reaches the caller.  Surrounding whitespace is
/// trimmed before parsing, so `" 1 "` reads as `1`.
pub struct StrIntProperty {
    key: &'static str,
    default: i32,
    store: Arc<dyn Store>,
}

impl StrIntProperty {
    pub fn new(key: &'static str, default: i32, store: Arc<dyn Store>) -> Self {
        Self {
            key,
            default,
            store,
        }
    }

    pub fn default_value(&self) -> i32 {
        self.default
    }
}

impl Accessor<i32> for StrIntProperty {
    fn key(&self) -> &'static str {
        self.key
    }

    fn get(&self) -> Result<i32, StoreError> {
        let raw = self.store.get_string(self.key, &self.default.to_string())?;
        Ok(raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = self.key, raw = %raw, "stored value is not an integer; using default");
            self.default
        }))
    }

    fn set(&self, value: i32) -> Result<(), StoreError> {
        debug!(key = self.key, backend = self.store.name(), value, "write");
        self.store.put_string(self.key, &value.to_string())
    }
}

// ── Enumerated delegate ───────────────────────────────────────────────────────

/// Typed view of a closed enumeration stored through any `i32` accessor.
///
/// A raw value outside the enumeration reads as `default`; it is never handed
/// to the caller.  Repairing it on disk is the migration controller's job.
pub struct EnumProperty<E: Enumerated, P: Accessor<i32>> {
    inner: P,
    default: E,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Enumerated, P: Accessor<i32>> EnumProperty<E, P> {
    pub fn new(inner: P, default: E) -> Self {
        Self {
            inner,
            default,
            _marker: PhantomData,
        }
    }

    pub fn default_value(&self) -> E {
        self.default
    }

    /// The raw integer as stored, without validation.
    pub fn get_raw(&self) -> Result<i32, StoreError> {
        self.inner.get()
    }
}

impl<E: Enumerated, P: Accessor<i32>> Accessor<E> for EnumProperty<E, P> {
    fn key(&self) -> &'static str {
        self.inner.key()
    }

    fn get(&self) -> Result<E, StoreError> {
        let raw = self.inner.get()?;
        Ok(E::from_raw(raw).unwrap_or_else(|err| {
            warn!(key = self.inner.key(), %err, "using default");
            self.default
        }))
    }

    fn set(&self, value: E) -> Result<(), StoreError> {
        self.inner.set(value.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ScalarValue, UpdateChannel};
    use crate::store::memory::MemoryStore;
    use crate::store::MockStore;

    fn memory() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    // ── Property<T> ───────────────────────────────────────────────────────────

    #[test]
    fn test_property_reads_default_before_any_write() {
        let store = memory();
        let flag = Property::new("doh", false, store.clone());
        let name = Property::new("locale", String::from("en"), store.clone());
        let count = Property::new("bootloop", 3, store);

        assert!(!flag.get().unwrap());
        assert_eq!(name.get().unwrap(), "en");
        assert_eq!(count.get().unwrap(), 3);
    }

    #[test]
    fn test_property_set_then_get_round_trips() {
        // Arrange
        let store = memory();
        let count = Property::new("bootloop", 0, store);

        // Act / Assert
        for value in [i32::MIN, -1, 0, 1, i32::MAX] {
            count.set(value).unwrap();
            assert_eq!(count.get().unwrap(), value);
        }
    }

    #[test]
    fn test_two_delegates_share_one_source_of_truth() {
        // Arrange
        let store = memory();
        let a = Property::new("su_tapjack", true, store.clone());
        let b = Property::new("su_tapjack", true, store);

        // Act
        a.set(false).unwrap();

        // Assert
        assert!(!b.get().unwrap());
    }

    #[test]
    fn test_property_propagates_backend_failure() {
        // Arrange
        let mut store = MockStore::new();
        store.expect_get_bool().returning(|_, _| {
            Err(StoreError::Corrupt {
                path: "prefs.toml".into(),
                reason: "truncated".to_string(),
            })
        });
        let flag = Property::new("doh", false, Arc::new(store));

        // Act
        let result = flag.get();

        // Assert
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    // ── StrIntProperty ────────────────────────────────────────────────────────

    #[test]
    fn test_str_int_writes_decimal_string() {
        // Arrange
        let store = memory();
        let timeout = StrIntProperty::new("su_request_timeout", 10, store.clone());

        // Act
        timeout.set(-1).unwrap();

        // Assert
        assert_eq!(
            store.raw("su_request_timeout"),
            Some(ScalarValue::Str("-1".to_string()))
        );
        assert_eq!(timeout.get().unwrap(), -1);
    }

    #[test]
    fn test_str_int_round_trips_extremes() {
        let timeout = StrIntProperty::new("su_request_timeout", 10, memory());
        for value in [i32::MIN, 0, 60, i32::MAX] {
            timeout.set(value).unwrap();
            assert_eq!(timeout.get().unwrap(), value);
        }
    }

    #[test]
    fn test_str_int_malformed_value_reads_as_default() {
        // Arrange
        let store = memory();
        store.insert("update_channel", ScalarValue::Str("beta".to_string()));
        let channel = StrIntProperty::new("update_channel", -1, store);

        // Act / Assert
        assert_eq!(channel.get().unwrap(), -1);
    }

    #[test]
    fn test_str_int_tolerates_surrounding_whitespace() {
        let store = memory();
        store.insert("update_channel", ScalarValue::Str(" 1 ".to_string()));
        let channel = StrIntProperty::new("update_channel", -1, store);

        assert_eq!(channel.get().unwrap(), 1);
    }

    #[test]
    fn test_str_int_native_int_in_string_slot_reads_as_default() {
        let store = memory();
        store.insert("su_notification", ScalarValue::Int(0));
        let notification = StrIntProperty::new("su_notification", 1, store);
        assert_eq!(notification.get().unwrap(), 1);
    }

    #[test]
    fn test_str_int_missing_value_reads_as_default() {
        let notification = StrIntProperty::new("su_notification", 1, memory());
        assert_eq!(notification.get().unwrap(), 1);
    }

    // ── EnumProperty ──────────────────────────────────────────────────────────

    #[test]
    fn test_enum_property_reads_stored_variant() {
        // Arrange
        let store = memory();
        store.insert("update_channel", ScalarValue::Str("1".to_string()));
        let channel = EnumProperty::new(
            StrIntProperty::new("update_channel", -1, store),
            UpdateChannel::Default,
        );

        // Act / Assert
        assert_eq!(channel.get().unwrap(), UpdateChannel::Beta);
        assert_eq!(channel.key(), "update_channel");
    }

    #[test]
    fn test_enum_property_out_of_range_reads_as_default() {
        // Arrange
        let store = memory();
        store.insert("update_channel", ScalarValue::Str("99".to_string()));
        let channel = EnumProperty::new(
            StrIntProperty::new("update_channel", 3, store),
            UpdateChannel::Canary,
        );

        // Act / Assert
        assert_eq!(channel.get().unwrap(), UpdateChannel::Canary);
        assert_eq!(channel.get_raw().unwrap(), 99);
    }

    #[test]
    fn test_enum_property_set_writes_raw_value() {
        let store = memory();
        let channel = EnumProperty::new(
            StrIntProperty::new("update_channel", -1, store.clone()),
            UpdateChannel::Default,
        );

        channel.set(UpdateChannel::Custom).unwrap();

        assert_eq!(
            store.raw("update_channel"),
            Some(ScalarValue::Str("2".to_string()))
        );
    }
}
