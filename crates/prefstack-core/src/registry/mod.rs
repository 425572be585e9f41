//! Key/Value registry: the published contract of key names and legal values.
//!
//! Two namespaces of keys exist, partitioned by the backend that owns them
//! (see [`Backend`]).  A live key never moves between backends; the only keys
//! that ever disappear are the legacy names handled by migration.
//!
//! Values stored under enumerated keys are closed integer sets.  The raw
//! integer read from a backend is only trusted after going through
//! [`Enumerated::from_raw`].

pub mod keys;
pub mod values;

use std::fmt;

use thiserror::Error;

pub use keys::{Backend, Key, ValueKind, LEGACY_SU_FINGERPRINT};
pub use values::{
    BuildVariant, DarkThemeMode, Enumerated, MountNamespaceMode, MultiuserMode, RootAccess,
    SuAutoResponse, SuNotification, SuTimeout, UpdateChannel,
};

/// Rejection produced when a name or raw value is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidValue {
    /// The string does not name any registered key.
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),

    /// The integer is outside the closed enumeration.
    #[error("{value} is not a legal {kind} value")]
    OutOfRange { kind: &'static str, value: i32 },

    /// The text cannot be parsed as the kind the key stores.
    #[error("`{text}` cannot be parsed as {expected}")]
    Unparseable { text: String, expected: ValueKind },
}

/// A single scalar as seen by callers that address keys dynamically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i32),
    Str(String),
}

impl ScalarValue {
    /// The kind a delegate would use to hold this value natively.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Str(_) => ValueKind::Str,
        }
    }
}

/// Parses user-supplied text as a boolean (`true` / `false`).
pub fn parse_bool(text: &str) -> Result<bool, InvalidValue> {
    text.trim().parse().map_err(|_| InvalidValue::Unparseable {
        text: text.to_string(),
        expected: ValueKind::Bool,
    })
}

/// Parses user-supplied text as a decimal integer.
pub fn parse_int(text: &str) -> Result<i32, InvalidValue> {
    text.trim().parse().map_err(|_| InvalidValue::Unparseable {
        text: text.to_string(),
        expected: ValueKind::Int,
    })
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
        }
    }
}
