//! # prefstack-core
//!
//! Shared contract crate for prefstack: the registry of configuration keys and
//! legal values, the narrow read/write contract every storage backend
//! implements, and the typed property delegates built on top of it.
//!
//! This crate has no file-system, database, or OS dependencies.  Concrete
//! backends (the TOML preference file and the SQLite settings store) live in
//! `prefstack-host`.
//!
//! # Architecture overview
//!
//! ```text
//!   caller ──► property (Property / StrIntProperty / EnumProperty)
//!                 │            ▲
//!                 │            └── Gated / Reactive wrappers
//!                 ▼
//!              dyn Store  (prefs file  |  settings db  |  MemoryStore)
//! ```
//!
//! - **`registry`** – Every key name, which backend owns it, and the closed
//!   integer enumerations stored under those keys.  Renaming or renumbering
//!   anything here is a breaking change for anything reading the stores
//!   directly.
//!
//! - **`store`** – The `Store` trait: typed get/put for booleans, integers and
//!   strings, with a default-value parameter on every read.
//!
//! - **`property`** – Delegates binding `(key, default, store)` into a
//!   read/write accessor, plus the gated and change-reaction wrappers.

pub mod property;
pub mod registry;
pub mod store;

pub use property::{
    Accessor, Condition, EnumProperty, Gated, Property, Reactive, Scalar, StrIntProperty,
};
pub use registry::{
    parse_bool, parse_int, Backend, BuildVariant, DarkThemeMode, Enumerated, InvalidValue, Key,
    MountNamespaceMode, MultiuserMode, RootAccess, ScalarValue, SuAutoResponse, SuNotification,
    SuTimeout, UpdateChannel, ValueKind, LEGACY_SU_FINGERPRINT,
};
pub use store::{memory::MemoryStore, Store, StoreError};
