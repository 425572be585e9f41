//! Infrastructure layer: the concrete backends behind the `Store` contract.
//!
//! # Sub-modules
//!
//! - **`prefs_file`** – The local preference store: one flat TOML table per
//!   package under the package's private data directory.
//!
//! - **`settings_db`** – The structured settings store, kept in SQLite.
//!
//! - **`content_source`** – Byte-stream access to a previous installation's
//!   preference file, used only by the fresh-install import.
//!
//! - **`storage`** – The host configuration file that says where all of the
//!   above live.

pub mod content_source;
pub mod prefs_file;
pub mod settings_db;
pub mod storage;
