//! Application layer: the configuration facade and its startup sequence.
//!
//! # Sub-modules
//!
//! - **`config`**    – The `Config` facade binding every property to the
//!   backend that owns it, plus dynamic access by key name.
//!
//! - **`migration`** – The startup reconciliation (`load`): fresh-install
//!   import or in-place migration of legacy keys and out-of-range values.
//!
//! - **`global`**    – The process-wide instance and its initialization order.
//!   `install` runs `load` and only then publishes the configuration, so no
//!   reader can observe pre-migration state.

pub mod config;
pub mod global;
pub mod migration;
