//! Storage infrastructure: host configuration file persistence.
//!
//! The `config` sub-module reads the TOML file that tells prefstack where its
//! stores live and which build flavour is running.  It provides defaults when
//! the file does not exist yet.

pub mod config;
