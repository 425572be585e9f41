//! Process-wide configuration instance.
//!
//! # Initialization order
//!
//! 1. Build a [`Config`] (usually [`Config::open`]).
//! 2. Call [`install`], which runs the migration controller on it and only
//!    then publishes it.
//! 3. Everything else calls [`config`] (or [`get`]).
//!
//! Publication happens at most once per process.  The instance is shared by
//! reference; its delegates carry no interior state beyond the backends' own,
//! so no wrapper lock is needed for reads.  Writers to one reactive key must
//! still serialize among themselves.

use once_cell::sync::OnceCell;
use tracing::info;

use crate::application::config::{Config, ConfigError};
use crate::application::migration::{load, LoadReport};
use crate::infrastructure::content_source::ContentSource;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Migrates `config` and publishes it as the process-wide instance.
///
/// Migration runs inside the one-time initializer, so concurrent callers
/// block until the first has finished and at most one `config` is ever
/// migrated.
///
/// # Errors
///
/// [`ConfigError::AlreadyInitialized`] if an instance is already published,
/// in which case `config` is dropped without being migrated.  Migration
/// failures are returned as-is and nothing is published.
pub fn install(
    config: Config,
    previous_package: Option<&str>,
    source: &dyn ContentSource,
) -> Result<LoadReport, ConfigError> {
    let mut report = None;
    CONFIG.get_or_try_init(|| -> Result<Config, ConfigError> {
        report = Some(load(&config, previous_package, source)?);
        Ok(config)
    })?;
    let report = report.ok_or(ConfigError::AlreadyInitialized)?;
    info!(import = ?report.import, "configuration installed");
    Ok(report)
}

/// The published instance, if [`install`] has completed.
pub fn get() -> Option<&'static Config> {
    CONFIG.get()
}

/// The published instance.
///
/// # Errors
///
/// [`ConfigError::NotInitialized`] before [`install`] has completed.
pub fn config() -> Result<&'static Config, ConfigError> {
    CONFIG.get().ok_or(ConfigError::NotInitialized)
}
