//! TOML-based host configuration: where the stores live and how the build is
//! flavoured.
//!
//! Read from the platform-appropriate config file:
//! - Linux:    `$XDG_CONFIG_HOME/prefstack/config.toml` or `~/.config/prefstack/config.toml`
//! - macOS:    `~/Library/Application Support/Prefstack/config.toml`
//! - Windows:  `%APPDATA%\Prefstack\config.toml`
//!
//! ```toml
//! package = "com.example.app"
//! build_variant = "canary"
//! log_level = "debug"
//! data_root = "/var/lib/prefstack"
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so a missing file, a missing
//! field, or an older file written before a field existed all load cleanly.

use std::path::{Path, PathBuf};

use prefstack_core::BuildVariant;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for host configuration file operations.
#[derive(Debug, Error)]
pub enum HostConfigError {
    /// The platform config or data directory could not be determined.
    #[error("could not determine platform {0} directory")]
    NoPlatformDir(&'static str),

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Host settings loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// Application identifier; names the preference file and the per-package
    /// data directory.
    #[serde(default = "default_package")]
    pub package: String,
    /// Directory holding one data directory per package.  Defaults to the
    /// platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    /// Explicit settings database path; defaults to
    /// `<data_dir>/databases/settings.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_db: Option<PathBuf>,
    /// Build flavour; decides the default update channel.
    #[serde(default)]
    pub build_variant: BuildVariant,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_package() -> String {
    "com.example.app".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            data_root: None,
            settings_db: None,
            build_variant: BuildVariant::default(),
            log_level: default_log_level(),
        }
    }
}

impl HostConfig {
    /// The directory holding every package's data directory.
    ///
    /// # Errors
    ///
    /// Returns [`HostConfigError::NoPlatformDir`] when no root is configured
    /// and the platform data directory cannot be determined.
    pub fn data_root(&self) -> Result<PathBuf, HostConfigError> {
        match &self.data_root {
            Some(root) => Ok(root.clone()),
            None => platform_data_dir().ok_or(HostConfigError::NoPlatformDir("data")),
        }
    }

    /// This package's private data directory.
    pub fn data_dir(&self) -> Result<PathBuf, HostConfigError> {
        Ok(self.data_root()?.join(&self.package))
    }

    /// Path of the structured settings database.
    pub fn settings_db_path(&self) -> Result<PathBuf, HostConfigError> {
        match &self.settings_db {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("databases").join("settings.db")),
        }
    }
}

// ── Config file ───────────────────────────────────────────────────────────────

/// Resolves the full path to the platform config file.
///
/// # Errors
///
/// Returns [`HostConfigError::NoPlatformDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, HostConfigError> {
    Ok(platform_config_dir()
        .ok_or(HostConfigError::NoPlatformDir("config"))?
        .join("config.toml"))
}

/// Loads `HostConfig` from `path`, returning the defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`HostConfigError::Io`] for file-system errors other than "not
/// found", and [`HostConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<HostConfig, HostConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(source) => Err(HostConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Prefstack"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("prefstack"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Prefstack")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

fn platform_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(|p| PathBuf::from(p).join("Prefstack"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })?;
        Some(base.join("prefstack"))
    }

    #[cfg(target_os = "macos")]
    {
        // Data and config share one directory on macOS.
        platform_config_dir()
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_config_default_values() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.package, "com.example.app");
        assert_eq!(cfg.build_variant, BuildVariant::Release);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.data_root.is_none());
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_deserialize_partial_toml_overrides_defaults() {
        // Arrange
        let toml_str = r#"
package = "org.sample.next"
build_variant = "canary"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.package, "org.sample.next");
        assert_eq!(cfg.build_variant, BuildVariant::Canary);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_deserialize_unknown_variant_is_parse_error() {
        let result: Result<HostConfig, toml::de::Error> =
            toml::from_str(r#"build_variant = "nightly""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip_through_toml() {
        // Arrange
        let cfg = HostConfig {
            package: "com.example.other".to_string(),
            data_root: Some(PathBuf::from("/srv/prefs")),
            settings_db: None,
            build_variant: BuildVariant::Debug,
            log_level: "trace".to_string(),
        };

        // Act
        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&text).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
        assert!(!text.contains("settings_db"), "None must be omitted");
    }

    #[test]
    fn test_data_dir_and_db_path_derive_from_root() {
        let cfg = HostConfig {
            data_root: Some(PathBuf::from("/srv/prefs")),
            ..HostConfig::default()
        };

        assert_eq!(
            cfg.data_dir().unwrap(),
            PathBuf::from("/srv/prefs/com.example.app")
        );
        assert_eq!(
            cfg.settings_db_path().unwrap(),
            PathBuf::from("/srv/prefs/com.example.app/databases/settings.db")
        );
    }

    #[test]
    fn test_explicit_settings_db_wins() {
        let cfg = HostConfig {
            data_root: Some(PathBuf::from("/srv/prefs")),
            settings_db: Some(PathBuf::from("/tmp/other.db")),
            ..HostConfig::default()
        };
        assert_eq!(cfg.settings_db_path().unwrap(), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.toml")).expect("absent is ok");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        // Act
        let cfg = load_config(&path).expect("load");

        // Assert
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn test_load_config_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config(&path), Err(HostConfigError::Parse(_))));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
        // NoPlatformDir is acceptable in a stripped CI environment.
    }
}
