//! Startup reconciliation of stored state with the current schema.
//!
//! [`load`] runs once at process start, before anything else reads the
//! configuration.  It takes exactly one of two paths:
//!
//! 1. **Fresh-install import**: the preference file is empty and the caller
//!    names a previous installation.  That installation's preference file is
//!    copied in verbatim from a [`ContentSource`].  Failure is logged and
//!    swallowed; the process continues on defaults.
//!
//! 2. **In-place migration**: everything else.
//!    - The legacy `su_fingerprint` flag is folded into `su_biometric` when it
//!      is `true`, and removed whatever its value.
//!    - A stored update channel that is absent, not a number, or outside the
//!      legal range is overwritten with the build's default channel.  A legal
//!      channel is never touched.
//!
//!    The preference-file side of this is one atomic batch.  Running it again
//!    finds nothing to do.

use prefstack_core::{
    Accessor, Enumerated, Key, ScalarValue, Store, UpdateChannel, LEGACY_SU_FINGERPRINT,
};
use tracing::{debug, info, warn};

use crate::application::config::{Config, ConfigError};
use crate::infrastructure::content_source::ContentSource;
use crate::infrastructure::prefs_file::Edit;

/// What happened to the fresh-install import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The previous installation's file was copied in.
    Imported { bytes: u64 },
    /// The import path was not taken.
    Skipped,
    /// The import was attempted and failed; defaults are in effect.
    Failed { reason: String },
}

/// What happened to the legacy biometric flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKeyAction {
    Absent,
    /// It was `true`; `su_biometric` was set and the legacy key removed.
    Promoted,
    /// It was not `true`; the legacy key was removed and nothing else changed.
    Dropped,
}

/// What happened to the stored update channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRepair {
    Valid(UpdateChannel),
    Repaired {
        /// The stored text before repair, if there was any.
        previous: Option<String>,
        channel: UpdateChannel,
    },
}

/// Result of the in-place migration path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub legacy_biometric: LegacyKeyAction,
    pub channel: ChannelRepair,
}

impl MigrationReport {
    /// Whether the migration changed nothing.
    pub fn is_noop(&self) -> bool {
        self.legacy_biometric == LegacyKeyAction::Absent
            && matches!(self.channel, ChannelRepair::Valid(_))
    }
}

/// Result of [`load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub import: ImportOutcome,
    /// `None` when the import path was taken.
    pub migration: Option<MigrationReport>,
}

/// Reconciles `config`'s stores with the current schema.
///
/// # Errors
///
/// The import path never fails.  The in-place path returns
/// [`ConfigError::Store`] when a backend fails.
pub fn load(
    config: &Config,
    previous_package: Option<&str>,
    source: &dyn ContentSource,
) -> Result<LoadReport, ConfigError> {
    if let Some(previous) = previous_package {
        if config.prefs().is_empty()? {
            let import = import_previous(config, previous, source);
            return Ok(LoadReport {
                import,
                migration: None,
            });
        }
        debug!(previous, "preference file not empty; import skipped");
    }

    let migration = migrate_in_place(config)?;
    if migration.is_noop() {
        debug!("stored configuration already current");
    }
    Ok(LoadReport {
        import: ImportOutcome::Skipped,
        migration: Some(migration),
    })
}

fn import_previous(config: &Config, previous: &str, source: &dyn ContentSource) -> ImportOutcome {
    let copied = source
        .open(previous)
        .and_then(|mut reader| config.prefs().replace_with(&mut reader));
    match copied {
        Ok(bytes) => {
            info!(previous, bytes, "imported preferences from previous installation");
            ImportOutcome::Imported { bytes }
        }
        Err(e) => {
            warn!(previous, error = %e, "preference import failed; continuing with defaults");
            ImportOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn migrate_in_place(config: &Config) -> Result<MigrationReport, ConfigError> {
    let prefs = config.prefs();
    let mut edits = Vec::new();

    // Legacy biometric flag.
    let legacy_biometric = if prefs.contains(LEGACY_SU_FINGERPRINT)? {
        let enabled = prefs.get_bool(LEGACY_SU_FINGERPRINT, false)?;
        edits.push(Edit::Remove(LEGACY_SU_FINGERPRINT.to_string()));
        if enabled {
            config.su_auth.set(true)?;
            info!(key = Key::SuBiometric.as_str(), "legacy biometric flag promoted");
            LegacyKeyAction::Promoted
        } else {
            info!("legacy biometric flag dropped");
            LegacyKeyAction::Dropped
        }
    } else {
        LegacyKeyAction::Absent
    };

    // Update channel range check.  Parsed the same way as the channel
    // delegate reads it, surrounding whitespace included.
    let key = Key::UpdateChannel.as_str();
    let stored = prefs.string(key)?;
    let valid = stored
        .as_deref()
        .and_then(|text| text.trim().parse::<i32>().ok())
        .and_then(|raw| UpdateChannel::from_raw(raw).ok());
    let channel = match valid {
        Some(channel) => ChannelRepair::Valid(channel),
        None => {
            let channel = config.variant().default_channel();
            edits.push(Edit::Put(
                key.to_string(),
                ScalarValue::Str(channel.raw().to_string()),
            ));
            warn!(previous = ?stored, ?channel, "update channel repaired");
            ChannelRepair::Repaired {
                previous: stored,
                channel,
            }
        }
    };

    if !edits.is_empty() {
        prefs.apply(&edits)?;
    }

    Ok(MigrationReport {
        legacy_biometric,
        channel,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::Environment;
    use crate::infrastructure::prefs_file::PrefsFile;
    use crate::infrastructure::settings_db::SettingsDb;
    use prefstack_core::BuildVariant;
    use std::io::{self, Read};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct StaticSource(&'static [u8]);

    impl ContentSource for StaticSource {
        fn open(&self, _identifier: &str) -> io::Result<Box<dyn Read + Send>> {
            Ok(Box::new(self.0))
        }
    }

    struct Unreachable;

    impl ContentSource for Unreachable {
        fn open(&self, identifier: &str) -> io::Result<Box<dyn Read + Send>> {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{identifier} not exported"),
            ))
        }
    }

    fn config(variant: BuildVariant) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Arc::new(PrefsFile::open(dir.path(), "com.example.app"));
        let settings = Arc::new(SettingsDb::in_memory().unwrap());
        let env = Environment::new(variant).with_device_secure(|| true);
        (dir, Config::new(prefs, settings, env))
    }

    #[test]
    fn test_empty_store_without_previous_package_migrates_in_place() {
        // Arrange
        let (_dir, cfg) = config(BuildVariant::Release);

        // Act
        let report = load(&cfg, None, &Unreachable).unwrap();

        // Assert
        assert_eq!(report.import, ImportOutcome::Skipped);
        let migration = report.migration.unwrap();
        assert_eq!(migration.legacy_biometric, LegacyKeyAction::Absent);
        assert_eq!(
            migration.channel,
            ChannelRepair::Repaired {
                previous: None,
                channel: UpdateChannel::Default
            }
        );
        assert_eq!(cfg.prefs().string("update_channel").unwrap().as_deref(), Some("-1"));
    }

    #[test]
    fn test_import_copies_blob() {
        let (_dir, cfg) = config(BuildVariant::Release);
        let blob: &'static [u8] = b"locale = \"it\"\n";

        let report = load(&cfg, Some("com.example.old"), &StaticSource(blob)).unwrap();

        assert_eq!(report.import, ImportOutcome::Imported { bytes: blob.len() as u64 });
        assert_eq!(report.migration, None);
        assert_eq!(std::fs::read(cfg.prefs().path()).unwrap(), blob);
    }

    #[test]
    fn test_failed_import_is_swallowed() {
        let (_dir, cfg) = config(BuildVariant::Release);

        let report = load(&cfg, Some("com.example.old"), &Unreachable).unwrap();

        assert!(matches!(report.import, ImportOutcome::Failed { .. }));
        assert!(cfg.prefs().is_empty().unwrap());
    }

    #[test]
    fn test_import_of_non_toml_blob_fails_and_next_load_succeeds() {
        // Arrange
        let (_dir, cfg) = config(BuildVariant::Release);
        let blob: &'static [u8] =
            b"<?xml version='1.0'?><map><boolean name=\"doh\" value=\"true\" /></map>";

        // Act
        let first = load(&cfg, Some("com.example.old"), &StaticSource(blob)).unwrap();
        let second = load(&cfg, None, &Unreachable);

        // Assert
        assert!(matches!(first.import, ImportOutcome::Failed { .. }));
        assert!(!cfg.doh.get().unwrap());
        let migration = second.unwrap().migration.unwrap();
        assert_eq!(migration.legacy_biometric, LegacyKeyAction::Absent);
        assert_eq!(cfg.prefs().keys().unwrap(), vec!["update_channel"]);
    }

    #[test]
    fn test_padded_channel_is_accepted() {
        let (_dir, cfg) = config(BuildVariant::Release);
        cfg.prefs().put_string("update_channel", " 1 ").unwrap();

        let report = load(&cfg, None, &Unreachable).unwrap();

        assert_eq!(
            report.migration.unwrap().channel,
            ChannelRepair::Valid(UpdateChannel::Beta)
        );
    }

    #[test]
    fn test_non_empty_store_ignores_previous_package() {
        // Arrange
        let (_dir, cfg) = config(BuildVariant::Release);
        cfg.prefs().put_string("update_channel", "0").unwrap();

        // Act
        let report = load(&cfg, Some("com.example.old"), &StaticSource(b"doh = true\n")).unwrap();

        // Assert
        assert_eq!(report.import, ImportOutcome::Skipped);
        assert_eq!(
            report.migration.unwrap().channel,
            ChannelRepair::Valid(UpdateChannel::Stable)
        );
        assert!(!cfg.prefs().contains("doh").unwrap());
    }

    #[test]
    fn test_non_numeric_channel_is_repaired_to_debug_default() {
        let (_dir, cfg) = config(BuildVariant::Debug);
        cfg.prefs().put_string("update_channel", "beta").unwrap();

        let report = load(&cfg, None, &Unreachable).unwrap();

        assert_eq!(
            report.migration.unwrap().channel,
            ChannelRepair::Repaired {
                previous: Some("beta".to_string()),
                channel: UpdateChannel::Debug
            }
        );
        assert_eq!(cfg.update_channel.get().unwrap(), UpdateChannel::Debug);
    }

    #[test]
    fn test_legacy_flag_promotes_and_is_removed_with_channel_in_one_batch() {
        // Arrange
        let (_dir, cfg) = config(BuildVariant::Canary);
        cfg.prefs().put_bool(LEGACY_SU_FINGERPRINT, true).unwrap();
        cfg.prefs().put_string("update_channel", "-7").unwrap();

        // Act
        let report = load(&cfg, None, &Unreachable).unwrap().migration.unwrap();

        // Assert
        assert_eq!(report.legacy_biometric, LegacyKeyAction::Promoted);
        assert!(cfg.su_auth.get().unwrap());
        assert_eq!(cfg.prefs().keys().unwrap(), vec!["update_channel"]);
        assert_eq!(cfg.update_channel.get().unwrap(), UpdateChannel::Canary);
    }

    #[test]
    fn test_second_run_is_noop() {
        let (_dir, cfg) = config(BuildVariant::Release);
        cfg.prefs().put_bool(LEGACY_SU_FINGERPRINT, false).unwrap();

        let first = load(&cfg, None, &Unreachable).unwrap().migration.unwrap();
        let second = load(&cfg, None, &Unreachable).unwrap().migration.unwrap();

        assert!(!first.is_noop());
        assert!(second.is_noop());
    }
}
