//! File-backed local preference store.
//!
//! The backing file is a flat TOML table at
//! `<data_dir>/shared_prefs/<package>_preferences.toml`:
//!
//! ```toml
//! asked_home = true
//! update_channel = "1"
//! su_request_timeout = "10"
//! theme_ordinal = 2
//! ```
//!
//! Every read parses the file afresh and every write replaces it atomically
//! (per-process temporary sibling, then rename), so two handles on the same path, even in
//! different processes, never disagree about a committed value.  A missing
//! file is an empty store.  A file that exists but is not valid TOML is a
//! [`StoreError::Corrupt`] on every operation.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use prefstack_core::{ScalarValue, Store, StoreError};
use toml::{Table, Value};
use tracing::{debug, warn};

/// One change in an [`PrefsFile::apply`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Put(String, ScalarValue),
    Remove(String),
}

/// Path of the preference file for `package` under its data directory.
pub fn prefs_file_path(data_dir: &Path, package: &str) -> PathBuf {
    data_dir
        .join("shared_prefs")
        .join(format!("{package}_preferences.toml"))
}

/// Local preference store over one TOML file.
#[derive(Debug)]
pub struct PrefsFile {
    path: PathBuf,
    /// Serializes load-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl PrefsFile {
    /// Store for `package` inside `data_dir`.  Nothing is touched on disk
    /// until the first write.
    pub fn open(data_dir: &Path, package: &str) -> Self {
        Self::at(prefs_file_path(data_dir, package))
    }

    /// Store over an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every key currently stored, in sorted order.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.keys().cloned().collect())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.load()?.is_empty())
    }

    /// The raw string stored under `key`, or `None` when the key is absent or
    /// holds a non-string value.
    pub fn string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(match self.load()?.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        })
    }

    /// Commits `edits` in one atomic file replacement.
    pub fn apply(&self, edits: &[Edit]) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut table = self.load()?;
        for edit in edits {
            match edit {
                Edit::Put(key, value) => {
                    table.insert(key.clone(), to_toml(value));
                }
                Edit::Remove(key) => {
                    table.remove(key);
                }
            }
        }
        self.commit(&table)?;
        debug!(path = %self.path.display(), edits = edits.len(), "batch committed");
        Ok(())
    }

    /// Replaces the backing file with the bytes of `reader`, verbatim.
    ///
    /// The bytes must parse as a TOML table; anything else is rejected with
    /// [`io::ErrorKind::InvalidData`].  On failure the previous file, if any,
    /// is left untouched.
    pub fn replace_with(&self, reader: &mut dyn Read) -> io::Result<u64> {
        let _guard = self.lock();
        self.ensure_parent()?;
        let tmp = self.tmp_path();
        let copied = (|| -> io::Result<u64> {
            let mut file = fs::File::create(&tmp)?;
            let n = io::copy(reader, &mut file)?;
            file.sync_all()?;
            drop(file);
            let text = fs::read_to_string(&tmp)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            toml::from_str::<Table>(&text)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            fs::rename(&tmp, &self.path)?;
            Ok(n)
        })();
        if copied.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        copied
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self) -> Result<Table, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Table::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str::<Table>(&text).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn commit(&self, table: &Table) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let text = toml::to_string(table).map_err(|e| StoreError::Backend {
            backend: "prefs",
            source: Box::new(e),
        })?;
        self.ensure_parent().map_err(io_err)?;
        let tmp = self.tmp_path();
        let written = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written.map_err(io_err)
    }

    fn modify(&self, key: &str, edit: Edit) -> Result<(), StoreError> {
        debug!(key, path = %self.path.display(), "write");
        self.apply(std::slice::from_ref(&edit))
    }

    fn ensure_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
            _ => Ok(()),
        }
    }

    /// Per-process sibling, so concurrent writers never share a temp file.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn to_toml(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Bool(v) => Value::Boolean(*v),
        ScalarValue::Int(v) => Value::Integer(i64::from(*v)),
        ScalarValue::Str(v) => Value::String(v.clone()),
    }
}

impl Store for PrefsFile {
    fn name(&self) -> &'static str {
        "prefs"
    }

    fn get_string(&self, key: &str, default: &str) -> Result<String, StoreError> {
        Ok(match self.load()?.get(key) {
            Some(Value::String(s)) => s.clone(),
            None => default.to_string(),
            Some(other) => {
                warn!(key, found = other.type_str(), "expected a string; using default");
                default.to_string()
            }
        })
    }

    fn get_int(&self, key: &str, default: i32) -> Result<i32, StoreError> {
        Ok(match self.load()?.get(key) {
            Some(Value::Integer(n)) => i32::try_from(*n).unwrap_or_else(|_| {
                warn!(key, value = *n, "integer out of range; using default");
                default
            }),
            None => default,
            Some(other) => {
                warn!(key, found = other.type_str(), "expected an integer; using default");
                default
            }
        })
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool, StoreError> {
        Ok(match self.load()?.get(key) {
            Some(Value::Boolean(b)) => *b,
            None => default,
            Some(other) => {
                warn!(key, found = other.type_str(), "expected a boolean; using default");
                default
            }
        })
    }

    fn put_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(key, Edit::Put(key.to_string(), ScalarValue::Str(value.to_string())))
    }

    fn put_int(&self, key: &str, value: i32) -> Result<(), StoreError> {
        self.modify(key, Edit::Put(key.to_string(), ScalarValue::Int(value)))
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<(), StoreError> {
        self.modify(key, Edit::Put(key.to_string(), ScalarValue::Bool(value)))
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.load()?.contains_key(key))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(key, Edit::Remove(key.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, PrefsFile) {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsFile::open(dir.path(), "com.example.app");
        (dir, store)
    }

    #[test]
    fn test_path_layout() {
        let path = prefs_file_path(Path::new("/data/com.example.app"), "com.example.app");
        assert_eq!(
            path,
            PathBuf::from("/data/com.example.app/shared_prefs/com.example.app_preferences.toml")
        );
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (_dir, store) = temp_store();

        assert!(store.is_empty().unwrap());
        assert_eq!(store.get_int("theme_ordinal", 7).unwrap(), 7);
        assert!(!store.path().exists(), "reads must not create the file");
    }

    #[test]
    fn test_put_then_get_each_type() {
        // Arrange
        let (_dir, store) = temp_store();

        // Act
        store.put_bool("doh", true).unwrap();
        store.put_int("theme_ordinal", -3).unwrap();
        store.put_string("locale", "pt-BR").unwrap();

        // Assert
        assert!(store.get_bool("doh", false).unwrap());
        assert_eq!(store.get_int("theme_ordinal", 0).unwrap(), -3);
        assert_eq!(store.get_string("locale", "").unwrap(), "pt-BR");
        assert_eq!(store.keys().unwrap(), vec!["doh", "locale", "theme_ordinal"]);
    }

    #[test]
    fn test_second_handle_sees_committed_write() {
        let (dir, store) = temp_store();
        store.put_string("update_channel", "1").unwrap();

        let other = PrefsFile::open(dir.path(), "com.example.app");

        assert_eq!(other.get_string("update_channel", "-1").unwrap(), "1");
    }

    #[test]
    fn test_wrong_type_reads_default() {
        let (_dir, store) = temp_store();
        store.put_string("doh", "yes").unwrap();

        assert!(!store.get_bool("doh", false).unwrap());
        assert_eq!(store.get_int("doh", 5).unwrap(), 5);
    }

    #[test]
    fn test_integer_beyond_i32_reads_default() {
        // Arrange
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "theme_ordinal = 9999999999\n").unwrap();

        // Act / Assert
        assert_eq!(store.get_int("theme_ordinal", 0).unwrap(), 0);
    }

    #[test]
    fn test_corrupt_file_is_store_error() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "this is = = not toml").unwrap();

        assert!(matches!(
            store.get_bool("doh", false),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(store.put_bool("doh", true), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_remove_and_contains() {
        let (_dir, store) = temp_store();
        store.put_bool("su_fingerprint", true).unwrap();
        assert!(store.contains("su_fingerprint").unwrap());

        store.remove("su_fingerprint").unwrap();
        store.remove("never_written").unwrap();

        assert!(!store.contains("su_fingerprint").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_apply_commits_whole_batch() {
        // Arrange
        let (_dir, store) = temp_store();
        store.put_bool("su_fingerprint", true).unwrap();
        store.put_string("update_channel", "99").unwrap();

        // Act
        store
            .apply(&[
                Edit::Remove("su_fingerprint".to_string()),
                Edit::Put("update_channel".to_string(), ScalarValue::Str("-1".to_string())),
            ])
            .unwrap();

        // Assert
        assert_eq!(store.keys().unwrap(), vec!["update_channel"]);
        assert_eq!(store.string("update_channel").unwrap().as_deref(), Some("-1"));
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_string_ignores_non_string_values() {
        let (_dir, store) = temp_store();
        store.put_int("update_channel", 1).unwrap();

        assert_eq!(store.string("update_channel").unwrap(), None);
        assert_eq!(store.string("absent").unwrap(), None);
    }

    #[test]
    fn test_replace_with_copies_bytes_verbatim() {
        // Arrange
        let (_dir, store) = temp_store();
        let blob = b"# previous install\nlocale = \"fr\"\ndoh = true\n";

        // Act
        let n = store.replace_with(&mut &blob[..]).unwrap();

        // Assert
        assert_eq!(n, blob.len() as u64);
        assert_eq!(fs::read(store.path()).unwrap(), blob);
        assert_eq!(store.get_string("locale", "").unwrap(), "fr");
    }

    #[test]
    fn test_replace_with_rejects_non_toml_and_keeps_previous_file() {
        // Arrange
        let (_dir, store) = temp_store();
        store.put_string("locale", "de").unwrap();
        let blob = b"<?xml version='1.0'?><map><boolean name=\"doh\" value=\"true\" /></map>";

        // Act
        let result = store.replace_with(&mut &blob[..]);

        // Assert
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
        assert_eq!(store.get_string("locale", "").unwrap(), "de");
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_tmp_path_is_unique_per_process() {
        let (_dir, store) = temp_store();

        let name = store.tmp_path().file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(
            name,
            format!("com.example.app_preferences.toml.{}.tmp", std::process::id())
        );
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "source went away"))
        }
    }

    #[test]
    fn test_failed_replace_leaves_no_file() {
        let (_dir, store) = temp_store();

        let result = store.replace_with(&mut FailingReader);

        assert!(result.is_err());
        assert!(!store.path().exists());
        assert!(!store.tmp_path().exists());
    }
}
