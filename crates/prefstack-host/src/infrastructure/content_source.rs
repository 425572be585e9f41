//! External content source for the fresh-install import.
//!
//! A previous installation is addressed only by its package identifier.  The
//! source hands back a byte stream of that installation's preference file and
//! nothing else; how the bytes are found is up to the implementation.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::infrastructure::prefs_file::prefs_file_path;

/// Read-only access to a previous installation's preference blob.
pub trait ContentSource: Send + Sync {
    /// Opens the preference blob of the installation named `identifier`.
    fn open(&self, identifier: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Content source over a directory holding one data directory per package,
/// laid out the same way this host lays out its own.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    root: PathBuf,
}

impl DirectoryContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, identifier: &str) -> io::Result<PathBuf> {
        let valid = !identifier.is_empty()
            && identifier != "."
            && !identifier.contains("..")
            && !identifier.contains(&['/', '\\'][..]);
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid package identifier `{identifier}`"),
            ));
        }
        Ok(prefs_file_path(&self.root.join(identifier), identifier))
    }
}

impl ContentSource for DirectoryContentSource {
    fn open(&self, identifier: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = self.resolve(identifier)?;
        Ok(Box::new(File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_open_reads_previous_install_file() {
        // Arrange
        let root = tempfile::tempdir().unwrap();
        let path = prefs_file_path(&root.path().join("com.example.old"), "com.example.old");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "doh = true\n").unwrap();
        let source = DirectoryContentSource::new(root.path());

        // Act
        let mut text = String::new();
        source
            .open("com.example.old")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();

        // Assert
        assert_eq!(text, "doh = true\n");
    }

    #[test]
    fn test_missing_install_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let source = DirectoryContentSource::new(root.path());

        let err = source.open("com.example.gone").err().unwrap();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_path_like_identifiers_are_rejected() {
        let source = DirectoryContentSource::new("/nonexistent");

        for id in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            let err = source.open(id).err().unwrap();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{id:?}");
        }
    }
}
