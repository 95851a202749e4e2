//! Durable storage for the persisted snapshot.
//!
//! A backend holds exactly one snapshot under a fixed key. Saves overwrite
//! the previous snapshot in full.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::warn;

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode tracking table: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StorageReadFailed,
            Self::Write { .. } | Self::Unavailable(_) => ErrorCode::StorageWriteFailed,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
        }
    }
}

/// A single-slot snapshot store.
pub trait Persistence {
    /// Read the stored snapshot, or `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] when the snapshot exists but cannot be read.
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Overwrite the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the snapshot cannot be written.
    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Move an unreadable snapshot out of the way so the next save cannot
    /// destroy it. Returns where it went, if anywhere.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the snapshot cannot be moved.
    fn quarantine(&mut self) -> Result<Option<String>, StorageError>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Snapshot stored as a JSON file, written atomically via a sibling temp
/// file and rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// First free `<file>.corrupt-<stamp>[-N]` next to the snapshot.
    fn quarantine_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let base = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();

        let mut attempt = 1u32;
        loop {
            let mut name = base.clone();
            if attempt == 1 {
                name.push(format!(".corrupt-{stamp}"));
            } else {
                name.push(format!(".corrupt-{stamp}-{attempt}"));
            }
            let target = self.path.with_file_name(name);
            if !target.exists() {
                return target;
            }
            attempt += 1;
        }
    }

    fn write_err(&self, source: io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl Persistence for FileStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        let tmp = self.temp_path();
        let result = (|| -> io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })();

        if let Err(err) = result {
            let _ = fs::remove_file(&tmp);
            return Err(self.write_err(err));
        }
        Ok(())
    }

    fn quarantine(&mut self) -> Result<Option<String>, StorageError> {
        let target = self.quarantine_path();
        match fs::rename(&self.path, &target) {
            Ok(()) => {}
            // Already moved by a concurrent invocation, or never written.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.write_err(err)),
        }
        warn!(
            from = %self.path.display(),
            to = %target.display(),
            "quarantined unreadable tracking snapshot"
        );
        Ok(Some(target.display().to_string()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory backend for tests and embedding. Saves can be made to fail to
/// exercise the non-fatal persistence path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Option<Vec<u8>>,
    quarantined: Vec<Vec<u8>>,
    fail_saves: bool,
    saves: usize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot.
    #[must_use]
    pub fn with_data(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(bytes.into()),
            ..Self::default()
        }
    }

    pub const fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    #[must_use]
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    #[must_use]
    pub fn quarantined(&self) -> &[Vec<u8>] {
        &self.quarantined
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }
}

impl Persistence for MemoryStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.clone())
    }

    fn save(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Unavailable("quota exceeded".to_string()));
        }
        self.data = Some(bytes.to_vec());
        self.saves += 1;
        Ok(())
    }

    fn quarantine(&mut self) -> Result<Option<String>, StorageError> {
        Ok(self.data.take().map(|bytes| {
            self.quarantined.push(bytes);
            format!("memory#{}", self.quarantined.len())
        }))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
