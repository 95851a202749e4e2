//! Project directory discovery and layout.
//!
//! ```text
//! .benchtrack/
//!   config.toml     project config (storage, export, optional schema)
//!   tracking.json   persisted snapshot (name set by `storage.file`)
//!   lock            advisory lock held by mutating commands
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{CONFIG_FILE, DEFAULT_CONFIG_TOML, ProjectConfig, load_project_config};
use crate::error::TrackError;
use crate::lock::StoreLock;
use crate::matrix::build;
use crate::schema::Schema;
use crate::storage::{FileStorage, Persistence, StorageError};
use crate::store::{LoadReport, Store};

pub const PROJECT_DIR: &str = ".benchtrack";
pub const LOCK_FILE: &str = "lock";

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
}

impl Project {
    /// Find the nearest `.benchtrack/` at or above `start` and load its config.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::NotInitialized`] when no project directory exists
    /// up to the filesystem root, or [`TrackError::Config`] when its config
    /// cannot be loaded.
    pub fn discover(start: &Path) -> Result<Self, TrackError> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Self::open(current);
            }
            if !current.pop() {
                return Err(TrackError::NotInitialized {
                    path: start.join(PROJECT_DIR),
                });
            }
        }
    }

    /// Load the project rooted at `root` without searching parents.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Config`] when the config cannot be loaded.
    pub fn open(root: PathBuf) -> Result<Self, TrackError> {
        let config = load_project_config(&root.join(PROJECT_DIR))?;
        Ok(Self { root, config })
    }

    /// Create `.benchtrack/` under `root` with a default config (kept when one
    /// already exists) and a fresh snapshot for the configured schema.
    ///
    /// Callers decide whether re-initializing an existing project is allowed;
    /// an existing snapshot is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Storage`] when the directory or files cannot be
    /// written, and config or schema errors from an existing config.
    pub fn init(root: &Path) -> Result<Self, TrackError> {
        let dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.clone(),
            source,
        })?;

        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG_TOML).map_err(|source| {
                StorageError::Write {
                    path: config_path.clone(),
                    source,
                }
            })?;
        }

        let project = Self::open(root.to_path_buf())?;
        let schema = project.schema()?;
        let mut storage = project.storage();
        storage.save(&serde_json::to_vec(&build(&schema)).map_err(StorageError::from)?)?;

        info!(
            dir = %dir.display(),
            boards = schema.boards().len(),
            cells = schema.cell_count(),
            "initialized tracking sheet"
        );
        Ok(project)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns [`TrackError::Schema`] for an invalid schema override.
    pub fn schema(&self) -> Result<Schema, TrackError> {
        Ok(self.config.schema()?)
    }

    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.dir().join(&self.config.storage.file))
    }

    /// Default directory for exported snapshots, relative to the project root.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.root.join(&self.config.export.dir)
    }

    /// Take the exclusive project lock with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Lock`] on timeout or I/O failure.
    pub fn lock(&self) -> Result<StoreLock, TrackError> {
        Ok(StoreLock::acquire(
            &self.dir().join(LOCK_FILE),
            self.config.storage.lock_timeout(),
        )?)
    }

    /// Open the store over this project's snapshot.
    ///
    /// # Errors
    ///
    /// Returns schema errors from the config or storage read errors; see
    /// [`Store::open`].
    pub fn open_store(&self) -> Result<(Store<FileStorage>, LoadReport), TrackError> {
        Store::open(self.schema()?, self.storage())
    }
}
