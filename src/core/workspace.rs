//! Workspace discovery and store setup
//!
//! A workspace is any directory holding an `.awb/` directory. Commands find
//! it by walking up from the current directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::backend::{Backend, BackendError, FileBackend, SqliteBackend};
use crate::core::config::{BackendKind, Config};
use crate::core::migration;
use crate::core::store::Store;

/// Name of the workspace marker directory
pub const AWB_DIR: &str = ".awb";

/// A directory containing `.awb/`
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .awb/)
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current = std::env::current_dir()?;
        Self::discover_from(&current)
    }

    /// Find the workspace by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start.canonicalize()?;

        loop {
            if current.join(AWB_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open the workspace at exactly `path`
    pub fn open(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize()?;
        if !root.join(AWB_DIR).is_dir() {
            return Err(WorkspaceError::NotFound {
                searched_from: path.to_path_buf(),
            });
        }
        Ok(Self { root })
    }

    /// Create `.awb/` with a config file naming `backend`
    pub fn init(path: &Path, backend: BackendKind, force: bool) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(path)?;
        let root = path.canonicalize()?;

        let awb_dir = root.join(AWB_DIR);
        if awb_dir.exists() && !force {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&awb_dir)?;
        std::fs::write(awb_dir.join("config.yaml"), Self::default_config(backend))?;

        Ok(Self { root })
    }

    fn default_config(backend: BackendKind) -> String {
        format!(
            r#"# Agile Workbench workspace configuration

# Storage backend: files (one JSON file per key) or sqlite
backend: {}

# Key namespace shared by every project in this workspace
# namespace: awb

# Default output format (auto, json, yaml, csv, md, id)
# default_format: auto
"#,
            backend
        )
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .awb directory
    pub fn awb_dir(&self) -> PathBuf {
        self.root.join(AWB_DIR)
    }

    /// Load the layered configuration for this workspace
    pub fn config(&self) -> Config {
        Config::load(Some(&self.awb_dir()))
    }

    /// Open the store named by `config` and bring it up to date
    pub fn open_store(&self, config: &Config) -> Result<Store, WorkspaceError> {
        let backend: Box<dyn Backend> = match config.backend() {
            BackendKind::Files => Box::new(FileBackend::open(&self.awb_dir().join("store"))?),
            BackendKind::Sqlite => Box::new(SqliteBackend::open(&self.awb_dir().join("store.db"))?),
        };
        tracing::debug!(backend = %config.backend(), namespace = config.namespace(), "opened store");

        let mut store = Store::with_namespace(backend, config.namespace());
        let report = migration::run(&mut store);
        if report.changed() {
            tracing::info!(?report, "store layout upgraded");
        }
        Ok(store)
    }
}

/// Errors that can occur locating or opening a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an awb workspace (searched from {searched_from:?}). Run 'awb init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("awb workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}
