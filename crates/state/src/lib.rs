//! StarWatch cursor persistence adapter.
//!
//! Implements [`tracker::CursorPersistence`] over a single JSON document
//! mapping each repository's full name to the GUID of its last processed
//! release:
//!
//! ```json
//! {
//!   "tokio-rs/tokio": "tag:github.com,2008:Repository/88591471/tokio-1.38.0"
//! }
//! ```
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. It only
//! moves a [`tracker::CursorStore`] between memory and disk.
//!
//! ## Durability
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! document, so an interrupted write leaves the previous document intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

use tracker::{CursorPersistence, CursorStore, PersistenceError};

/// Default location of the cursor document, relative to the working directory.
pub const DEFAULT_CURSOR_PATH: &str = "latest.json";

/// Errors raised by [`JsonFileCursorStore`].
#[derive(Debug, Error)]
pub enum StateError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a cursor document: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to encode cursors: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<StateError> for PersistenceError {
    fn from(error: StateError) -> Self {
        match error {
            StateError::Decode { .. } => PersistenceError::Malformed(error.to_string()),
            StateError::Read { .. } | StateError::Write { .. } | StateError::Encode(_) => {
                PersistenceError::Io(error.to_string())
            }
        }
    }
}

/// Cursor document stored as pretty-printed JSON on the local filesystem.
#[derive(Debug, Clone)]
pub struct JsonFileCursorStore {
    path: PathBuf,
}

impl JsonFileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cursor document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CursorStore, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cursor document yet");
                return Ok(CursorStore::new());
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StateError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    async fn store(&self, cursors: &CursorStore) -> Result<(), StateError> {
        let mut document = serde_json::to_vec_pretty(cursors).map_err(StateError::Encode)?;
        document.push(b'\n');

        let staging = self.staging_path();
        let write_error = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&staging, &document)
            .await
            .map_err(write_error)?;
        if let Err(source) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(write_error(source));
        }

        debug!(path = %self.path.display(), bytes = document.len(), "wrote cursor document");
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_CURSOR_PATH.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CursorPersistence for JsonFileCursorStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> Result<CursorStore, PersistenceError> {
        Ok(self.load().await?)
    }

    #[instrument(skip_all, fields(path = %self.path.display(), cursors = cursors.len()))]
    async fn write(&self, cursors: &CursorStore) -> Result<(), PersistenceError> {
        Ok(self.store(cursors).await?)
    }
}
