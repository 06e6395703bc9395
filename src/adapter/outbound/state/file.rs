//! JSON state file.
//!
//! The file holds the cluster credential and join commands in plain text,
//! so it is written with owner-only permissions. Writes go to a sibling
//! temporary file first and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::state::{StackState, STATE_VERSION};
use crate::error::{Result, StateError};
use crate::port::outbound::state::StateStore;

/// [`StateStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> StateError {
        StateError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<StackState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting empty");
                return Ok(StackState::default());
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        let state: StackState = serde_json::from_slice(&bytes).map_err(StateError::Corrupt)?;
        if state.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                expected: STATE_VERSION,
            }
            .into());
        }
        Ok(state)
    }

    async fn save(&self, state: &StackState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| self.write_error(e))?;
        restrict_permissions(&staging).await.map_err(|e| self.write_error(e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;

        debug!(
            path = %self.path.display(),
            operations = state.operations.len(),
            "state saved"
        );
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
