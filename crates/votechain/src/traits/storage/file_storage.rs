// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! File-backed implementation of the storage trait
//!
//! The snapshot is `bincode`-encoded and written to a sibling temporary file first, then renamed
//! over the previous snapshot, so a crash mid-write leaves the old snapshot intact.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use async_lock::Mutex;
use async_trait::async_trait;
use tracing::debug;

use super::Storage;
use crate::state::LedgerState;

/// Persistent storage in a single file
#[derive(Clone, Debug)]
pub struct FileStorage {
    /// Where the snapshot lives
    path: Arc<PathBuf>,
    /// Serializes writers so two saves never race on the temporary file
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Use the snapshot file at `path`; it is created on the first save
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The temporary file a save writes to before renaming
    fn temporary_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save(&self, state: &LedgerState) -> Result<()> {
        let bytes = bincode::serialize(state).context("Failed to encode ledger snapshot")?;
        let temporary = self.temporary_path();

        let _guard = self.write_lock.lock().await;
        tokio::fs::write(&temporary, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", temporary.display()))?;
        tokio::fs::rename(&temporary, self.path.as_ref())
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), height = state.height(), "saved ledger snapshot");
        Ok(())
    }

    async fn load(&self) -> Result<Option<LedgerState>> {
        let bytes = match tokio::fs::read(self.path.as_ref()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        let state = bincode::deserialize(&bytes)
            .with_context(|| format!("Corrupt ledger snapshot in {}", self.path.display()))?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("ledger.bin"));
        assert_eq!(storage.load().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn saved_state_survives_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        let mut state = LedgerState::default();
        let _ = state.begin_block(1_700_000_000);

        FileStorage::new(&path).save(&state).await.unwrap();
        assert!(!dir.path().join("ledger.bin.tmp").exists());

        let loaded = FileStorage::new(&path).load().await.unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn garbage_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.bin");
        std::fs::write(&path, b"not a snapshot").unwrap();
        assert!(FileStorage::new(&path).load().await.is_err());
    }
}
