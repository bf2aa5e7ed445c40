// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use votechain::{traits::implementations::MemoryStorage, LedgerState, Storage};

/// In-memory storage whose writes can be made to fail
#[derive(Clone, Debug, Default)]
pub struct TestStorage {
    /// The snapshot
    inner: MemoryStorage,
    /// Number of successful saves
    saves: Arc<AtomicU64>,
    /// `should_return_err` is a testing utility to validate negative cases.
    should_return_err: Arc<AtomicBool>,
    /// How long every save takes, in milliseconds
    save_delay_ms: Arc<AtomicU64>,
}

impl TestStorage {
    /// Make every following save fail, or succeed again
    pub fn set_should_return_err(&self, fail: bool) {
        self.should_return_err.store(fail, Ordering::SeqCst);
    }

    /// Make every following save take at least `delay`
    pub fn set_save_delay(&self, delay: Duration) {
        self.save_delay_ms.store(
            u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            Ordering::SeqCst,
        );
    }

    /// Number of successful saves so far
    #[must_use]
    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for TestStorage {
    async fn save(&self, state: &LedgerState) -> Result<()> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.should_return_err.load(Ordering::SeqCst) {
            bail!("Failed to save ledger snapshot to storage");
        }
        self.inner.save(state).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self) -> Result<Option<LedgerState>> {
        self.inner.load().await
    }
}
