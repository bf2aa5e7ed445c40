// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! In-memory implementation of the storage trait
//!
//! This module provides a non-persisting adapter for the [`Storage`] trait
use std::sync::Arc;

use anyhow::Result;
use async_lock::RwLock;
use async_trait::async_trait;

use super::Storage;
use crate::state::LedgerState;

/// In memory, ephemeral, storage for a [`Ledger`](crate::Ledger) instance
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    /// The latest saved snapshot
    inner: Arc<RwLock<Option<LedgerState>>>,
}

impl MemoryStorage {
    /// Create an empty storage
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save(&self, state: &LedgerState) -> Result<()> {
        *self.inner.write().await = Some(state.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<LedgerState>> {
        Ok(self.inner.read().await.clone())
    }
}
