// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Abstract storage type for persisting the ledger state
//!
//! The ledger saves a full snapshot of its [`LedgerState`] after every block and only publishes
//! the block's notifications once the save succeeded.

pub mod file_storage;
pub mod memory_storage;

use anyhow::Result;
use async_trait::async_trait;

use crate::state::LedgerState;

/// Abstraction for storing the ledger state.
#[async_trait]
pub trait Storage: Send + Sync + Clone + 'static {
    /// Replace the stored snapshot with `state`
    async fn save(&self, state: &LedgerState) -> Result<()>;

    /// The most recently saved snapshot, if any
    async fn load(&self) -> Result<Option<LedgerState>>;
}
