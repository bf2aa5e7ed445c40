// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

/// Persistence of the ledger state
pub mod storage;

pub use storage::Storage;

/// Module for publicly usable implementations of the traits
pub mod implementations {
    pub use super::storage::{file_storage::FileStorage, memory_storage::MemoryStorage};
}
