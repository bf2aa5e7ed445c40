// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Testing infrastructure for the votechain ledger

#![cfg_attr(
    not(any(test, debug_assertions)),
    deprecated = "suspicious usage of testing implementations in non-test/non-debug build"
)]

/// Helpers for accounts and elections
pub mod helpers;

/// Storage that can be told to fail
pub mod test_storage;

/// A ledger with a wired deployment and a manual clock
pub mod test_system;

pub use test_storage::TestStorage;
pub use test_system::TestSystem;
