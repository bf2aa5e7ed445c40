// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Types and Traits for the `votechain` ledger
//!
//! Everything a client of the ledger can observe lives here: records, identifiers, the error
//! taxonomy, notifications, transactions and receipts.

pub mod constants;
pub mod data;
pub mod error;
pub mod event;
/// Config-file form of [`LedgerConfig`]
pub mod ledger_config_file;
pub mod logging;
pub mod traits;
pub mod transaction;

use std::num::NonZeroUsize;

/// Holds configuration for a `Ledger`
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LedgerConfig {
    /// Capacity of the live notification channel. The oldest notification is dropped once a slow
    /// subscriber lets the channel fill up.
    pub event_channel_size: NonZeroUsize,
    /// Number of committed notifications retained in the ledger history, `None` keeps all of them
    pub event_history_limit: Option<NonZeroUsize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        ledger_config_file::LedgerConfigFile::default().into()
    }
}
