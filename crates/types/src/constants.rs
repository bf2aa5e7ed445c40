// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! configurable constants for votechain

/// Default channel size for ledger -> subscriber notifications
pub const EVENT_CHANNEL_SIZE: usize = 100_000;

/// Default number of committed notifications kept in the ledger history
pub const EVENT_HISTORY_LIMIT: usize = 1_000_000;

/// First identifier handed out by the candidate and election counters
pub const FIRST_ID: u64 = 1;

/// Domain separator mixed into contract address derivation
pub const CONTRACT_ADDRESS_DOMAIN: &[u8] = b"votechain contract address";
