// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Error type for the [`Ledger`](crate::Ledger)
//!
//! Protocol rejections are carried unchanged in [`LedgerError::Protocol`]; the other variants
//! describe failures of the ledger itself rather than of an operation.

use thiserror::Error;
use votechain_types::{data::Timestamp, error::ProtocolError, transaction::Outcome};

/// Error type for the ledger
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// The operation was rejected by the protocol
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A block tried to move ledger time backwards
    #[error("Block timestamp {proposed} is before the latest ledger time {latest}")]
    TimestampRegression {
        /// Timestamp of the latest committed block
        latest: Timestamp,
        /// Timestamp of the rejected block
        proposed: Timestamp,
    },

    /// The storage backend failed to persist or load the ledger state
    #[error("Storage error: {0}")]
    Storage(String),

    /// A committed transaction produced an outcome its caller did not ask for
    #[error("Unexpected outcome {0:?}")]
    UnexpectedOutcome(Outcome),
}

impl LedgerError {
    /// The protocol error behind this failure, if it is one
    #[must_use]
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for LedgerError {
    fn from(e: anyhow::Error) -> Self {
        Self::Storage(format!("{e:#}"))
    }
}
