// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Error type for `votechain`
//!
//! This module provides [`ProtocolError`], which is an enum representing every way an operation
//! on the ledger can be rejected. The [`Display`](std::fmt::Display) form of each variant is the
//! wire-visible failure message; [`ProtocolError::kind`] groups the variants into the four
//! [`ErrorKind`]s.
//!
//! A rejected operation never leaves partial state behind.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{Address, ContractKind};

/// Coarse classification of a [`ProtocolError`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller lacks the required ownership or role
    Authorization,
    /// Reference to an unknown election, candidate or contract
    NotFound,
    /// Malformed input at creation time
    Validation,
    /// Operation not permitted in the current temporal or eligibility state
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Authorization => "AuthorizationError",
            Self::NotFound => "NotFoundError",
            Self::Validation => "ValidationError",
            Self::State => "StateError",
        };
        f.write_str(name)
    }
}

/// Error type for `votechain`
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ProtocolError {
    /// An owner-gated operation was called by someone other than the owner
    #[error("Caller is not the owner")]
    NotOwner {
        /// The rejected caller
        caller: Address,
    },

    /// A burn was attempted by someone other than the configured ballot
    #[error("Not authorized")]
    NotAuthorized,

    /// The election id was never assigned
    #[error("No such election")]
    NoSuchElection,

    /// The candidate id was never assigned
    #[error("Candidate does not exist")]
    CandidateDoesNotExist,

    /// The address does not host a contract of the expected kind
    #[error("No such contract")]
    NoSuchContract {
        /// The address that was looked up
        address: Address,
        /// The kind of contract the caller expected, `None` when any kind would do
        expected: Option<ContractKind>,
    },

    /// Election window with `end <= start`
    #[error("End must be after start")]
    EndNotAfterStart,

    /// Election window that has already ended
    #[error("End must be in future")]
    EndNotInFuture,

    /// Ownership transfer to the zero address
    #[error("New owner is the zero address")]
    ZeroOwner,

    /// Vote outside the election window
    #[error("Not active")]
    NotActive,

    /// Vote for a candidate that is not registered into the election
    #[error("Candidate not in election")]
    CandidateNotInElection,

    /// Vote from a caller with no voting right
    #[error("No voting token")]
    NoVotingToken,

    /// Burn of a voting right that does not exist
    #[error("No voting token available")]
    NoVotingTokenAvailable,

    /// A voting right count would exceed `u64::MAX`
    #[error("Voting right overflow")]
    VotingRightOverflow,

    /// A tally would exceed `u64::MAX`
    #[error("Tally overflow")]
    TallyOverflow,

    /// An identifier counter is exhausted
    #[error("Identifier space exhausted")]
    IdsExhausted,
}

impl ProtocolError {
    /// The [`ErrorKind`] this error belongs to
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner { .. } | Self::NotAuthorized => ErrorKind::Authorization,
            Self::NoSuchElection | Self::CandidateDoesNotExist | Self::NoSuchContract { .. } => {
                ErrorKind::NotFound
            }
            Self::EndNotAfterStart | Self::EndNotInFuture | Self::ZeroOwner => ErrorKind::Validation,
            Self::NotActive
            | Self::CandidateNotInElection
            | Self::NoVotingToken
            | Self::NoVotingTokenAvailable
            | Self::VotingRightOverflow
            | Self::TallyOverflow
            | Self::IdsExhausted => ErrorKind::State,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn messages_are_the_wire_strings() {
        assert_eq!(ProtocolError::NotAuthorized.to_string(), "Not authorized");
        assert_eq!(ProtocolError::NoSuchElection.to_string(), "No such election");
        assert_eq!(
            ProtocolError::EndNotAfterStart.to_string(),
            "End must be after start"
        );
        assert_eq!(ProtocolError::NotActive.to_string(), "Not active");
        assert_eq!(
            ProtocolError::NoVotingTokenAvailable.to_string(),
            "No voting token available"
        );
    }

    #[test]
    fn ownership_failures_are_authorization_errors() {
        let err = ProtocolError::NotOwner {
            caller: Address::zero(),
        };
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(ProtocolError::NotAuthorized.kind(), ErrorKind::Authorization);
        assert_eq!(ProtocolError::NoVotingToken.kind(), ErrorKind::State);
        assert_eq!(ProtocolError::EndNotInFuture.kind(), ErrorKind::Validation);
        assert_eq!(ProtocolError::CandidateDoesNotExist.kind(), ErrorKind::NotFound);
    }
}
