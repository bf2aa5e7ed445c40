// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Notifications that the ledger emits
//!
//! Notifications are staged while a transaction runs and only become visible, as [`Event`]s,
//! once the transaction commits. A rejected transaction emits nothing.

use serde::{Deserialize, Serialize};

use crate::data::{Address, Candidate, CandidateId, ElectionId, Timestamp};

/// A committed notification
///
/// This includes some metadata, such as the ledger height and timestamp the notification was
/// committed at and the contract that emitted it, as well as an inner [`EventType`] describing
/// the notification proper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Global position of this notification, starting at zero
    pub sequence: u64,
    /// Height of the block that committed the notification
    pub height: u64,
    /// Ledger time of the block that committed the notification
    pub timestamp: Timestamp,
    /// Address of the contract that emitted the notification
    pub emitter: Address,
    /// The underlying notification
    pub event: EventType,
}

/// The type and contents of a notification
///
/// This enum does not include metadata shared among all variants, such as the sequence number
/// and emitter, and is thus always delivered wrapped in an [`Event`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// A voting right was issued
    VoterRegistered {
        /// The election the right is valid for
        election: ElectionId,
        /// The holder of the right
        voter: Address,
    },
    /// A voting right was burned by the ballot
    VotingTokenUsed {
        /// The election the right was valid for
        election: ElectionId,
        /// The former holder of the right
        voter: Address,
    },
    /// A candidate was created
    CandidateAdded {
        /// The candidate as created
        candidate: Candidate,
    },
    /// An election was created
    ElectionCreated {
        /// The new election id
        id: ElectionId,
        /// Display name
        name: String,
        /// Free-form description
        description: String,
        /// Start of the voting window
        start_time: Timestamp,
        /// End of the voting window
        end_time: Timestamp,
        /// The whitelist as given
        whitelist: Vec<Address>,
    },
    /// A candidate was registered into an election
    CandidateRegistered {
        /// The election
        election: ElectionId,
        /// The registered candidate
        candidate: CandidateId,
    },
    /// A vote was accepted and tallied
    VoteCasted {
        /// The election
        election: ElectionId,
        /// The chosen candidate
        candidate: CandidateId,
        /// The voter
        voter: Address,
    },
    /// The ballot issued voting rights through the registry
    VotersAdded {
        /// The election
        election: ElectionId,
        /// The voters, as given
        voters: Vec<Address>,
    },
    /// Ownership of a contract changed hands
    OwnershipTransferred {
        /// The former owner
        previous: Address,
        /// The new owner
        new: Address,
    },
    /// The registry granted a ballot the right to burn voting rights
    BallotContractSet {
        /// The ballot
        ballot: Address,
    },
    /// The registry withdrew the burn capability
    BallotContractRevoked,
    /// A contract was deployed
    ContractDeployed {
        /// The address it was deployed at
        address: Address,
        /// What was deployed
        kind: crate::data::ContractKind,
    },
}
