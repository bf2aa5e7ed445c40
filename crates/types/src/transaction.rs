// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Transactions, blocks and receipts
//!
//! A [`Transaction`] is a single write operation submitted by `sender`. Transactions are grouped
//! into [`Block`]s that share one timestamp; every transaction produces a [`Receipt`].

use serde::{Deserialize, Serialize};

use crate::{
    data::{Address, CandidateId, ElectionId, Timestamp},
    error::ProtocolError,
    event::Event,
};

/// A write operation, addressed to the contract at `target` where applicable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    /// Deploy a `VoterRegistry` owned by the sender
    DeployVoterRegistry,
    /// Deploy a `CandidateManager` owned by the sender
    DeployCandidateManager,
    /// Deploy an `ElectionManager` owned by the sender
    DeployElectionManager,
    /// Deploy a `Ballot` owned by the sender, wired to the given components
    DeployBallot {
        /// The registry whose rights the ballot burns
        voter_registry: Address,
        /// The candidate source
        candidate_manager: Address,
        /// The election source
        election_manager: Address,
    },
    /// Deploy a `Results` aggregator
    DeployResults {
        /// The ballot holding the tallies
        ballot: Address,
        /// The election source
        election_manager: Address,
        /// The candidate source
        candidate_manager: Address,
    },
    /// Hand ownership of `target` to `new_owner`
    TransferOwnership {
        /// Any owned contract
        target: Address,
        /// The next owner
        new_owner: Address,
    },
    /// Issue one voting right per listed voter
    RegisterVoters {
        /// A `VoterRegistry`
        target: Address,
        /// The election the rights are valid for
        election: ElectionId,
        /// The voters, duplicates accumulate
        voters: Vec<Address>,
    },
    /// Grant `ballot` the right to burn voting rights
    SetBallotContract {
        /// A `VoterRegistry`
        target: Address,
        /// The ballot to trust
        ballot: Address,
    },
    /// Withdraw the burn capability
    RevokeBallotContract {
        /// A `VoterRegistry`
        target: Address,
    },
    /// Burn one voting right of `voter`
    UseVotingToken {
        /// A `VoterRegistry`
        target: Address,
        /// The election
        election: ElectionId,
        /// The holder
        voter: Address,
    },
    /// Create a candidate
    AddCandidate {
        /// A `CandidateManager`
        target: Address,
        /// Display name
        name: String,
        /// Free-form description
        description: String,
        /// Optional pointer to off-ledger metadata
        #[serde(default)]
        metadata_uri: Option<String>,
    },
    /// Create an election
    CreateElection {
        /// An `ElectionManager`
        target: Address,
        /// Display name
        name: String,
        /// Free-form description
        description: String,
        /// Start of the voting window, inclusive
        start_time: Timestamp,
        /// End of the voting window, inclusive
        end_time: Timestamp,
        /// Intended voters
        #[serde(default)]
        whitelist: Vec<Address>,
    },
    /// Register a candidate into an election
    RegisterCandidateInElection {
        /// An `ElectionManager`
        target: Address,
        /// The election
        election: ElectionId,
        /// The candidate
        candidate: CandidateId,
    },
    /// Issue voting rights through the ballot
    AddVoters {
        /// A `Ballot`
        target: Address,
        /// The election
        election: ElectionId,
        /// The voters
        voters: Vec<Address>,
    },
    /// Cast the sender's vote
    Vote {
        /// A `Ballot`
        target: Address,
        /// The election
        election: ElectionId,
        /// The chosen candidate
        candidate: CandidateId,
    },
}

/// A write operation together with its sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The account submitting the operation
    pub sender: Address,
    /// The operation
    #[serde(flatten)]
    pub call: Call,
}

impl Transaction {
    /// Create a new transaction
    #[must_use]
    pub fn new(sender: Address, call: Call) -> Self {
        Self { sender, call }
    }
}

/// A batch of transactions executed at one ledger time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The ledger time every transaction in the block observes
    pub timestamp: Timestamp,
    /// The transactions, executed in order
    pub transactions: Vec<Transaction>,
}

/// The value produced by a successful transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing beyond the state change itself
    Done,
    /// A contract was deployed
    Deployed {
        /// Its address
        address: Address,
    },
    /// A candidate was created
    CandidateAdded {
        /// Its id
        id: CandidateId,
    },
    /// An election was created
    ElectionCreated {
        /// Its id
        id: ElectionId,
    },
}

/// The result of one transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Height of the block the transaction ran in
    pub height: u64,
    /// Ledger time the transaction observed
    pub timestamp: Timestamp,
    /// What the transaction produced, or why it was rejected
    pub outcome: Result<Outcome, ProtocolError>,
    /// Notifications committed by the transaction, empty when rejected
    pub events: Vec<Event>,
}

impl Receipt {
    /// Whether the transaction was committed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transactions_read_from_json() {
        let json = r#"{
            "sender": "0x0000000000000000000000000000000000000001",
            "call": "vote",
            "target": "0x0000000000000000000000000000000000000002",
            "election": 1,
            "candidate": 2
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.sender, Address::from_low_u64_be(1));
        assert_eq!(
            tx.call,
            Call::Vote {
                target: Address::from_low_u64_be(2),
                election: ElectionId::new(1),
                candidate: CandidateId::new(2),
            }
        );
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{
            "sender": "0x0000000000000000000000000000000000000001",
            "call": "add_candidate",
            "target": "0x0000000000000000000000000000000000000003",
            "name": "Alice",
            "description": "Candidate Alice"
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(matches!(
            tx.call,
            Call::AddCandidate {
                metadata_uri: None,
                ..
            }
        ));
    }
}
