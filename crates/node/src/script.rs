// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! JSON scripts of administrative and voting steps
//!
//! Steps name the component they act on by role rather than by address, so one script works
//! against any deployment.

use serde::{Deserialize, Serialize};
use votechain::{
    system::Deployment,
    types::{CandidateId, ElectionId},
    Address, Call, Timestamp, Transaction,
};
use votechain_types::data::ContractKind;

/// A sequence of steps, each run as a block of its own
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// The steps, in execution order
    pub steps: Vec<Step>,
}

/// One transaction of a script
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Block timestamp; the ledger's current time when absent
    #[serde(default)]
    pub time: Option<Timestamp>,
    /// Signer; the configured owner when absent
    #[serde(default)]
    pub sender: Option<Address>,
    /// What to do
    #[serde(flatten)]
    pub action: Action,
}

/// A write operation, addressed by component role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// See [`Call::AddCandidate`]
    AddCandidate {
        /// Display name
        name: String,
        /// Free-form description
        #[serde(default)]
        description: String,
        /// Optional link to further material
        #[serde(default)]
        metadata_uri: Option<String>,
    },
    /// See [`Call::CreateElection`]
    CreateElection {
        /// Display name
        name: String,
        /// Free-form description
        #[serde(default)]
        description: String,
        /// Start of the voting window
        start_time: Timestamp,
        /// End of the voting window
        end_time: Timestamp,
        /// Intended voters
        #[serde(default)]
        whitelist: Vec<Address>,
    },
    /// See [`Call::RegisterCandidateInElection`]
    RegisterCandidate {
        /// The election
        election: ElectionId,
        /// The candidate
        candidate: CandidateId,
    },
    /// See [`Call::AddVoters`]
    AddVoters {
        /// The election
        election: ElectionId,
        /// One right per entry
        voters: Vec<Address>,
    },
    /// See [`Call::Vote`]
    Vote {
        /// The election
        election: ElectionId,
        /// The chosen candidate
        candidate: CandidateId,
    },
    /// See [`Call::TransferOwnership`]
    TransferOwnership {
        /// Which component changes hands
        component: ContractKind,
        /// The new owner
        new_owner: Address,
    },
}

impl Action {
    /// The call performing this action against `deployment`
    #[must_use]
    pub fn call(self, deployment: &Deployment) -> Call {
        match self {
            Self::AddCandidate {
                name,
                description,
                metadata_uri,
            } => Call::AddCandidate {
                target: deployment.candidate_manager,
                name,
                description,
                metadata_uri,
            },
            Self::CreateElection {
                name,
                description,
                start_time,
                end_time,
                whitelist,
            } => Call::CreateElection {
                target: deployment.election_manager,
                name,
                description,
                start_time,
                end_time,
                whitelist,
            },
            Self::RegisterCandidate {
                election,
                candidate,
            } => Call::RegisterCandidateInElection {
                target: deployment.election_manager,
                election,
                candidate,
            },
            Self::AddVoters { election, voters } => Call::AddVoters {
                target: deployment.ballot,
                election,
                voters,
            },
            Self::Vote {
                election,
                candidate,
            } => Call::Vote {
                target: deployment.ballot,
                election,
                candidate,
            },
            Self::TransferOwnership {
                component,
                new_owner,
            } => Call::TransferOwnership {
                target: address_of(deployment, component),
                new_owner,
            },
        }
    }
}

/// Where the component of kind `kind` lives
fn address_of(deployment: &Deployment, kind: ContractKind) -> Address {
    match kind {
        ContractKind::VoterRegistry => deployment.voter_registry,
        ContractKind::CandidateManager => deployment.candidate_manager,
        ContractKind::ElectionManager => deployment.election_manager,
        ContractKind::Ballot => deployment.ballot,
        ContractKind::Results => deployment.results,
    }
}

impl Step {
    /// The transaction for this step, signed by `owner` unless the step names a sender
    #[must_use]
    pub fn transaction(self, deployment: &Deployment, owner: Address) -> Transaction {
        Transaction::new(
            self.sender.unwrap_or(owner),
            self.action.call(deployment),
        )
    }
}
