// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! The five components hosted on the ledger
//!
//! Each component owns its own tables. Components never hold references to one another, only
//! addresses, and reach each other through the [`LedgerState`](crate::state::LedgerState) they are
//! stored in.

pub mod authority;
pub mod ballot;
pub mod candidate_manager;
pub mod election_manager;
pub mod results;
pub mod voter_registry;

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{
    data::{Address, ContractKind},
    error::ProtocolError,
};

use crate::journal::Journal;

pub use self::{
    authority::Authority, ballot::Ballot, candidate_manager::CandidateManager,
    election_manager::ElectionManager, results::Results, voter_registry::VoterRegistry,
};

/// A deployed component
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contract {
    /// See [`VoterRegistry`]
    VoterRegistry(VoterRegistry),
    /// See [`CandidateManager`]
    CandidateManager(CandidateManager),
    /// See [`ElectionManager`]
    ElectionManager(ElectionManager),
    /// See [`Ballot`]
    Ballot(Ballot),
    /// See [`Results`]
    Results(Results),
}

impl Contract {
    /// What kind of component this is
    #[must_use]
    pub fn kind(&self) -> ContractKind {
        match self {
            Self::VoterRegistry(_) => ContractKind::VoterRegistry,
            Self::CandidateManager(_) => ContractKind::CandidateManager,
            Self::ElectionManager(_) => ContractKind::ElectionManager,
            Self::Ballot(_) => ContractKind::Ballot,
            Self::Results(_) => ContractKind::Results,
        }
    }

    /// Where the component is deployed
    #[must_use]
    pub fn address(&self) -> Address {
        match self {
            Self::VoterRegistry(c) => c.address(),
            Self::CandidateManager(c) => c.address(),
            Self::ElectionManager(c) => c.address(),
            Self::Ballot(c) => c.address(),
            Self::Results(c) => c.address(),
        }
    }

    /// The owner of the component; `Results` has none
    #[must_use]
    pub fn owner(&self) -> Option<Address> {
        self.authority().map(Authority::owner)
    }

    /// The component's authority; `Results` has none
    #[must_use]
    pub fn authority(&self) -> Option<&Authority> {
        match self {
            Self::VoterRegistry(c) => Some(c.authority()),
            Self::CandidateManager(c) => Some(c.authority()),
            Self::ElectionManager(c) => Some(c.authority()),
            Self::Ballot(c) => Some(c.authority()),
            Self::Results(_) => None,
        }
    }

    /// Hand ownership of the component to `new_owner`
    ///
    /// `Results` has no owner, so every caller is rejected as not being it.
    pub(crate) fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        let address = self.address();
        match self.authority_mut() {
            Some(authority) => authority.transfer(address, caller, new_owner, journal),
            None => Err(ProtocolError::NotOwner { caller }),
        }
    }

    /// Mutable access to the component's authority
    pub(crate) fn authority_mut(&mut self) -> Option<&mut Authority> {
        match self {
            Self::VoterRegistry(c) => Some(c.authority_mut()),
            Self::CandidateManager(c) => Some(c.authority_mut()),
            Self::ElectionManager(c) => Some(c.authority_mut()),
            Self::Ballot(c) => Some(c.authority_mut()),
            Self::Results(_) => None,
        }
    }
}

impl Committable for Contract {
    fn commit(&self) -> Commitment<Self> {
        let builder = RawCommitmentBuilder::new("Contract Commitment");
        match self {
            Self::VoterRegistry(c) => builder.field("voter registry", c.commit()),
            Self::CandidateManager(c) => builder.field("candidate manager", c.commit()),
            Self::ElectionManager(c) => builder.field("election manager", c.commit()),
            Self::Ballot(c) => builder.field("ballot", c.commit()),
            Self::Results(c) => builder.field("results", c.commit()),
        }
        .finalize()
    }

    fn tag() -> String {
        "CONTRACT".to_string()
    }
}
