// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Issues and consumes per-election voting rights
//!
//! Rights are minted by the owner and burned by exactly one delegated ballot contract. A right
//! count of zero is never stored, so an untouched `(election, voter)` pair and a fully spent one
//! are indistinguishable.

use std::collections::BTreeMap;

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use tracing::trace;
use votechain_types::{
    data::{Address, ElectionId},
    error::ProtocolError,
    event::EventType,
};

use super::authority::Authority;
use crate::journal::{Entry, Journal};

/// Inverse of a registry mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Undo {
    /// Restore the right count of `voter` in `election`
    Right {
        /// The election
        election: ElectionId,
        /// The voter
        voter: Address,
        /// The count before the mutation
        previous: u64,
    },
    /// Restore the delegated burn capability
    BallotContract {
        /// The capability before the mutation
        previous: Option<Address>,
    },
}

/// The voting right table and its burn capability
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    /// Where this registry is deployed
    address: Address,
    /// Owner-gated writes
    authority: Authority,
    /// The one address allowed to burn rights
    ballot_contract: Option<Address>,
    /// Unspent rights per election and voter
    rights: BTreeMap<ElectionId, BTreeMap<Address, u64>>,
}

impl VoterRegistry {
    /// Create an empty registry at `address` owned by `owner`
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            authority: Authority::new(owner),
            ballot_contract: None,
            rights: BTreeMap::new(),
        }
    }

    /// Where this registry is deployed
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The owner-gated capability
    #[must_use]
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// The current owner
    #[must_use]
    pub fn owner(&self) -> Address {
        self.authority.owner()
    }

    /// Unspent rights of `voter` in `election`
    #[must_use]
    pub fn balance_of(&self, voter: Address, election: ElectionId) -> u64 {
        self.rights
            .get(&election)
            .and_then(|voters| voters.get(&voter))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `voter` holds at least one unspent right in `election`
    #[must_use]
    pub fn is_eligible(&self, election: ElectionId, voter: Address) -> bool {
        self.balance_of(voter, election) > 0
    }

    /// The contract currently allowed to burn rights
    #[must_use]
    pub fn ballot_contract(&self) -> Option<Address> {
        self.ballot_contract
    }

    /// Issue one right per entry of `voters` in `election`. Repeated entries accumulate.
    pub(crate) fn register_voters(
        &mut self,
        caller: Address,
        election: ElectionId,
        voters: &[Address],
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        self.authority.ensure_owner(caller)?;
        for voter in voters {
            let previous = self.balance_of(*voter, election);
            let count = previous
                .checked_add(1)
                .ok_or(ProtocolError::VotingRightOverflow)?;
            journal.record(self.undo(Undo::Right {
                election,
                voter: *voter,
                previous,
            }));
            self.set_right(election, *voter, count);
            journal.emit(
                self.address,
                EventType::VoterRegistered {
                    election,
                    voter: *voter,
                },
            );
        }
        trace!(registry = %self.address, %election, count = voters.len(), "registered voters");
        Ok(())
    }

    /// Delegate the burn capability to `ballot`, replacing any previous delegate
    pub(crate) fn set_ballot_contract(
        &mut self,
        caller: Address,
        ballot: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        self.authority.ensure_owner(caller)?;
        journal.record(self.undo(Undo::BallotContract {
            previous: self.ballot_contract,
        }));
        self.ballot_contract = Some(ballot);
        journal.emit(self.address, EventType::BallotContractSet { ballot });
        Ok(())
    }

    /// Withdraw the burn capability
    pub(crate) fn revoke_ballot_contract(
        &mut self,
        caller: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        self.authority.ensure_owner(caller)?;
        journal.record(self.undo(Undo::BallotContract {
            previous: self.ballot_contract,
        }));
        self.ballot_contract = None;
        journal.emit(self.address, EventType::BallotContractRevoked);
        Ok(())
    }

    /// Burn one right of `voter` in `election` on behalf of the delegated ballot
    pub(crate) fn use_voting_token(
        &mut self,
        caller: Address,
        election: ElectionId,
        voter: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        if self.ballot_contract != Some(caller) {
            return Err(ProtocolError::NotAuthorized);
        }
        let previous = self.balance_of(voter, election);
        if previous == 0 {
            return Err(ProtocolError::NoVotingTokenAvailable);
        }
        journal.record(self.undo(Undo::Right {
            election,
            voter,
            previous,
        }));
        self.set_right(election, voter, previous - 1);
        journal.emit(
            self.address,
            EventType::VotingTokenUsed { election, voter },
        );
        Ok(())
    }

    /// Apply an undo entry recorded by this registry
    pub(crate) fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Right {
                election,
                voter,
                previous,
            } => self.set_right(election, voter, previous),
            Undo::BallotContract { previous } => self.ballot_contract = previous,
        }
    }

    /// Mutable access to the authority, used when undoing a transfer
    pub(crate) fn authority_mut(&mut self) -> &mut Authority {
        &mut self.authority
    }

    /// Wrap an undo entry with this registry's address
    fn undo(&self, undo: Undo) -> Entry {
        Entry::VoterRegistry {
            address: self.address,
            undo,
        }
    }

    /// Store a right count, dropping the entry entirely when it reaches zero
    fn set_right(&mut self, election: ElectionId, voter: Address, count: u64) {
        if count == 0 {
            if let Some(voters) = self.rights.get_mut(&election) {
                voters.remove(&voter);
                if voters.is_empty() {
                    self.rights.remove(&election);
                }
            }
        } else {
            self.rights.entry(election).or_default().insert(voter, count);
        }
    }
}

impl Committable for VoterRegistry {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("VoterRegistry Commitment")
            .var_size_field("address", self.address.as_bytes())
            .field("authority", self.authority.commit())
            .var_size_field(
                "ballot contract",
                self.ballot_contract
                    .as_ref()
                    .map_or(&[][..], |ballot| ballot.as_bytes()),
            );
        for (election, voters) in &self.rights {
            builder = builder
                .u64_field("election", election.u64())
                .u64_field("voters", voters.len() as u64);
            for (voter, count) in voters {
                builder = builder.fixed_size_bytes(voter.as_fixed_bytes()).u64(*count);
            }
        }
        builder.finalize()
    }

    fn tag() -> String {
        "VOTER_REGISTRY".to_string()
    }
}
