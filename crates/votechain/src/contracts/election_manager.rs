// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Owns election metadata: name, description, window, whitelist and candidate list

use std::collections::BTreeMap;

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{
    data::{Address, CandidateId, Election, ElectionId, ElectionPhase, Timestamp},
    error::ProtocolError,
    event::EventType,
};

use super::authority::Authority;
use crate::journal::{Entry, Journal};

/// Inverse of an election manager mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Undo {
    /// Forget the election `id` and hand its id out again
    Created {
        /// The id assigned by the undone creation
        id: ElectionId,
    },
    /// Drop the last candidate registered into `election`
    CandidateRegistered {
        /// The election
        election: ElectionId,
    },
}

/// Arguments of [`ElectionManager::create_election`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewElection {
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Start of the voting window, inclusive
    pub start_time: Timestamp,
    /// End of the voting window, inclusive
    pub end_time: Timestamp,
    /// Intended voters, stored verbatim
    pub whitelist: Vec<Address>,
}

/// The election table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionManager {
    /// Where this manager is deployed
    address: Address,
    /// Owner-gated writes
    authority: Authority,
    /// Every election ever created
    elections: BTreeMap<ElectionId, Election>,
    /// The id the next election receives
    next_id: ElectionId,
}

impl ElectionManager {
    /// Create an empty manager at `address` owned by `owner`
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            authority: Authority::new(owner),
            elections: BTreeMap::new(),
            next_id: ElectionId::FIRST,
        }
    }

    /// Where this manager is deployed
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

    /// Look up an election
    ///
    /// # Errors
    /// [`ProtocolError::NoSuchElection`] if `id` was never assigned
    pub fn get_election(&self, id: ElectionId) -> Result<&Election, ProtocolError> {
        self.elections.get(&id).ok_or(ProtocolError::NoSuchElection)
    }

    /// The whitelist of an election, as given at creation
    ///
    /// # Errors
    /// [`ProtocolError::NoSuchElection`] if `id` was never assigned
    pub fn get_whitelist(&self, id: ElectionId) -> Result<&[Address], ProtocolError> {
        Ok(&self.get_election(id)?.whitelist)
    }

    /// The candidates registered into an election, in registration order
    ///
    /// # Errors
    /// [`ProtocolError::NoSuchElection`] if `id` was never assigned
    pub fn get_election_candidates(&self, id: ElectionId) -> Result<&[CandidateId], ProtocolError> {
        Ok(&self.get_election(id)?.candidate_ids)
    }

    /// Number of elections created so far
    #[must_use]
    pub fn election_count(&self) -> u64 {
        self.elections.len() as u64
    }

    /// The phase of an election at `now`
    ///
    /// # Errors
    /// [`ProtocolError::NoSuchElection`] if `id` was never assigned
    pub fn election_phase(
        &self,
        id: ElectionId,
        now: Timestamp,
    ) -> Result<ElectionPhase, ProtocolError> {
        Ok(self.get_election(id)?.phase_at(now))
    }

    /// Every election, in id order
    pub fn elections(&self) -> impl Iterator<Item = &Election> {
        self.elections.values()
    }

    /// Create an election under the next sequential id
    pub(crate) fn create_election(
        &mut self,
        caller: Address,
        now: Timestamp,
        new: NewElection,
        journal: &mut Journal,
    ) -> Result<ElectionId, ProtocolError> {
        self.authority.ensure_owner(caller)?;
        if new.end_time <= new.start_time {
            return Err(ProtocolError::EndNotAfterStart);
        }
        if new.end_time <= now {
            return Err(ProtocolError::EndNotInFuture);
        }
        let id = self.next_id;
        let next_id = id.next().ok_or(ProtocolError::IdsExhausted)?;

        journal.record(Entry::ElectionManager {
            address: self.address,
            undo: Undo::Created { id },
        });
        journal.emit(
            self.address,
            EventType::ElectionCreated {
                id,
                name: new.name.clone(),
                description: new.description.clone(),
                start_time: new.start_time,
                end_time: new.end_time,
                whitelist: new.whitelist.clone(),
            },
        );
        self.elections.insert(
            id,
            Election {
                id,
                name: new.name,
                description: new.description,
                start_time: new.start_time,
                end_time: new.end_time,
                whitelist: new.whitelist,
                candidate_ids: Vec::new(),
            },
        );
        self.next_id = next_id;
        Ok(id)
    }

    /// Append `candidate` to the candidate list of `election`. Existence of the candidate is not
    /// checked here; the ballot checks it when a vote names it.
    pub(crate) fn register_candidate_in_election(
        &mut self,
        caller: Address,
        election: ElectionId,
        candidate: CandidateId,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        self.authority.ensure_owner(caller)?;
        let record = self
            .elections
            .get_mut(&election)
            .ok_or(ProtocolError::NoSuchElection)?;
        journal.record(Entry::ElectionManager {
            address: self.address,
            undo: Undo::CandidateRegistered { election },
        });
        record.candidate_ids.push(candidate);
        journal.emit(
            self.address,
            EventType::CandidateRegistered {
                election,
                candidate,
            },
        );
        Ok(())
    }

    /// Apply an undo entry recorded by this manager
    pub(crate) fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Created { id } => {
                self.elections.remove(&id);
                self.next_id = id;
            }
            Undo::CandidateRegistered { election } => {
                if let Some(record) = self.elections.get_mut(&election) {
                    record.candidate_ids.pop();
                }
            }
        }
    }

    /// Mutable access to the authority, used when undoing a transfer
    pub(crate) fn authority_mut(&mut self) -> &mut Authority {
        &mut self.authority
    }
}

impl Committable for ElectionManager {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("ElectionManager Commitment")
            .var_size_field("address", self.address.as_bytes())
            .field("authority", self.authority.commit())
            .u64_field("next id", self.next_id.u64());
        for election in self.elections.values() {
            builder = builder.field("election", election.commit());
        }
        builder.finalize()
    }

    fn tag() -> String {
        "ELECTION_MANAGER".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn board(start_time: Timestamp, end_time: Timestamp) -> NewElection {
        NewElection {
            name: "Board".to_string(),
            description: "Board seat".to_string(),
            start_time,
            end_time,
            whitelist: vec![Address::from_low_u64_be(7), Address::from_low_u64_be(7)],
        }
    }

    #[test]
    fn window_is_validated_before_an_id_is_assigned() {
        let owner = Address::from_low_u64_be(1);
        let mut manager = ElectionManager::new(Address::from_low_u64_be(100), owner);
        let mut journal = Journal::new();

        assert_eq!(
            manager.create_election(owner, 1_000, board(2_000, 2_000), &mut journal),
            Err(ProtocolError::EndNotAfterStart)
        );
        assert_eq!(
            manager.create_election(owner, 1_000, board(500, 1_000), &mut journal),
            Err(ProtocolError::EndNotInFuture)
        );
        assert_eq!(manager.election_count(), 0);

        let id = manager
            .create_election(owner, 1_000, board(500, 1_001), &mut journal)
            .unwrap();
        assert_eq!(id, ElectionId::FIRST);
        assert_eq!(manager.get_whitelist(id).unwrap().len(), 2);
        assert_eq!(manager.election_phase(id, 1_000), Ok(ElectionPhase::Active));
        assert_eq!(manager.election_phase(id, 1_002), Ok(ElectionPhase::Closed));
    }

    #[test]
    fn candidates_are_appended_without_deduplication() {
        let owner = Address::from_low_u64_be(1);
        let mut manager = ElectionManager::new(Address::from_low_u64_be(100), owner);
        let mut journal = Journal::new();
        let id = manager
            .create_election(owner, 0, board(100, 200), &mut journal)
            .unwrap();

        for candidate in [1, 2, 1] {
            manager
                .register_candidate_in_election(owner, id, CandidateId::new(candidate), &mut journal)
                .unwrap();
        }
        assert_eq!(
            manager.get_election_candidates(id).unwrap(),
            &[CandidateId::new(1), CandidateId::new(2), CandidateId::new(1)]
        );
        assert_eq!(
            manager.register_candidate_in_election(
                owner,
                ElectionId::new(9),
                CandidateId::new(1),
                &mut journal
            ),
            Err(ProtocolError::NoSuchElection)
        );

        manager.revert(Undo::CandidateRegistered { election: id });
        assert_eq!(manager.get_election_candidates(id).unwrap().len(), 2);
    }
}
