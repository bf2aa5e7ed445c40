// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Assigns stable identities to candidates

use std::collections::BTreeMap;

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{
    data::{Address, Candidate, CandidateId},
    error::ProtocolError,
    event::EventType,
};

use super::authority::Authority;
use crate::journal::{Entry, Journal};

/// Inverse of a candidate manager mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Undo {
    /// Forget the candidate `id` and hand its id out again
    Added {
        /// The id assigned by the undone creation
        id: CandidateId,
    },
}

/// The candidate table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateManager {
    /// Where this manager is deployed
    address: Address,
    /// Owner-gated writes
    authority: Authority,
    /// Every candidate ever created
    candidates: BTreeMap<CandidateId, Candidate>,
    /// The id the next candidate receives
    next_id: CandidateId,
}

impl CandidateManager {
    /// Create an empty manager at `address` owned by `owner`
    #[must_use]
    pub fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            authority: Authority::new(owner),
            candidates: BTreeMap::new(),
            next_id: CandidateId::FIRST,
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

    /// Look up a candidate
    ///
    /// # Errors
    /// [`ProtocolError::CandidateDoesNotExist`] if `id` was never assigned
    pub fn get_candidate(&self, id: CandidateId) -> Result<&Candidate, ProtocolError> {
        self.candidates
            .get(&id)
            .ok_or(ProtocolError::CandidateDoesNotExist)
    }

    /// Whether `id` was assigned
    #[must_use]
    pub fn candidate_exists(&self, id: CandidateId) -> bool {
        self.candidates.contains_key(&id)
    }

    /// Number of candidates created so far, equal to the last assigned id
    #[must_use]
    pub fn candidate_count(&self) -> u64 {
        self.candidates.len() as u64
    }

    /// Every candidate, in id order
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    /// Create a candidate under the next sequential id
    pub(crate) fn add_candidate(
        &mut self,
        caller: Address,
        name: String,
        description: String,
        metadata_uri: Option<String>,
        journal: &mut Journal,
    ) -> Result<CandidateId, ProtocolError> {
        self.authority.ensure_owner(caller)?;
        let id = self.next_id;
        let next_id = id.next().ok_or(ProtocolError::IdsExhausted)?;
        let candidate = Candidate {
            id,
            name,
            description,
            metadata_uri: metadata_uri.unwrap_or_default(),
        };
        journal.record(Entry::CandidateManager {
            address: self.address,
            undo: Undo::Added { id },
        });
        journal.emit(
            self.address,
            EventType::CandidateAdded {
                candidate: candidate.clone(),
            },
        );
        self.candidates.insert(id, candidate);
        self.next_id = next_id;
        Ok(id)
    }

    /// Apply an undo entry recorded by this manager
    pub(crate) fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Added { id } => {
                self.candidates.remove(&id);
                self.next_id = id;
            }
        }
    }

    /// Mutable access to the authority, used when undoing a transfer
    pub(crate) fn authority_mut(&mut self) -> &mut Authority {
        &mut self.authority
    }
}

impl Committable for CandidateManager {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("CandidateManager Commitment")
            .var_size_field("address", self.address.as_bytes())
            .field("authority", self.authority.commit())
            .u64_field("next id", self.next_id.u64());
        for candidate in self.candidates.values() {
            builder = builder.field("candidate", candidate.commit());
        }
        builder.finalize()
    }

    fn tag() -> String {
        "CANDIDATE_MANAGER".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_sequential_from_one() {
        let owner = Address::from_low_u64_be(1);
        let mut manager = CandidateManager::new(Address::from_low_u64_be(100), owner);
        let mut journal = Journal::new();

        let alice = manager
            .add_candidate(
                owner,
                "Alice".to_string(),
                "Candidate Alice".to_string(),
                Some("ipfs://alice".to_string()),
                &mut journal,
            )
            .unwrap();
        let bob = manager
            .add_candidate(owner, "Bob".to_string(), String::new(), None, &mut journal)
            .unwrap();

        assert_eq!(alice, CandidateId::new(1));
        assert_eq!(bob, CandidateId::new(2));
        assert_eq!(manager.candidate_count(), 2);
        assert_eq!(
            manager.get_candidate(alice).unwrap().metadata_uri,
            "ipfs://alice"
        );
        assert_eq!(manager.get_candidate(bob).unwrap().metadata_uri, "");
        assert!(!manager.candidate_exists(CandidateId::new(3)));
        assert_eq!(
            manager.get_candidate(CandidateId::new(3)),
            Err(ProtocolError::CandidateDoesNotExist)
        );
    }

    #[test]
    fn rejected_creation_consumes_no_id() {
        let owner = Address::from_low_u64_be(1);
        let intruder = Address::from_low_u64_be(2);
        let mut manager = CandidateManager::new(Address::from_low_u64_be(100), owner);
        let mut journal = Journal::new();

        assert!(manager
            .add_candidate(intruder, "Mallory".to_string(), String::new(), None, &mut journal)
            .is_err());
        let id = manager
            .add_candidate(owner, "Alice".to_string(), String::new(), None, &mut journal)
            .unwrap();
        assert_eq!(id, CandidateId::FIRST);
    }

    #[test]
    fn revert_hands_the_id_out_again() {
        let owner = Address::from_low_u64_be(1);
        let mut manager = CandidateManager::new(Address::from_low_u64_be(100), owner);
        let mut journal = Journal::new();
        let id = manager
            .add_candidate(owner, "Alice".to_string(), String::new(), None, &mut journal)
            .unwrap();

        manager.revert(Undo::Added { id });
        assert!(!manager.candidate_exists(id));
        assert_eq!(
            manager
                .add_candidate(owner, "Bob".to_string(), String::new(), None, &mut journal)
                .unwrap(),
            id
        );
    }
}
