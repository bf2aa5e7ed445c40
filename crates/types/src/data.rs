// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Records and identifiers held by the ledger
//!
//! This module provides the [`Election`] and [`Candidate`] records, the sequential identifiers
//! that name them, and the [`Address`] type that names accounts and deployed contracts.

use std::fmt::{self, Display};

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};

use crate::constants::{CONTRACT_ADDRESS_DOMAIN, FIRST_ID};

/// An account or contract address
pub type Address = ethereum_types::H160;

/// Seconds since the unix epoch, as seen by the ledger
pub type Timestamp = u64;

/// A `(candidate, votes)` pair as returned by the results aggregator
pub type ElectionResult = (CandidateId, u64);

/// Declares a type-safe wrapper around a sequential `u64` identifier.
macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The first identifier ever assigned
            pub const FIRST: Self = Self(FIRST_ID);

            /// Create a new identifier with the given value.
            #[must_use]
            pub const fn new(n: u64) -> Self {
                Self(n)
            }

            /// Return the `u64` format
            #[must_use]
            pub const fn u64(self) -> u64 {
                self.0
            }

            /// The identifier following this one, `None` once the counter is exhausted
            #[must_use]
            pub fn next(self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(n: u64) -> Self {
                Self(n)
            }
        }

        impl std::ops::Deref for $name {
            type Target = u64;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequential_id!(
    /// Type-safe wrapper around `u64` so we know the thing we're talking about is an election id.
    ElectionId
);

sequential_id!(
    /// Type-safe wrapper around `u64` so we know the thing we're talking about is a candidate id.
    CandidateId
);

/// Derive the address of a contract deployed by `deployer` using its `nonce`-th deployment.
#[must_use]
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CONTRACT_ADDRESS_DOMAIN);
    hasher.update(deployer.as_bytes());
    hasher.update(&nonce.to_le_bytes());
    let digest = hasher.finalize();
    Address::from_slice(&digest.as_bytes()[..Address::len_bytes()])
}

/// The kinds of component that can be deployed on the ledger
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    /// Issues and consumes voting rights
    VoterRegistry,
    /// Assigns identities to candidates
    CandidateManager,
    /// Owns election metadata
    ElectionManager,
    /// The voting state machine
    Ballot,
    /// Read-side results aggregator
    Results,
}

impl Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VoterRegistry => "VoterRegistry",
            Self::CandidateManager => "CandidateManager",
            Self::ElectionManager => "ElectionManager",
            Self::Ballot => "Ballot",
            Self::Results => "Results",
        };
        f.write_str(name)
    }
}

/// Where an election stands relative to the ledger clock.
///
/// This is never stored; it is derived from the election window and the current time every time
/// it is needed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionPhase {
    /// `now < start`
    Upcoming,
    /// `start <= now <= end`
    Active,
    /// `now > end`
    Closed,
}

impl Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// A timed voting event
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Election {
    /// Sequential identifier, assigned on creation
    pub id: ElectionId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// First second (inclusive) in which votes are accepted
    pub start_time: Timestamp,
    /// Last second (inclusive) in which votes are accepted
    pub end_time: Timestamp,
    /// Intended voters, stored verbatim. Informational only: voting is gated by voting rights.
    pub whitelist: Vec<Address>,
    /// Candidates registered into this election, in registration order
    pub candidate_ids: Vec<CandidateId>,
}

impl Election {
    /// Derive the phase of this election at `now`.
    #[must_use]
    pub fn phase_at(&self, now: Timestamp) -> ElectionPhase {
        if now < self.start_time {
            ElectionPhase::Upcoming
        } else if now <= self.end_time {
            ElectionPhase::Active
        } else {
            ElectionPhase::Closed
        }
    }

    /// Whether votes are accepted at `now`; both window boundaries are inclusive.
    #[must_use]
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.phase_at(now) == ElectionPhase::Active
    }

    /// Whether `candidate` has been registered into this election
    #[must_use]
    pub fn has_candidate(&self, candidate: CandidateId) -> bool {
        self.candidate_ids.contains(&candidate)
    }
}

impl Committable for Election {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("Election Commitment")
            .u64_field("id", self.id.u64())
            .var_size_field("name", self.name.as_bytes())
            .var_size_field("description", self.description.as_bytes())
            .u64_field("start time", self.start_time)
            .u64_field("end time", self.end_time)
            .u64_field("whitelist length", self.whitelist.len() as u64);
        for voter in &self.whitelist {
            builder = builder.fixed_size_bytes(voter.as_fixed_bytes());
        }
        builder = builder.u64_field("candidates length", self.candidate_ids.len() as u64);
        for candidate in &self.candidate_ids {
            builder = builder.u64(candidate.u64());
        }
        builder.finalize()
    }

    fn tag() -> String {
        "ELECTION".to_string()
    }
}

/// An immutable candidate record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Sequential identifier, assigned on creation
    pub id: CandidateId,
    /// Display name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Pointer to off-ledger metadata, empty when none was given
    #[serde(default)]
    pub metadata_uri: String,
}

impl Committable for Candidate {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Candidate Commitment")
            .u64_field("id", self.id.u64())
            .var_size_field("name", self.name.as_bytes())
            .var_size_field("description", self.description.as_bytes())
            .var_size_field("metadata uri", self.metadata_uri.as_bytes())
            .finalize()
    }

    fn tag() -> String {
        "CANDIDATE".to_string()
    }
}

/// One row of the joined results view: a candidate of an election with its name and tally
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateResult {
    /// The candidate
    pub candidate: CandidateId,
    /// The candidate's display name
    pub name: String,
    /// Votes cast for the candidate in the election
    pub votes: u64,
}

#[cfg(test)]
mod test {
    use super::*;

    fn election(start_time: Timestamp, end_time: Timestamp) -> Election {
        Election {
            id: ElectionId::FIRST,
            name: "Board".to_string(),
            description: "Board seat".to_string(),
            start_time,
            end_time,
            whitelist: vec![],
            candidate_ids: vec![CandidateId::new(1)],
        }
    }

    #[test]
    fn phase_boundaries_are_inclusive() {
        let e = election(100, 200);
        assert_eq!(e.phase_at(99), ElectionPhase::Upcoming);
        assert_eq!(e.phase_at(100), ElectionPhase::Active);
        assert_eq!(e.phase_at(200), ElectionPhase::Active);
        assert_eq!(e.phase_at(201), ElectionPhase::Closed);
    }

    #[test]
    fn contract_addresses_depend_on_deployer_and_nonce() {
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);
        assert_eq!(contract_address(&alice, 0), contract_address(&alice, 0));
        assert_ne!(contract_address(&alice, 0), contract_address(&alice, 1));
        assert_ne!(contract_address(&alice, 0), contract_address(&bob, 0));
    }

    #[test]
    fn commitment_tracks_candidate_list() {
        let mut e = election(100, 200);
        let before = e.commit();
        e.candidate_ids.push(CandidateId::new(2));
        assert_ne!(before, e.commit());
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&ElectionId::new(7)).unwrap();
        assert_eq!(json, "7");
        assert_eq!(ElectionId::FIRST.next(), Some(ElectionId::new(2)));
        assert_eq!(CandidateId::new(u64::MAX).next(), None);
    }

    #[test]
    fn unassigned_counter_precedes_the_first_id() {
        assert_eq!(ElectionId::default().u64(), 0);
        assert_eq!(CandidateId::default().next(), Some(CandidateId::FIRST));
        assert_eq!(CandidateId::FIRST.u64(), 1);
    }
}
