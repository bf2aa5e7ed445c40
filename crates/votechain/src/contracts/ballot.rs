// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! The voting state machine
//!
//! A [`Ballot`] is wired at deployment to one registry, one candidate manager and one election
//! manager, and never rewired. It reads elections and candidates, burns voting rights through the
//! registry's delegated capability and keeps the tallies.
//!
//! The phase of an election is never stored: [`vote`] evaluates the election window against the
//! ledger time of the transaction.

use std::collections::{BTreeMap, BTreeSet};

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{
    data::{Address, CandidateId, ElectionId, Timestamp},
    error::ProtocolError,
    event::EventType,
};

use super::authority::Authority;
use crate::{
    journal::{Entry, Journal},
    state::LedgerState,
};

/// Inverse of a ballot mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Undo {
    /// Restore a tally
    Tally {
        /// The election
        election: ElectionId,
        /// The candidate
        candidate: CandidateId,
        /// The tally before the mutation
        previous: u64,
    },
    /// Clear a has-voted marker
    Voted {
        /// The election
        election: ElectionId,
        /// The voter
        voter: Address,
    },
}

/// Tallies and has-voted markers, plus the three components a ballot reads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Where this ballot is deployed
    address: Address,
    /// Owner-gated writes
    authority: Authority,
    /// The registry whose rights this ballot burns
    voter_registry: Address,
    /// The candidate source
    candidate_manager: Address,
    /// The election source
    election_manager: Address,
    /// Votes per election and candidate
    tallies: BTreeMap<ElectionId, BTreeMap<CandidateId, u64>>,
    /// Voters that have cast a vote, per election
    voted: BTreeMap<ElectionId, BTreeSet<Address>>,
}

impl Ballot {
    /// Create a ballot at `address` owned by `owner`, wired to the given components
    #[must_use]
    pub fn new(
        address: Address,
        owner: Address,
        voter_registry: Address,
        candidate_manager: Address,
        election_manager: Address,
    ) -> Self {
        Self {
            address,
            authority: Authority::new(owner),
            voter_registry,
            candidate_manager,
            election_manager,
            tallies: BTreeMap::new(),
            voted: BTreeMap::new(),
        }
    }

    /// Where this ballot is deployed
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

    /// The registry this ballot burns rights in
    #[must_use]
    pub fn voter_registry(&self) -> Address {
        self.voter_registry
    }

    /// The candidate manager this ballot reads
    #[must_use]
    pub fn candidate_manager(&self) -> Address {
        self.candidate_manager
    }

    /// The election manager this ballot reads
    #[must_use]
    pub fn election_manager(&self) -> Address {
        self.election_manager
    }

    /// Votes cast for `candidate` in `election`, zero when none were
    #[must_use]
    pub fn get_votes(&self, election: ElectionId, candidate: CandidateId) -> u64 {
        self.tallies
            .get(&election)
            .and_then(|tally| tally.get(&candidate))
            .copied()
            .unwrap_or_default()
    }

    /// Whether `voter` has cast a vote in `election`
    #[must_use]
    pub fn has_voted(&self, election: ElectionId, voter: Address) -> bool {
        self.voted
            .get(&election)
            .is_some_and(|voters| voters.contains(&voter))
    }

    /// Count one vote and mark the voter. The right must already be burned.
    fn record_vote(
        &mut self,
        election: ElectionId,
        candidate: CandidateId,
        voter: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        let previous = self.get_votes(election, candidate);
        let tally = previous
            .checked_add(1)
            .ok_or(ProtocolError::TallyOverflow)?;
        journal.record(self.undo(Undo::Tally {
            election,
            candidate,
            previous,
        }));
        self.tallies
            .entry(election)
            .or_default()
            .insert(candidate, tally);
        if !self.has_voted(election, voter) {
            journal.record(self.undo(Undo::Voted { election, voter }));
            self.voted.entry(election).or_default().insert(voter);
        }
        journal.emit(
            self.address,
            EventType::VoteCasted {
                election,
                candidate,
                voter,
            },
        );
        Ok(())
    }

    /// Apply an undo entry recorded by this ballot
    pub(crate) fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Tally {
                election,
                candidate,
                previous,
            } => {
                if previous == 0 {
                    if let Some(tally) = self.tallies.get_mut(&election) {
                        tally.remove(&candidate);
                        if tally.is_empty() {
                            self.tallies.remove(&election);
                        }
                    }
                } else {
                    self.tallies
                        .entry(election)
                        .or_default()
                        .insert(candidate, previous);
                }
            }
            Undo::Voted { election, voter } => {
                if let Some(voters) = self.voted.get_mut(&election) {
                    voters.remove(&voter);
                    if voters.is_empty() {
                        self.voted.remove(&election);
                    }
                }
            }
        }
    }

    /// Mutable access to the authority, used when undoing a transfer
    pub(crate) fn authority_mut(&mut self) -> &mut Authority {
        &mut self.authority
    }

    /// Wrap an undo entry with this ballot's address
    fn undo(&self, undo: Undo) -> Entry {
        Entry::Ballot {
            address: self.address,
            undo,
        }
    }
}

impl Committable for Ballot {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("Ballot Commitment")
            .var_size_field("address", self.address.as_bytes())
            .field("authority", self.authority.commit())
            .var_size_field("voter registry", self.voter_registry.as_bytes())
            .var_size_field("candidate manager", self.candidate_manager.as_bytes())
            .var_size_field("election manager", self.election_manager.as_bytes());
        for (election, tally) in &self.tallies {
            builder = builder
                .u64_field("tally election", election.u64())
                .u64_field("candidates", tally.len() as u64);
            for (candidate, votes) in tally {
                builder = builder.u64(candidate.u64()).u64(*votes);
            }
        }
        for (election, voters) in &self.voted {
            builder = builder
                .u64_field("voted election", election.u64())
                .u64_field("voters", voters.len() as u64);
            for voter in voters {
                builder = builder.fixed_size_bytes(voter.as_fixed_bytes());
            }
        }
        builder.finalize()
    }

    fn tag() -> String {
        "BALLOT".to_string()
    }
}

/// Cast `caller`'s vote for `candidate` in `election` through the ballot at `ballot`
///
/// The checks run in a fixed order: the election window, membership of the candidate in the
/// election, existence of the candidate, then the voting right. Every mutation goes through
/// `journal`, so a failure at any step leaves nothing behind once the journal is rolled back.
pub(crate) fn vote(
    state: &mut LedgerState,
    journal: &mut Journal,
    now: Timestamp,
    ballot: Address,
    caller: Address,
    election: ElectionId,
    candidate: CandidateId,
) -> Result<(), ProtocolError> {
    let (registry, candidates, elections) = {
        let b = state.ballot(ballot)?;
        (b.voter_registry, b.candidate_manager, b.election_manager)
    };

    let record = state.election_manager(elections)?.get_election(election)?;
    if !record.is_active_at(now) {
        return Err(ProtocolError::NotActive);
    }
    if !record.has_candidate(candidate) {
        return Err(ProtocolError::CandidateNotInElection);
    }
    if !state
        .candidate_manager(candidates)?
        .candidate_exists(candidate)
    {
        return Err(ProtocolError::CandidateDoesNotExist);
    }

    state
        .voter_registry_mut(registry)?
        .use_voting_token(ballot, election, caller, journal)
        .map_err(|e| match e {
            ProtocolError::NoVotingTokenAvailable => ProtocolError::NoVotingToken,
            e => e,
        })?;
    state
        .ballot_mut(ballot)?
        .record_vote(election, candidate, caller, journal)
}

/// Issue voting rights through the registry, acting as the registry's owner
///
/// The ballot must own the registry; the registry's owner check runs against the ballot's
/// address, not the caller's.
pub(crate) fn add_voters(
    state: &mut LedgerState,
    journal: &mut Journal,
    ballot: Address,
    caller: Address,
    election: ElectionId,
    voters: Vec<Address>,
) -> Result<(), ProtocolError> {
    let registry = {
        let b = state.ballot(ballot)?;
        b.authority.ensure_owner(caller)?;
        b.voter_registry
    };
    state
        .voter_registry_mut(registry)?
        .register_voters(ballot, election, &voters, journal)?;
    journal.emit(ballot, EventType::VotersAdded { election, voters });
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tallies_default_to_zero_and_revert_cleanly() {
        let owner = Address::from_low_u64_be(1);
        let voter = Address::from_low_u64_be(7);
        let mut ballot = Ballot::new(
            Address::from_low_u64_be(100),
            owner,
            Address::from_low_u64_be(101),
            Address::from_low_u64_be(102),
            Address::from_low_u64_be(103),
        );
        let e = ElectionId::FIRST;
        let c = CandidateId::FIRST;
        let before = ballot.commit();
        assert_eq!(ballot.get_votes(e, c), 0);

        let mut journal = Journal::new();
        ballot.record_vote(e, c, voter, &mut journal).unwrap();
        assert_eq!(ballot.get_votes(e, c), 1);
        assert!(ballot.has_voted(e, voter));
        assert_eq!(journal.len(), 2);

        ballot.revert(Undo::Voted { election: e, voter });
        ballot.revert(Undo::Tally {
            election: e,
            candidate: c,
            previous: 0,
        });
        assert_eq!(ballot.commit(), before);
    }
}
