// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Read-side results aggregator

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{
    data::{Address, CandidateId, CandidateResult, ElectionId, ElectionResult},
    error::ProtocolError,
};

use crate::state::LedgerState;

/// Joins ballot tallies with election and candidate records. Holds no tables of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Results {
    /// Where this aggregator is deployed
    address: Address,
    /// The ballot holding the tallies
    ballot: Address,
    /// The election source
    election_manager: Address,
    /// The candidate source
    candidate_manager: Address,
}

impl Results {
    /// Create an aggregator at `address` over the given components
    #[must_use]
    pub fn new(
        address: Address,
        ballot: Address,
        election_manager: Address,
        candidate_manager: Address,
    ) -> Self {
        Self {
            address,
            ballot,
            election_manager,
            candidate_manager,
        }
    }

    /// Where this aggregator is deployed
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// The ballot this aggregator reads tallies from
    #[must_use]
    pub fn ballot(&self) -> Address {
        self.ballot
    }

    /// The election manager this aggregator reads
    #[must_use]
    pub fn election_manager(&self) -> Address {
        self.election_manager
    }

    /// The candidate manager this aggregator reads
    #[must_use]
    pub fn candidate_manager(&self) -> Address {
        self.candidate_manager
    }

    /// Pair each of `candidates`, in the given order, with its tally in `election`
    ///
    /// Neither the election nor the candidates are checked; unknown ids yield zero.
    ///
    /// # Errors
    /// [`ProtocolError::NoSuchContract`] if the wired ballot is gone from `state`
    pub fn get_election_results(
        &self,
        state: &LedgerState,
        election: ElectionId,
        candidates: &[CandidateId],
    ) -> Result<Vec<ElectionResult>, ProtocolError> {
        let ballot = state.ballot(self.ballot)?;
        Ok(candidates
            .iter()
            .map(|candidate| (*candidate, ballot.get_votes(election, *candidate)))
            .collect())
    }

    /// Every candidate registered into `election`, in registration order, with name and tally
    ///
    /// # Errors
    /// - [`ProtocolError::NoSuchElection`] if `election` does not exist
    /// - [`ProtocolError::CandidateDoesNotExist`] if a registered candidate was never created
    pub fn get_full_results(
        &self,
        state: &LedgerState,
        election: ElectionId,
    ) -> Result<Vec<CandidateResult>, ProtocolError> {
        let ballot = state.ballot(self.ballot)?;
        let candidates = state.candidate_manager(self.candidate_manager)?;
        state
            .election_manager(self.election_manager)?
            .get_election_candidates(election)?
            .iter()
            .map(|id| {
                let candidate = candidates.get_candidate(*id)?;
                Ok(CandidateResult {
                    candidate: *id,
                    name: candidate.name.clone(),
                    votes: ballot.get_votes(election, *id),
                })
            })
            .collect()
    }
}

impl Committable for Results {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Results Commitment")
            .var_size_field("address", self.address.as_bytes())
            .var_size_field("ballot", self.ballot.as_bytes())
            .var_size_field("election manager", self.election_manager.as_bytes())
            .var_size_field("candidate manager", self.candidate_manager.as_bytes())
            .finalize()
    }

    fn tag() -> String {
        "RESULTS".to_string()
    }
}
