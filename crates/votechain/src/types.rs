// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

mod handle;

pub use crate::contracts::election_manager::NewElection;
pub use handle::{
    BallotHandle, CandidateManagerHandle, ElectionManagerHandle, ResultsHandle,
    VoterRegistryHandle,
};
pub use votechain_types::{
    data::{Candidate, CandidateId, CandidateResult, Election, ElectionId, ElectionPhase},
    error::{ErrorKind, ProtocolError},
};
