// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use rand::Rng;
use votechain::{
    types::{CandidateId, ElectionId},
    Address, Event, EventType,
};

/// The account that deploys and administers the test system
#[must_use]
pub fn admin() -> Address {
    Address::from_low_u64_be(0xad)
}

/// A deterministic voter account; distinct `n` give distinct accounts, none equal to [`admin`]
#[must_use]
pub fn voter(n: u64) -> Address {
    Address::from_low_u64_be(0x1_0000 + n)
}

/// `count` deterministic voter accounts
#[must_use]
pub fn voters(count: u64) -> Vec<Address> {
    (0..count).map(voter).collect()
}

/// `count` random accounts, possibly repeating
pub fn random_accounts(rng: &mut impl Rng, count: usize) -> Vec<Address> {
    (0..count)
        .map(|_| Address::from_low_u64_be(rng.gen()))
        .collect()
}

/// The `VoteCasted` notifications among `events`, as `(election, candidate, voter)`
#[must_use]
pub fn votes_cast(events: &[Event]) -> Vec<(ElectionId, CandidateId, Address)> {
    events
        .iter()
        .filter_map(|event| match &event.event {
            EventType::VoteCasted {
                election,
                candidate,
                voter,
            } => Some((*election, *candidate, *voter)),
            _ => None,
        })
        .collect()
}
