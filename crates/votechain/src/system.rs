// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Deploys the five components and wires them together
//!
//! The administrator owns the candidate manager, the election manager and the ballot. The voter
//! registry is handed to the ballot, which is also its delegated burn capability, so voting
//! rights can only be issued through [`BallotHandle::add_voters`].

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    types::{
        BallotHandle, CandidateManagerHandle, ElectionManagerHandle, ResultsHandle,
        VoterRegistryHandle,
    },
    Address, Ledger, LedgerError, Storage,
};

/// Where each component of a [`VotingSystem`] lives
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deployment {
    /// The voter registry
    pub voter_registry: Address,
    /// The candidate manager
    pub candidate_manager: Address,
    /// The election manager
    pub election_manager: Address,
    /// The ballot
    pub ballot: Address,
    /// The results aggregator
    pub results: Address,
}

/// Handles to a wired set of components
#[derive(Clone, Debug)]
pub struct VotingSystem<S: Storage> {
    /// The voter registry, owned by the ballot
    pub voter_registry: VoterRegistryHandle<S>,
    /// The candidate manager
    pub candidate_manager: CandidateManagerHandle<S>,
    /// The election manager
    pub election_manager: ElectionManagerHandle<S>,
    /// The ballot
    pub ballot: BallotHandle<S>,
    /// The results aggregator
    pub results: ResultsHandle<S>,
}

impl<S: Storage> VotingSystem<S> {
    /// Deploy and wire the five components on `ledger`, administered by `owner`.
    ///
    /// # Errors
    /// If any step is rejected or cannot be persisted. Steps that already committed stay
    /// committed.
    pub async fn deploy(ledger: &Ledger<S>, owner: Address) -> Result<Self, LedgerError> {
        let voter_registry = ledger.deploy_voter_registry(owner).await?;
        let candidate_manager = ledger.deploy_candidate_manager(owner).await?;
        let election_manager = ledger.deploy_election_manager(owner).await?;
        let ballot = ledger
            .deploy_ballot(
                owner,
                voter_registry.address(),
                candidate_manager.address(),
                election_manager.address(),
            )
            .await?;
        let results = ledger
            .deploy_results(
                owner,
                ballot.address(),
                election_manager.address(),
                candidate_manager.address(),
            )
            .await?;

        voter_registry
            .set_ballot_contract(owner, ballot.address())
            .await?;
        voter_registry
            .transfer_ownership(owner, ballot.address())
            .await?;

        let system = Self {
            voter_registry,
            candidate_manager,
            election_manager,
            ballot,
            results,
        };
        info!(deployment = ?system.deployment(), %owner, "Deployed voting system");
        Ok(system)
    }

    /// Attach to the components listed in `deployment`
    ///
    /// # Errors
    /// "No such contract" if an address does not host a component of the expected kind
    pub async fn attach(ledger: &Ledger<S>, deployment: Deployment) -> Result<Self, LedgerError> {
        Ok(Self {
            voter_registry: ledger.voter_registry(deployment.voter_registry).await?,
            candidate_manager: ledger
                .candidate_manager(deployment.candidate_manager)
                .await?,
            election_manager: ledger.election_manager(deployment.election_manager).await?,
            ballot: ledger.ballot(deployment.ballot).await?,
            results: ledger.results(deployment.results).await?,
        })
    }

    /// Attach to a deployment through its results aggregator, which references every other
    /// component directly or through the ballot
    ///
    /// # Errors
    /// "No such contract" if `results` or anything it references is missing
    pub async fn from_results(ledger: &Ledger<S>, results: Address) -> Result<Self, LedgerError> {
        let deployment = ledger
            .read(|state| {
                let aggregator = state.results(results)?;
                let ballot = state.ballot(aggregator.ballot())?;
                Ok::<_, LedgerError>(Deployment {
                    voter_registry: ballot.voter_registry(),
                    candidate_manager: aggregator.candidate_manager(),
                    election_manager: aggregator.election_manager(),
                    ballot: aggregator.ballot(),
                    results,
                })
            })
            .await?;
        Self::attach(ledger, deployment).await
    }

    /// Where each component lives
    #[must_use]
    pub fn deployment(&self) -> Deployment {
        Deployment {
            voter_registry: self.voter_registry.address(),
            candidate_manager: self.candidate_manager.address(),
            election_manager: self.election_manager.address(),
            ballot: self.ballot.address(),
            results: self.results.address(),
        }
    }

    /// The hosting ledger
    #[must_use]
    pub fn ledger(&self) -> &Ledger<S> {
        self.ballot.ledger()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use votechain_types::{traits::clock::ManualClock, LedgerConfig};

    use super::*;
    use crate::traits::implementations::MemoryStorage;

    #[tokio::test(flavor = "multi_thread")]
    async fn deployment_hands_the_registry_to_the_ballot() {
        votechain_types::logging::setup_logging();
        let ledger = Ledger::new(
            LedgerConfig::default(),
            Arc::new(ManualClock::new(100)),
            MemoryStorage::empty(),
        )
        .await
        .unwrap();
        let admin = Address::from_low_u64_be(7);

        let system = VotingSystem::deploy(&ledger, admin).await.unwrap();
        let ballot = system.ballot.address();
        assert_eq!(system.voter_registry.owner().await.unwrap(), ballot);
        assert_eq!(
            system.voter_registry.ballot_contract().await.unwrap(),
            Some(ballot)
        );
        assert_eq!(system.ballot.owner().await.unwrap(), admin);
        assert_eq!(system.candidate_manager.owner().await.unwrap(), admin);
        assert_eq!(system.election_manager.owner().await.unwrap(), admin);

        let reattached = VotingSystem::from_results(&ledger, system.results.address())
            .await
            .unwrap();
        assert_eq!(reattached.deployment(), system.deployment());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn attaching_checks_every_kind() {
        let ledger = Ledger::new(
            LedgerConfig::default(),
            Arc::new(ManualClock::new(100)),
            MemoryStorage::empty(),
        )
        .await
        .unwrap();
        let system = VotingSystem::deploy(&ledger, Address::from_low_u64_be(7))
            .await
            .unwrap();
        let mut swapped = system.deployment();
        std::mem::swap(&mut swapped.ballot, &mut swapped.results);

        let err = VotingSystem::attach(&ledger, swapped).await.unwrap_err();
        assert!(err.protocol().is_some());
    }
}
