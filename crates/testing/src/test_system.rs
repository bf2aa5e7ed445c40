// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use std::sync::Arc;

use votechain::{
    types::{CandidateId, ElectionId, NewElection},
    Address, Ledger, LedgerConfig, LedgerError, Timestamp, VotingSystem,
};
use votechain_types::{logging::setup_logging, traits::clock::ManualClock};

use crate::{helpers, test_storage::TestStorage};

/// A ledger driven by a [`ManualClock`], with the standard deployment administered by
/// [`helpers::admin`]
#[derive(Clone, Debug)]
pub struct TestSystem {
    /// Ledger time source; move it to walk elections through their phases
    pub clock: ManualClock,
    /// The storage behind `ledger`
    pub storage: TestStorage,
    /// The ledger
    pub ledger: Ledger<TestStorage>,
    /// The deployed components
    pub system: VotingSystem<TestStorage>,
    /// The administrator
    pub admin: Address,
}

impl TestSystem {
    /// Deploy a system at time `now` with the default configuration
    ///
    /// # Panics
    /// if the ledger cannot be created or the deployment is rejected
    pub async fn new(now: Timestamp) -> Self {
        Self::with_config(LedgerConfig::default(), now).await
    }

    /// Deploy a system at time `now`
    ///
    /// # Panics
    /// if the ledger cannot be created or the deployment is rejected
    pub async fn with_config(config: LedgerConfig, now: Timestamp) -> Self {
        setup_logging();
        let clock = ManualClock::new(now);
        let storage = TestStorage::default();
        let ledger = Ledger::new(config, Arc::new(clock.clone()), storage.clone())
            .await
            .expect("Failed to create ledger");
        let admin = helpers::admin();
        let system = VotingSystem::deploy(&ledger, admin)
            .await
            .expect("Failed to deploy voting system");

        Self {
            clock,
            storage,
            ledger,
            system,
            admin,
        }
    }

    /// Create an election over `[start, end]` with one new candidate per entry of `candidates`,
    /// registered in the given order
    ///
    /// # Panics
    /// if any step is rejected
    pub async fn election(
        &self,
        start: Timestamp,
        end: Timestamp,
        candidates: &[&str],
    ) -> (ElectionId, Vec<CandidateId>) {
        let election = self
            .system
            .election_manager
            .create_election(
                self.admin,
                NewElection {
                    name: format!("Election {start}-{end}"),
                    description: String::new(),
                    start_time: start,
                    end_time: end,
                    whitelist: Vec::new(),
                },
            )
            .await
            .expect("Failed to create election");

        let mut ids = Vec::with_capacity(candidates.len());
        for name in candidates {
            let id = self
                .system
                .candidate_manager
                .add_candidate(self.admin, *name, format!("{name} for office"), None)
                .await
                .expect("Failed to add candidate");
            self.system
                .election_manager
                .register_candidate_in_election(self.admin, election, id)
                .await
                .expect("Failed to register candidate");
            ids.push(id);
        }
        (election, ids)
    }

    /// Issue one voting right per entry of `voters` through the ballot
    ///
    /// # Panics
    /// if the ballot rejects the registration
    pub async fn grant(&self, election: ElectionId, voters: &[Address]) {
        self.system
            .ballot
            .add_voters(self.admin, election, voters.to_vec())
            .await
            .expect("Failed to add voters");
    }

    /// Cast `voter`'s vote
    ///
    /// # Errors
    /// whatever the ballot rejects the vote with
    pub async fn vote(
        &self,
        voter: Address,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<(), LedgerError> {
        self.system.ballot.vote(voter, election, candidate).await
    }

    /// Unspent rights of `voter`
    ///
    /// # Panics
    /// if the registry is gone
    pub async fn rights(&self, election: ElectionId, voter: Address) -> u64 {
        self.system
            .voter_registry
            .balance_of(voter, election)
            .await
            .expect("Failed to read voting rights")
    }

    /// Tally of `candidate`
    ///
    /// # Panics
    /// if the ballot is gone
    pub async fn votes(&self, election: ElectionId, candidate: CandidateId) -> u64 {
        self.system
            .ballot
            .get_votes(election, candidate)
            .await
            .expect("Failed to read tally")
    }
}
