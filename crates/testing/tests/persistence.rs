// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use std::sync::Arc;

use votechain::{
    traits::implementations::FileStorage,
    types::{NewElection, ProtocolError},
    Ledger, LedgerConfig, VotingSystem,
};
use votechain_testing::helpers::{admin, voter};
use votechain_types::{logging::setup_logging, traits::clock::ManualClock};

#[tokio::test(flavor = "multi_thread")]
async fn a_reopened_ledger_picks_up_where_it_stopped() {
    setup_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.bin");
    let clock = ManualClock::new(1_000);
    let v = voter(1);

    let (results, commitment, election, candidate, event_count) = {
        let ledger = Ledger::new(
            LedgerConfig::default(),
            Arc::new(clock.clone()),
            FileStorage::new(&path),
        )
        .await
        .unwrap();
        let system = VotingSystem::deploy(&ledger, admin()).await.unwrap();
        let election = system
            .election_manager
            .create_election(
                admin(),
                NewElection {
                    name: "Referendum".to_string(),
                    description: String::new(),
                    start_time: 1_500,
                    end_time: 2_500,
                    whitelist: vec![v],
                },
            )
            .await
            .unwrap();
        let candidate = system
            .candidate_manager
            .add_candidate(admin(), "Yes", "", None)
            .await
            .unwrap();
        system
            .election_manager
            .register_candidate_in_election(admin(), election, candidate)
            .await
            .unwrap();
        system
            .ballot
            .add_voters(admin(), election, vec![v, v])
            .await
            .unwrap();
        clock.set(1_500);
        system.ballot.vote(v, election, candidate).await.unwrap();

        (
            system.results.address(),
            ledger.commitment().await,
            election,
            candidate,
            ledger.snapshot().await.event_count(),
        )
    };

    let ledger = Ledger::new(
        LedgerConfig::default(),
        Arc::new(clock.clone()),
        FileStorage::new(&path),
    )
    .await
    .unwrap();
    assert_eq!(ledger.commitment().await, commitment);
    assert_eq!(ledger.timestamp().await, 1_500);
    // History lives in memory only.
    assert!(ledger.events().await.is_empty());

    let system = VotingSystem::from_results(&ledger, results).await.unwrap();
    assert_eq!(
        system
            .results
            .get_election_results(election, &[candidate])
            .await
            .unwrap(),
        vec![(candidate, 1)]
    );
    assert_eq!(
        system.voter_registry.balance_of(v, election).await.unwrap(),
        1
    );

    system.ballot.vote(v, election, candidate).await.unwrap();
    let err = system
        .ballot
        .vote(v, election, candidate)
        .await
        .unwrap_err();
    assert_eq!(err.protocol(), Some(&ProtocolError::NoVotingToken));
    let events = ledger.events().await;
    assert_eq!(events[0].sequence, event_count);
}
