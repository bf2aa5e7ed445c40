// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

#![allow(clippy::panic)]

use std::time::Duration;

use futures::StreamExt;
use votechain::{Event, EventType};
use votechain_testing::{
    helpers::{votes_cast, voters},
    TestSystem,
};

const START: u64 = 2_000;
const END: u64 = 3_000;

#[tokio::test(flavor = "multi_thread")]
async fn subscribers_see_every_committed_event_in_order() {
    let test = TestSystem::new(1_000).await;
    let stream = test.ledger.event_stream();
    let deployed = test.ledger.events().await.len();

    let (election, candidates) = test.election(START, END, &["Alice", "Bob"]).await;
    let electorate = voters(2);
    test.grant(election, &electorate).await;
    test.clock.set(START);
    test.vote(electorate[0], election, candidates[1]).await.unwrap();
    test.vote(electorate[1], election, candidates[0]).await.unwrap();
    // Rejected: nothing is published for it.
    assert!(test
        .vote(electorate[1], election, candidates[0])
        .await
        .is_err());

    let history = test.ledger.events().await;
    let expected = history.len() - deployed;
    let received: Vec<Event> = tokio::time::timeout(
        Duration::from_secs(10),
        stream.take(expected).collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    assert_eq!(received, history[deployed..]);

    for pair in received.windows(2) {
        assert_eq!(pair[1].sequence, pair[0].sequence + 1);
        assert!(pair[1].height >= pair[0].height);
    }
    assert_eq!(
        votes_cast(&received),
        vec![
            (election, candidates[1], electorate[0]),
            (election, candidates[0], electorate[1]),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn notifications_carry_the_records_they_describe() {
    let test = TestSystem::new(1_000).await;
    let deployed = test.ledger.events().await.len();
    let (election, candidates) = test.election(START, END, &["Alice"]).await;
    let electorate = voters(2);
    test.grant(election, &electorate).await;

    let deployment = test.system.deployment();
    let events = test.ledger.events().await;
    let kinds: Vec<(_, _)> = events[deployed..]
        .iter()
        .map(|e| (e.emitter, e.event.clone()))
        .collect();

    let EventType::ElectionCreated {
        id,
        start_time,
        end_time,
        ..
    } = &kinds[0].1
    else {
        panic!("expected an election, got {:?}", kinds[0]);
    };
    assert_eq!(kinds[0].0, deployment.election_manager);
    assert_eq!((*id, *start_time, *end_time), (election, START, END));

    let EventType::CandidateAdded { candidate } = &kinds[1].1 else {
        panic!("expected a candidate, got {:?}", kinds[1]);
    };
    assert_eq!(kinds[1].0, deployment.candidate_manager);
    assert_eq!(candidate.id, candidates[0]);
    assert_eq!(candidate.name, "Alice");

    assert_eq!(
        kinds[2],
        (
            deployment.election_manager,
            EventType::CandidateRegistered {
                election,
                candidate: candidates[0]
            }
        )
    );
    // The registry announces each right before the ballot announces the batch.
    assert_eq!(
        kinds[3..],
        [
            (
                deployment.voter_registry,
                EventType::VoterRegistered {
                    election,
                    voter: electorate[0]
                }
            ),
            (
                deployment.voter_registry,
                EventType::VoterRegistered {
                    election,
                    voter: electorate[1]
                }
            ),
            (
                deployment.ballot,
                EventType::VotersAdded {
                    election,
                    voters: electorate.clone()
                }
            ),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn deployment_is_announced() {
    let test = TestSystem::new(1_000).await;
    let deployment = test.system.deployment();
    let events = test.ledger.events().await;

    let deployed: Vec<_> = events
        .iter()
        .filter_map(|e| match e.event {
            EventType::ContractDeployed { address, .. } => Some(address),
            _ => None,
        })
        .collect();
    assert_eq!(
        deployed,
        vec![
            deployment.voter_registry,
            deployment.candidate_manager,
            deployment.election_manager,
            deployment.ballot,
            deployment.results,
        ]
    );
    assert!(events.iter().any(|e| e.event
        == EventType::BallotContractSet {
            ballot: deployment.ballot
        }));
    assert!(events.iter().any(|e| e.event
        == EventType::OwnershipTransferred {
            previous: test.admin,
            new: deployment.ballot
        }));
}
