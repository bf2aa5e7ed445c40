// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use votechain::{
    types::{CandidateId, ElectionId, ErrorKind, NewElection, ProtocolError},
    Address, LedgerError,
};
use votechain_testing::{helpers::voter, TestSystem};

fn window(start: u64, end: u64) -> NewElection {
    NewElection {
        name: "Council".to_string(),
        description: String::new(),
        start_time: start,
        end_time: end,
        whitelist: Vec::new(),
    }
}

fn kind(err: &LedgerError) -> Option<ErrorKind> {
    err.protocol().map(ProtocolError::kind)
}

#[tokio::test(flavor = "multi_thread")]
async fn ids_count_successful_creations_only() {
    let test = TestSystem::new(1_000).await;
    let elections = &test.system.election_manager;
    let people = &test.system.candidate_manager;
    let outsider = voter(1);

    assert_eq!(
        people.add_candidate(test.admin, "A", "", None).await.unwrap(),
        CandidateId::new(1)
    );
    assert!(people.add_candidate(outsider, "B", "", None).await.is_err());
    assert_eq!(
        people.add_candidate(test.admin, "C", "", None).await.unwrap(),
        CandidateId::new(2)
    );
    assert_eq!(people.candidate_count().await.unwrap(), 2);

    assert_eq!(
        elections
            .create_election(test.admin, window(2_000, 3_000))
            .await
            .unwrap(),
        ElectionId::new(1)
    );
    let err = elections
        .create_election(test.admin, window(3_000, 3_000))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "End must be after start");
    let err = elections
        .create_election(test.admin, window(500, 900))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "End must be in future");
    assert!(elections
        .create_election(outsider, window(2_000, 3_000))
        .await
        .is_err());
    assert_eq!(
        elections
            .create_election(test.admin, window(2_000, 3_000))
            .await
            .unwrap(),
        ElectionId::new(2)
    );
    assert_eq!(elections.election_count().await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn end_must_be_strictly_in_the_future() {
    let test = TestSystem::new(1_000).await;
    let elections = &test.system.election_manager;

    let err = elections
        .create_election(test.admin, window(0, 1_000))
        .await
        .unwrap_err();
    assert_eq!(err.protocol(), Some(&ProtocolError::EndNotInFuture));
    assert_eq!(kind(&err), Some(ErrorKind::Validation));

    // Elections may start in the past.
    elections
        .create_election(test.admin, window(0, 1_001))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn owner_checks_come_first() {
    let test = TestSystem::new(1_000).await;
    let outsider = voter(1);

    // Invalid input from a non-owner is an authorization failure, not a validation one.
    let err = test
        .system
        .election_manager
        .create_election(outsider, window(3_000, 2_000))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Caller is not the owner");
    assert_eq!(kind(&err), Some(ErrorKind::Authorization));

    let err = test
        .system
        .election_manager
        .register_candidate_in_election(outsider, ElectionId::new(5), CandidateId::FIRST)
        .await
        .unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::Authorization));

    let err = test
        .system
        .ballot
        .add_voters(outsider, ElectionId::FIRST, vec![outsider])
        .await
        .unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::Authorization));
}

#[tokio::test(flavor = "multi_thread")]
async fn the_registry_belongs_to_the_ballot() {
    let test = TestSystem::new(1_000).await;
    let registry = &test.system.voter_registry;
    let v = voter(1);

    let err = registry
        .register_voters(test.admin, ElectionId::FIRST, vec![v])
        .await
        .unwrap_err();
    assert_eq!(
        err.protocol(),
        Some(&ProtocolError::NotOwner { caller: test.admin })
    );
    assert!(registry.revoke_ballot_contract(test.admin).await.is_err());
    assert!(registry
        .transfer_ownership(test.admin, test.admin)
        .await
        .is_err());

    // Only the delegated ballot may burn rights, whoever owns the registry.
    let err = registry
        .use_voting_token(test.admin, ElectionId::FIRST, v)
        .await
        .unwrap_err();
    assert_eq!(err.protocol(), Some(&ProtocolError::NotAuthorized));
    assert_eq!(err.to_string(), "Not authorized");
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_voter_lists_change_nothing() {
    let test = TestSystem::new(1_000).await;
    let (election, _) = test.election(2_000, 3_000, &["Alice"]).await;
    let registry = test.system.voter_registry.address();
    let before = test.ledger.snapshot().await;
    let events_before = test.ledger.events().await.len();

    test.system
        .ballot
        .add_voters(test.admin, election, Vec::new())
        .await
        .unwrap();

    let after = test.ledger.snapshot().await;
    assert_eq!(after.contract(registry), before.contract(registry));
    // The ballot still reports the (empty) batch.
    let events = test.ledger.events().await;
    assert_eq!(events.len(), events_before + 1);
    assert!(matches!(
        events[events_before].event,
        votechain::EventType::VotersAdded { ref voters, .. } if voters.is_empty()
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn ownership_can_be_handed_over() {
    let test = TestSystem::new(1_000).await;
    let people = &test.system.candidate_manager;
    let successor = voter(9);

    let err = people
        .transfer_ownership(test.admin, Address::zero())
        .await
        .unwrap_err();
    assert_eq!(err.protocol(), Some(&ProtocolError::ZeroOwner));

    people
        .transfer_ownership(test.admin, successor)
        .await
        .unwrap();
    assert_eq!(people.owner().await.unwrap(), successor);
    assert!(people.add_candidate(test.admin, "A", "", None).await.is_err());
    people
        .add_candidate(successor, "A", "", None)
        .await
        .unwrap();

    let err = people
        .transfer_ownership(test.admin, test.admin)
        .await
        .unwrap_err();
    assert_eq!(
        err.protocol(),
        Some(&ProtocolError::NotOwner { caller: test.admin })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn results_have_no_owner() {
    let test = TestSystem::new(1_000).await;
    let err = test
        .ledger
        .submit(
            test.admin,
            votechain::Call::TransferOwnership {
                target: test.system.results.address(),
                new_owner: voter(1),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::Authorization));
}

#[tokio::test(flavor = "multi_thread")]
async fn handles_check_what_they_point_at() {
    let test = TestSystem::new(1_000).await;
    let deployment = test.system.deployment();

    let err = test.ledger.ballot(deployment.results).await.unwrap_err();
    assert_eq!(kind(&err), Some(ErrorKind::NotFound));
    assert!(test
        .ledger
        .voter_registry(Address::repeat_byte(0x42))
        .await
        .is_err());

    let err = test
        .ledger
        .deploy_ballot(
            test.admin,
            deployment.candidate_manager,
            deployment.candidate_manager,
            deployment.election_manager,
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No such contract");
}
