// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

use votechain::{
    types::ProtocolError, Block, Call, EventType, LedgerError, Outcome, Transaction,
};
use votechain_testing::{helpers::voter, TestSystem};

const START: u64 = 2_000;
const END: u64 = 3_000;

#[tokio::test(flavor = "multi_thread")]
async fn failed_saves_commit_nothing() {
    let test = TestSystem::new(1_000).await;
    let (election, candidates) = test.election(START, END, &["Alice"]).await;
    let v = voter(1);
    test.grant(election, &[v]).await;
    test.clock.set(START);

    let commitment = test.ledger.commitment().await;
    let height = test.ledger.height().await;
    let history = test.ledger.events().await;
    let saves = test.storage.saves();

    test.storage.set_should_return_err(true);
    let err = test.vote(v, election, candidates[0]).await.unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));

    assert_eq!(test.ledger.commitment().await, commitment);
    assert_eq!(test.ledger.height().await, height);
    assert_eq!(test.ledger.events().await, history);
    assert_eq!(test.storage.saves(), saves);
    assert_eq!(test.rights(election, v).await, 1);
    assert_eq!(test.votes(election, candidates[0]).await, 0);

    test.storage.set_should_return_err(false);
    test.vote(v, election, candidates[0]).await.unwrap();
    assert_eq!(test.ledger.height().await, height + 1);
    assert_eq!(test.storage.saves(), saves + 1);

    // Sequence numbers continue where the last committed block left off.
    let events = test.ledger.events().await;
    let resumed = &events[history.len()..];
    assert_eq!(resumed.len(), 2);
    assert_eq!(resumed[0].sequence, history.len() as u64);
    assert_eq!(resumed[1].sequence, history.len() as u64 + 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn transactions_in_a_block_stand_alone() {
    let test = TestSystem::new(1_000).await;
    let (election, candidates) = test.election(START, END, &["Alice", "Bob"]).await;
    let (good, bad) = (voter(1), voter(2));
    test.grant(election, &[good]).await;
    let ballot = test.system.ballot.address();
    let vote = |sender, candidate| {
        Transaction::new(
            sender,
            Call::Vote {
                target: ballot,
                election,
                candidate,
            },
        )
    };

    let receipts = test
        .ledger
        .apply_block(Block {
            timestamp: START,
            transactions: vec![
                vote(bad, candidates[0]),
                vote(good, candidates[1]),
                vote(good, candidates[0]),
            ],
        })
        .await
        .unwrap();

    assert_eq!(receipts.len(), 3);
    assert_eq!(receipts[0].outcome, Err(ProtocolError::NoVotingToken));
    assert_eq!(receipts[1].outcome, Ok(Outcome::Done));
    assert_eq!(receipts[2].outcome, Err(ProtocolError::NoVotingToken));
    assert!(receipts[0].events.is_empty() && receipts[2].events.is_empty());
    assert!(receipts.iter().all(|r| r.timestamp == START));
    assert!(receipts.iter().all(|r| r.height == receipts[0].height));

    assert_eq!(
        receipts[1]
            .events
            .iter()
            .map(|e| e.event.clone())
            .collect::<Vec<_>>(),
        vec![
            EventType::VotingTokenUsed {
                election,
                voter: good
            },
            EventType::VoteCasted {
                election,
                candidate: candidates[1],
                voter: good
            },
        ]
    );
    assert_eq!(test.votes(election, candidates[0]).await, 0);
    assert_eq!(test.votes(election, candidates[1]).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_transactions_leave_the_commitment_alone() {
    let test = TestSystem::new(1_000).await;
    let (election, candidates) = test.election(START, END, &["Alice"]).await;
    test.clock.set(START);
    let before = test.ledger.snapshot().await;

    let receipt = test
        .ledger
        .execute(Transaction::new(
            voter(1),
            Call::Vote {
                target: test.system.ballot.address(),
                election,
                candidate: candidates[0],
            },
        ))
        .await
        .unwrap();
    assert!(!receipt.is_success());
    assert!(receipt.events.is_empty());

    // The empty block still counts, but no table changed.
    let after = test.ledger.snapshot().await;
    assert_eq!(after.height(), before.height() + 1);
    for contract in before.contracts() {
        assert_eq!(after.contract(contract.address()), Some(contract));
    }
}
