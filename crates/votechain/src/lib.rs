// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! A ledger-hosted voting protocol
//!
//! The [`Ledger`] is a single, globally serialized state store hosting five kinds of component:
//! a voter registry, a candidate manager, an election manager, a ballot and a results
//! aggregator. Every write is a [`Transaction`]; transactions are grouped into [`Block`]s that
//! share one timestamp, and each transaction is atomic on its own.
//!
//! Committed notifications are delivered through [`Ledger::event_stream`] and retained in
//! [`Ledger::events`].

/// Contains the five components hosted on the ledger
pub mod contracts;
/// Error type for the ledger
pub mod error;
mod journal;
/// Contains the state store
pub mod state;
/// The standard wiring of the five components
pub mod system;
/// Contains traits consumed by [`Ledger`]
pub mod traits;
/// Contains types used by the crate
pub mod types;

use std::{collections::VecDeque, sync::Arc};

use async_broadcast::{broadcast, InactiveReceiver, Receiver, SendError, Sender};
use async_lock::{Mutex, RwLock};
use committable::{Commitment, Committable};
use futures::Stream;
use tracing::{debug, error, instrument, trace, warn};
// -- Rexports
/// Reexport error type
pub use crate::error::LedgerError;
pub use crate::{state::LedgerState, system::VotingSystem, traits::Storage};
pub use votechain_types::{
    data::{Address, Timestamp},
    event::{Event, EventType},
    transaction::{Block, Call, Outcome, Receipt, Transaction},
    traits::Clock,
    LedgerConfig,
};

use crate::journal::Journal;

/// The ledger: a single-writer state store plus its notification stream
///
/// Cloning a `Ledger` is cheap and yields another handle to the same state.
#[derive(Clone)]
pub struct Ledger<S: Storage> {
    /// Configuration items for this ledger
    config: LedgerConfig,

    /// The source of "now" for transactions submitted through [`execute`](Self::execute)
    clock: Arc<dyn Clock>,

    /// The writer's working copy; holding this lock serializes blocks
    working: Arc<Mutex<LedgerState>>,

    /// The latest committed state. Only swapped once a block has been persisted, so readers
    /// never wait on a block in flight.
    committed: Arc<RwLock<Arc<LedgerState>>>,

    /// Committed notifications, oldest first
    history: Arc<RwLock<VecDeque<Event>>>,

    /// Access to the output event stream.
    event_stream: (Sender<Event>, InactiveReceiver<Event>),

    /// Where the state is persisted after every block
    storage: S,
}

impl<S: Storage> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> Ledger<S> {
    /// Creates a new ledger, resuming from the snapshot in `storage` if there is one.
    ///
    /// # Errors
    /// [`LedgerError::Storage`] if the stored snapshot cannot be read
    pub async fn new(
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
        storage: S,
    ) -> Result<Self, LedgerError> {
        let state = storage.load().await?;
        match &state {
            Some(state) => debug!(
                height = state.height(),
                timestamp = state.timestamp(),
                "Resuming ledger from storage"
            ),
            None => debug!("Creating a new ledger"),
        }

        let (mut event_tx, mut event_rx) = broadcast(config.event_channel_size.get());
        // Allow overflow on the channel, otherwise a slow subscriber would block commits.
        event_rx.set_overflow(true);
        event_tx.set_await_active(false);

        let state = state.unwrap_or_default();
        Ok(Self {
            config,
            clock,
            committed: Arc::new(RwLock::new(Arc::new(state.clone()))),
            working: Arc::new(Mutex::new(state)),
            history: Arc::new(RwLock::new(VecDeque::new())),
            event_stream: (event_tx, event_rx.deactivate()),
            storage,
        })
    }

    /// The configuration this ledger was created with
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The storage backend
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// obtains a stream of every notification committed from now on
    pub fn event_stream(&self) -> impl Stream<Item = Event> {
        self.event_stream.1.activate_cloned()
    }

    /// Same as [`event_stream`](Self::event_stream), with the concrete receiver type
    #[must_use]
    pub fn event_stream_known_impl(&self) -> Receiver<Event> {
        self.event_stream.1.activate_cloned()
    }

    /// The retained history of committed notifications, oldest first
    pub async fn events(&self) -> Vec<Event> {
        self.history.read().await.iter().cloned().collect()
    }

    /// The latest committed state
    async fn committed(&self) -> Arc<LedgerState> {
        Arc::clone(&*self.committed.read().await)
    }

    /// Ledger time: the clock, but never earlier than the latest block
    pub async fn now(&self) -> Timestamp {
        let latest = self.committed().await.timestamp();
        self.clock.now().max(latest)
    }

    /// Number of committed blocks
    pub async fn height(&self) -> u64 {
        self.committed().await.height()
    }

    /// Timestamp of the latest committed block
    pub async fn timestamp(&self) -> Timestamp {
        self.committed().await.timestamp()
    }

    /// Commitment to the whole ledger state
    pub async fn commitment(&self) -> Commitment<LedgerState> {
        self.committed().await.commit()
    }

    /// A copy of the whole ledger state
    pub async fn snapshot(&self) -> LedgerState {
        LedgerState::clone(&*self.committed().await)
    }

    /// Run `f` against the committed state
    ///
    /// Never waits for a block in flight; `f` sees the state as of the latest committed block.
    pub async fn read<T>(&self, f: impl FnOnce(&LedgerState) -> T) -> T {
        f(&*self.committed().await)
    }

    /// Runs a single transaction as a block of its own, at the current ledger time.
    ///
    /// A rejected transaction is not an error here; it is reported in the receipt.
    ///
    /// # Errors
    /// [`LedgerError::Storage`] if the block could not be persisted, in which case nothing was
    /// committed
    pub async fn execute(&self, tx: Transaction) -> Result<Receipt, LedgerError> {
        let mut state = self.working.lock().await;
        let timestamp = self.clock.now().max(state.timestamp());
        let mut receipts = self
            .apply_block_locked(
                &mut state,
                Block {
                    timestamp,
                    transactions: vec![tx],
                },
            )
            .await?;
        receipts
            .pop()
            .ok_or_else(|| LedgerError::Storage("Block of one produced no receipt".to_string()))
    }

    /// Runs a single transaction and returns what it produced.
    ///
    /// # Errors
    /// - [`LedgerError::Protocol`] if the transaction was rejected
    /// - [`LedgerError::Storage`] if the block could not be persisted
    pub async fn submit(&self, sender: Address, call: Call) -> Result<Outcome, LedgerError> {
        Ok(self.execute(Transaction::new(sender, call)).await?.outcome?)
    }

    /// Runs every transaction of `block` in order at the block's timestamp.
    ///
    /// Each transaction is atomic on its own; one rejected transaction does not affect the
    /// others. Returns one receipt per transaction.
    ///
    /// # Errors
    /// - [`LedgerError::TimestampRegression`] if the block is older than the latest block
    /// - [`LedgerError::Storage`] if the block could not be persisted, in which case nothing was
    ///   committed
    pub async fn apply_block(&self, block: Block) -> Result<Vec<Receipt>, LedgerError> {
        let mut state = self.working.lock().await;
        self.apply_block_locked(&mut state, block).await
    }

    /// Apply `block` to the working copy while holding the writer lock
    #[instrument(skip_all, target = "Ledger", fields(timestamp = block.timestamp, transactions = block.transactions.len()))]
    async fn apply_block_locked(
        &self,
        state: &mut LedgerState,
        block: Block,
    ) -> Result<Vec<Receipt>, LedgerError> {
        let latest = state.timestamp();
        if block.timestamp < latest {
            return Err(LedgerError::TimestampRegression {
                latest,
                proposed: block.timestamp,
            });
        }

        let mark = state.begin_block(block.timestamp);
        let height = state.height();
        let timestamp = block.timestamp;

        let mut results = Vec::with_capacity(block.transactions.len());
        for tx in &block.transactions {
            let mut journal = Journal::new();
            match state.execute(&mut journal, timestamp, tx) {
                Ok(outcome) => {
                    debug!(sender = %tx.sender, ?outcome, mutations = journal.len(), "Committed transaction");
                    results.push(Ok((outcome, journal)));
                }
                Err(e) => {
                    debug!(sender = %tx.sender, call = ?tx.call, "Rejected transaction: {e}");
                    journal.rollback(state);
                    results.push(Err(e));
                }
            }
        }

        let staged = results
            .iter()
            .filter_map(|result| result.as_ref().ok())
            .map(|(_, journal)| journal.events().len() as u64)
            .sum();
        let mut sequence = state.reserve_sequence(staged);

        if let Err(e) = self.storage.save(state).await {
            error!("Failed to persist block {height}: {e:#}");
            for (_, journal) in results.into_iter().rev().filter_map(Result::ok) {
                journal.rollback(state);
            }
            state.abort_block(mark);
            return Err(e.into());
        }

        let mut receipts = Vec::with_capacity(results.len());
        for result in results {
            let receipt = match result {
                Ok((outcome, journal)) => {
                    let mut events = Vec::new();
                    for (emitter, event) in journal.into_events() {
                        events.push(Event {
                            sequence,
                            height,
                            timestamp,
                            emitter,
                            event,
                        });
                        sequence += 1;
                    }
                    Receipt {
                        height,
                        timestamp,
                        outcome: Ok(outcome),
                        events,
                    }
                }
                Err(e) => Receipt {
                    height,
                    timestamp,
                    outcome: Err(e),
                    events: Vec::new(),
                },
            };
            receipts.push(receipt);
        }

        *self.committed.write().await = Arc::new(state.clone());
        self.publish(&receipts).await;
        Ok(receipts)
    }

    /// Append the committed notifications to the history and broadcast them
    async fn publish(&self, receipts: &[Receipt]) {
        let mut history = self.history.write().await;
        for event in receipts.iter().flat_map(|receipt| receipt.events.iter()) {
            history.push_back(event.clone());
            broadcast_event(event.clone(), &self.event_stream.0).await;
        }
        if let Some(limit) = self.config.event_history_limit {
            while history.len() > limit.get() {
                history.pop_front();
            }
        }
    }
}

/// Broadcast `event` to every active subscriber without ever waiting on a slow one
async fn broadcast_event(event: Event, sender: &Sender<Event>) {
    match sender.broadcast_direct(event).await {
        Ok(None) => (),
        Ok(Some(overflowed)) => {
            warn!(
                sequence = overflowed.sequence,
                "Event sender queue overflow, oldest event removed from queue"
            );
        }
        Err(SendError(e)) => {
            trace!(sequence = e.sequence, "No active subscriber for event");
        }
    }
}
