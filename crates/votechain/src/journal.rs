// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Undo log for a single transaction
//!
//! Every table mutation made while a transaction runs is preceded by an [`Entry`] recording how to
//! undo it, and every notification is staged rather than published. A failed transaction replays
//! the entries in reverse; a committed one hands its staged notifications to the ledger.

use votechain_types::{data::Address, event::EventType};

use crate::{
    contracts::{ballot, candidate_manager, election_manager, voter_registry},
    state::LedgerState,
};

/// How to undo one mutation
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Entry {
    /// A contract was deployed by `deployer`, whose nonce was `nonce` beforehand
    Deployed {
        /// Address of the new contract
        address: Address,
        /// The deploying account
        deployer: Address,
        /// The deployer's nonce before the deployment
        nonce: u64,
    },
    /// Ownership of the contract at `address` moved away from `previous`
    Owner {
        /// The contract
        address: Address,
        /// The owner to restore
        previous: Address,
    },
    /// A `VoterRegistry` table changed
    VoterRegistry {
        /// The registry
        address: Address,
        /// The inverse mutation
        undo: voter_registry::Undo,
    },
    /// A `CandidateManager` table changed
    CandidateManager {
        /// The manager
        address: Address,
        /// The inverse mutation
        undo: candidate_manager::Undo,
    },
    /// An `ElectionManager` table changed
    ElectionManager {
        /// The manager
        address: Address,
        /// The inverse mutation
        undo: election_manager::Undo,
    },
    /// A `Ballot` table changed
    Ballot {
        /// The ballot
        address: Address,
        /// The inverse mutation
        undo: ballot::Undo,
    },
}

/// Undo entries and staged notifications of one transaction
#[derive(Debug, Default)]
pub(crate) struct Journal {
    /// Undo entries, in the order the mutations happened
    entries: Vec<Entry>,
    /// Notifications waiting for the transaction to commit, with their emitter
    staged: Vec<(Address, EventType)>,
}

impl Journal {
    /// Create an empty journal
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record how to undo a mutation that is about to happen
    pub(crate) fn record(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Stage a notification emitted by the contract at `emitter`
    pub(crate) fn emit(&mut self, emitter: Address, event: EventType) {
        self.staged.push((emitter, event));
    }

    /// Notifications staged so far
    pub(crate) fn events(&self) -> &[(Address, EventType)] {
        &self.staged
    }

    /// Number of recorded mutations
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Undo every recorded mutation, newest first, and drop the staged notifications
    pub(crate) fn rollback(self, state: &mut LedgerState) {
        for entry in self.entries.into_iter().rev() {
            state.revert(entry);
        }
    }

    /// Consume a committed journal, yielding its notifications in emission order
    pub(crate) fn into_events(self) -> Vec<(Address, EventType)> {
        self.staged
    }
}
