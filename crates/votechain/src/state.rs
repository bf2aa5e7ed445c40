// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! The globally serialized state store
//!
//! [`LedgerState`] owns every deployed component and the deployer nonces. Writes only happen
//! through [`LedgerState::execute`], which routes a [`Call`] to the component it targets and
//! records every mutation in a [`Journal`].

use std::collections::BTreeMap;

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use tracing::error;
use votechain_types::{
    data::{contract_address, Address, ContractKind, Timestamp},
    error::ProtocolError,
    event::EventType,
    transaction::{Call, Outcome, Transaction},
};

use crate::{
    contracts::{
        ballot, election_manager::NewElection, Ballot, CandidateManager, Contract,
        ElectionManager, Results, VoterRegistry,
    },
    journal::{Entry, Journal},
};

/// Generates the typed lookups for one kind of contract
macro_rules! contract_accessors {
    ($kind:ident, $get:ident) => {
        #[doc = concat!("The [`", stringify!($kind), "`] deployed at `address`")]
        ///
        /// # Errors
        /// [`ProtocolError::NoSuchContract`] if nothing of that kind is deployed there
        pub fn $get(&self, address: Address) -> Result<&$kind, ProtocolError> {
            match self.contracts.get(&address) {
                Some(Contract::$kind(c)) => Ok(c),
                _ => Err(ProtocolError::NoSuchContract {
                    address,
                    expected: Some(ContractKind::$kind),
                }),
            }
        }
    };
    ($kind:ident, $get:ident, $get_mut:ident) => {
        contract_accessors!($kind, $get);

        #[doc = concat!("Mutable access to the [`", stringify!($kind), "`] deployed at `address`")]
        pub(crate) fn $get_mut(&mut self, address: Address) -> Result<&mut $kind, ProtocolError> {
            match self.contracts.get_mut(&address) {
                Some(Contract::$kind(c)) => Ok(c),
                _ => Err(ProtocolError::NoSuchContract {
                    address,
                    expected: Some(ContractKind::$kind),
                }),
            }
        }
    };
}

/// Block-level counters as they were before a block was opened
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockMark {
    /// Height before the block
    height: u64,
    /// Latest timestamp before the block
    timestamp: Timestamp,
    /// Committed notification count before the block
    event_count: u64,
}

/// Every table on the ledger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Number of committed blocks
    height: u64,
    /// Timestamp of the latest committed block
    timestamp: Timestamp,
    /// Number of notifications committed so far; the sequence number of the next one
    event_count: u64,
    /// Successful deployments per deployer
    nonces: BTreeMap<Address, u64>,
    /// Deployed components by address
    contracts: BTreeMap<Address, Contract>,
}

impl LedgerState {
    /// Number of committed blocks
    #[must_use]
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Timestamp of the latest committed block
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Number of notifications committed so far
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Number of successful deployments by `deployer`
    #[must_use]
    pub fn nonce(&self, deployer: Address) -> u64 {
        self.nonces.get(&deployer).copied().unwrap_or_default()
    }

    /// The component deployed at `address`, of any kind
    #[must_use]
    pub fn contract(&self, address: Address) -> Option<&Contract> {
        self.contracts.get(&address)
    }

    /// Every deployed component, in address order
    pub fn contracts(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.values()
    }

    contract_accessors!(VoterRegistry, voter_registry, voter_registry_mut);
    contract_accessors!(CandidateManager, candidate_manager, candidate_manager_mut);
    contract_accessors!(ElectionManager, election_manager, election_manager_mut);
    contract_accessors!(Ballot, ballot, ballot_mut);
    contract_accessors!(Results, results);

    /// Open a new block at `timestamp`, returning what [`abort_block`](Self::abort_block) needs
    pub(crate) fn begin_block(&mut self, timestamp: Timestamp) -> BlockMark {
        let mark = BlockMark {
            height: self.height,
            timestamp: self.timestamp,
            event_count: self.event_count,
        };
        self.height += 1;
        self.timestamp = timestamp;
        mark
    }

    /// Undo [`begin_block`](Self::begin_block) and any sequence numbers reserved since
    pub(crate) fn abort_block(&mut self, mark: BlockMark) {
        self.height = mark.height;
        self.timestamp = mark.timestamp;
        self.event_count = mark.event_count;
    }

    /// Reserve `count` sequence numbers for newly committed notifications, returning the first
    pub(crate) fn reserve_sequence(&mut self, count: u64) -> u64 {
        let first = self.event_count;
        self.event_count = self.event_count.saturating_add(count);
        first
    }

    /// Run `tx` at ledger time `now`, recording every mutation in `journal`
    ///
    /// On error the state may hold partial mutations; the caller must roll back `journal`.
    pub(crate) fn execute(
        &mut self,
        journal: &mut Journal,
        now: Timestamp,
        tx: &Transaction,
    ) -> Result<Outcome, ProtocolError> {
        let sender = tx.sender;
        match tx.call.clone() {
            Call::DeployVoterRegistry => {
                let address = self.deploy(journal, sender, |address| {
                    Contract::VoterRegistry(VoterRegistry::new(address, sender))
                })?;
                Ok(Outcome::Deployed { address })
            }
            Call::DeployCandidateManager => {
                let address = self.deploy(journal, sender, |address| {
                    Contract::CandidateManager(CandidateManager::new(address, sender))
                })?;
                Ok(Outcome::Deployed { address })
            }
            Call::DeployElectionManager => {
                let address = self.deploy(journal, sender, |address| {
                    Contract::ElectionManager(ElectionManager::new(address, sender))
                })?;
                Ok(Outcome::Deployed { address })
            }
            Call::DeployBallot {
                voter_registry,
                candidate_manager,
                election_manager,
            } => {
                self.voter_registry(voter_registry)?;
                self.candidate_manager(candidate_manager)?;
                self.election_manager(election_manager)?;
                let address = self.deploy(journal, sender, |address| {
                    Contract::Ballot(Ballot::new(
                        address,
                        sender,
                        voter_registry,
                        candidate_manager,
                        election_manager,
                    ))
                })?;
                Ok(Outcome::Deployed { address })
            }
            Call::DeployResults {
                ballot,
                election_manager,
                candidate_manager,
            } => {
                self.ballot(ballot)?;
                self.election_manager(election_manager)?;
                self.candidate_manager(candidate_manager)?;
                let address = self.deploy(journal, sender, |address| {
                    Contract::Results(Results::new(
                        address,
                        ballot,
                        election_manager,
                        candidate_manager,
                    ))
                })?;
                Ok(Outcome::Deployed { address })
            }
            Call::TransferOwnership { target, new_owner } => {
                self.contracts
                    .get_mut(&target)
                    .ok_or(ProtocolError::NoSuchContract {
                        address: target,
                        expected: None,
                    })?
                    .transfer_ownership(sender, new_owner, journal)?;
                Ok(Outcome::Done)
            }
            Call::RegisterVoters {
                target,
                election,
                voters,
            } => {
                self.voter_registry_mut(target)?
                    .register_voters(sender, election, &voters, journal)?;
                Ok(Outcome::Done)
            }
            Call::SetBallotContract { target, ballot } => {
                self.voter_registry_mut(target)?
                    .set_ballot_contract(sender, ballot, journal)?;
                Ok(Outcome::Done)
            }
            Call::RevokeBallotContract { target } => {
                self.voter_registry_mut(target)?
                    .revoke_ballot_contract(sender, journal)?;
                Ok(Outcome::Done)
            }
            Call::UseVotingToken {
                target,
                election,
                voter,
            } => {
                self.voter_registry_mut(target)?
                    .use_voting_token(sender, election, voter, journal)?;
                Ok(Outcome::Done)
            }
            Call::AddCandidate {
                target,
                name,
                description,
                metadata_uri,
            } => {
                let id = self.candidate_manager_mut(target)?.add_candidate(
                    sender,
                    name,
                    description,
                    metadata_uri,
                    journal,
                )?;
                Ok(Outcome::CandidateAdded { id })
            }
            Call::CreateElection {
                target,
                name,
                description,
                start_time,
                end_time,
                whitelist,
            } => {
                let id = self.election_manager_mut(target)?.create_election(
                    sender,
                    now,
                    NewElection {
                        name,
                        description,
                        start_time,
                        end_time,
                        whitelist,
                    },
                    journal,
                )?;
                Ok(Outcome::ElectionCreated { id })
            }
            Call::RegisterCandidateInElection {
                target,
                election,
                candidate,
            } => {
                self.election_manager_mut(target)?
                    .register_candidate_in_election(sender, election, candidate, journal)?;
                Ok(Outcome::Done)
            }
            Call::AddVoters {
                target,
                election,
                voters,
            } => {
                ballot::add_voters(self, journal, target, sender, election, voters)?;
                Ok(Outcome::Done)
            }
            Call::Vote {
                target,
                election,
                candidate,
            } => {
                ballot::vote(self, journal, now, target, sender, election, candidate)?;
                Ok(Outcome::Done)
            }
        }
    }

    /// Deploy the contract built by `build` at the next address of `deployer`
    fn deploy(
        &mut self,
        journal: &mut Journal,
        deployer: Address,
        build: impl FnOnce(Address) -> Contract,
    ) -> Result<Address, ProtocolError> {
        let nonce = self.nonce(deployer);
        let address = contract_address(&deployer, nonce);
        let next_nonce = nonce.checked_add(1).ok_or(ProtocolError::IdsExhausted)?;
        let contract = build(address);
        let kind = contract.kind();

        journal.record(Entry::Deployed {
            address,
            deployer,
            nonce,
        });
        self.nonces.insert(deployer, next_nonce);
        self.contracts.insert(address, contract);
        journal.emit(address, EventType::ContractDeployed { address, kind });
        Ok(address)
    }

    /// Apply one undo entry
    pub(crate) fn revert(&mut self, entry: Entry) {
        match entry {
            Entry::Deployed {
                address,
                deployer,
                nonce,
            } => {
                self.contracts.remove(&address);
                if nonce == 0 {
                    self.nonces.remove(&deployer);
                } else {
                    self.nonces.insert(deployer, nonce);
                }
            }
            Entry::Owner { address, previous } => {
                match self
                    .contracts
                    .get_mut(&address)
                    .and_then(Contract::authority_mut)
                {
                    Some(authority) => authority.restore(previous),
                    None => error!(%address, "Undo of ownership transfer on an unowned contract"),
                }
            }
            Entry::VoterRegistry { address, undo } => match self.voter_registry_mut(address) {
                Ok(c) => c.revert(undo),
                Err(e) => error!(%address, "Undo entry for a missing registry: {e}"),
            },
            Entry::CandidateManager { address, undo } => {
                match self.candidate_manager_mut(address) {
                    Ok(c) => c.revert(undo),
                    Err(e) => error!(%address, "Undo entry for a missing candidate manager: {e}"),
                }
            }
            Entry::ElectionManager { address, undo } => {
                match self.election_manager_mut(address) {
                    Ok(c) => c.revert(undo),
                    Err(e) => error!(%address, "Undo entry for a missing election manager: {e}"),
                }
            }
            Entry::Ballot { address, undo } => match self.ballot_mut(address) {
                Ok(c) => c.revert(undo),
                Err(e) => error!(%address, "Undo entry for a missing ballot: {e}"),
            },
        }
    }
}

impl Committable for LedgerState {
    fn commit(&self) -> Commitment<Self> {
        let mut builder = RawCommitmentBuilder::new("Ledger State Commitment")
            .u64_field("height", self.height)
            .u64_field("timestamp", self.timestamp)
            .u64_field("event count", self.event_count)
            .u64_field("deployers", self.nonces.len() as u64);
        for (deployer, nonce) in &self.nonces {
            builder = builder
                .fixed_size_bytes(deployer.as_fixed_bytes())
                .u64(*nonce);
        }
        builder = builder.u64_field("contracts", self.contracts.len() as u64);
        for contract in self.contracts.values() {
            builder = builder.field("contract", contract.commit());
        }
        builder.finalize()
    }

    fn tag() -> String {
        "LEDGER_STATE".to_string()
    }
}
