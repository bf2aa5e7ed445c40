// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Typed handles to the components deployed on a [`Ledger`]
//!
//! A handle pairs a ledger with the address of one component. Reads run against the committed
//! state; writes are submitted as single transactions and return once committed or rejected.

use votechain_types::{
    data::{
        Address, Candidate, CandidateId, CandidateResult, Election, ElectionId, ElectionPhase,
        ElectionResult,
    },
    error::ProtocolError,
    transaction::{Call, Outcome},
};

use crate::{
    contracts::{
        election_manager::NewElection, Ballot, CandidateManager, ElectionManager, Results,
        VoterRegistry,
    },
    Ledger, LedgerError, Storage,
};

/// Declares a handle type for one kind of component
macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $contract:ident, $accessor:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name<S: Storage> {
            /// The hosting ledger
            ledger: Ledger<S>,
            /// Where the component is deployed
            address: Address,
        }

        impl<S: Storage> $name<S> {
            /// Where the component is deployed
            #[must_use]
            pub fn address(&self) -> Address {
                self.address
            }

            /// The hosting ledger
            #[must_use]
            pub fn ledger(&self) -> &Ledger<S> {
                &self.ledger
            }

            /// Run `f` against the component in the committed state
            async fn read<T>(
                &self,
                f: impl FnOnce(&$contract) -> Result<T, ProtocolError>,
            ) -> Result<T, LedgerError> {
                let address = self.address;
                Ok(self
                    .ledger
                    .read(|state| state.$accessor(address).and_then(f))
                    .await?)
            }
        }
    };
}

/// Adds the [`Authority`](crate::contracts::Authority) operations to a handle
macro_rules! owned {
    ($name:ident) => {
        impl<S: Storage> $name<S> {
            /// The current owner
            ///
            /// # Errors
            /// If the component is not deployed at this address
            pub async fn owner(&self) -> Result<Address, LedgerError> {
                self.read(|c| Ok(c.owner())).await
            }

            /// Hand ownership to `new_owner`
            ///
            /// # Errors
            /// If `sender` is not the owner or `new_owner` is the zero address
            pub async fn transfer_ownership(
                &self,
                sender: Address,
                new_owner: Address,
            ) -> Result<(), LedgerError> {
                self.ledger
                    .submit(
                        sender,
                        Call::TransferOwnership {
                            target: self.address,
                            new_owner,
                        },
                    )
                    .await
                    .map(drop)
            }
        }
    };
}

handle!(
    /// Handle to a deployed [`VoterRegistry`]
    VoterRegistryHandle,
    VoterRegistry,
    voter_registry
);
owned!(VoterRegistryHandle);

handle!(
    /// Handle to a deployed [`CandidateManager`]
    CandidateManagerHandle,
    CandidateManager,
    candidate_manager
);
owned!(CandidateManagerHandle);

handle!(
    /// Handle to a deployed [`ElectionManager`]
    ElectionManagerHandle,
    ElectionManager,
    election_manager
);
owned!(ElectionManagerHandle);

handle!(
    /// Handle to a deployed [`Ballot`]
    BallotHandle,
    Ballot,
    ballot
);
owned!(BallotHandle);

handle!(
    /// Handle to a deployed [`Results`](crate::contracts::Results) aggregator
    ResultsHandle,
    Results,
    results
);

/// Address of a deployment outcome
fn deployed(outcome: Outcome) -> Result<Address, LedgerError> {
    match outcome {
        Outcome::Deployed { address } => Ok(address),
        other => Err(LedgerError::UnexpectedOutcome(other)),
    }
}

impl<S: Storage> VoterRegistryHandle<S> {
    /// Unspent rights of `voter` in `election`
    ///
    /// # Errors
    /// If the registry is not deployed at this address
    pub async fn balance_of(&self, voter: Address, election: ElectionId) -> Result<u64, LedgerError> {
        self.read(|c| Ok(c.balance_of(voter, election))).await
    }

    /// Whether `voter` holds an unspent right in `election`
    ///
    /// # Errors
    /// If the registry is not deployed at this address
    pub async fn is_eligible(&self, election: ElectionId, voter: Address) -> Result<bool, LedgerError> {
        self.read(|c| Ok(c.is_eligible(election, voter))).await
    }

    /// The contract allowed to burn rights
    ///
    /// # Errors
    /// If the registry is not deployed at this address
    pub async fn ballot_contract(&self) -> Result<Option<Address>, LedgerError> {
        self.read(|c| Ok(c.ballot_contract())).await
    }

    /// Issue one right per entry of `voters`
    ///
    /// # Errors
    /// If `sender` is not the owner, or a right count would overflow
    pub async fn register_voters(
        &self,
        sender: Address,
        election: ElectionId,
        voters: Vec<Address>,
    ) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::RegisterVoters {
                    target: self.address,
                    election,
                    voters,
                },
            )
            .await
            .map(drop)
    }

    /// Delegate the burn capability to `ballot`
    ///
    /// # Errors
    /// If `sender` is not the owner
    pub async fn set_ballot_contract(&self, sender: Address, ballot: Address) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::SetBallotContract {
                    target: self.address,
                    ballot,
                },
            )
            .await
            .map(drop)
    }

    /// Withdraw the burn capability
    ///
    /// # Errors
    /// If `sender` is not the owner
    pub async fn revoke_ballot_contract(&self, sender: Address) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::RevokeBallotContract {
                    target: self.address,
                },
            )
            .await
            .map(drop)
    }

    /// Burn one right of `voter`
    ///
    /// # Errors
    /// If `sender` is not the delegated ballot, or `voter` has no right left
    pub async fn use_voting_token(
        &self,
        sender: Address,
        election: ElectionId,
        voter: Address,
    ) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::UseVotingToken {
                    target: self.address,
                    election,
                    voter,
                },
            )
            .await
            .map(drop)
    }
}

impl<S: Storage> CandidateManagerHandle<S> {
    /// Create a candidate, returning its id
    ///
    /// # Errors
    /// If `sender` is not the owner
    pub async fn add_candidate(
        &self,
        sender: Address,
        name: impl Into<String>,
        description: impl Into<String>,
        metadata_uri: Option<String>,
    ) -> Result<CandidateId, LedgerError> {
        let outcome = self
            .ledger
            .submit(
                sender,
                Call::AddCandidate {
                    target: self.address,
                    name: name.into(),
                    description: description.into(),
                    metadata_uri,
                },
            )
            .await?;
        match outcome {
            Outcome::CandidateAdded { id } => Ok(id),
            other => Err(LedgerError::UnexpectedOutcome(other)),
        }
    }

    /// Look up a candidate
    ///
    /// # Errors
    /// "Candidate does not exist" if `id` was never assigned
    pub async fn get_candidate(&self, id: CandidateId) -> Result<Candidate, LedgerError> {
        self.read(|c| c.get_candidate(id).cloned()).await
    }

    /// Whether `id` was assigned
    ///
    /// # Errors
    /// If the manager is not deployed at this address
    pub async fn candidate_exists(&self, id: CandidateId) -> Result<bool, LedgerError> {
        self.read(|c| Ok(c.candidate_exists(id))).await
    }

    /// Number of candidates created
    ///
    /// # Errors
    /// If the manager is not deployed at this address
    pub async fn candidate_count(&self) -> Result<u64, LedgerError> {
        self.read(|c| Ok(c.candidate_count())).await
    }

    /// Every candidate, in id order
    ///
    /// # Errors
    /// If the manager is not deployed at this address
    pub async fn candidates(&self) -> Result<Vec<Candidate>, LedgerError> {
        self.read(|c| Ok(c.candidates().cloned().collect())).await
    }
}

impl<S: Storage> ElectionManagerHandle<S> {
    /// Create an election, returning its id
    ///
    /// # Errors
    /// If `sender` is not the owner or the window is invalid
    pub async fn create_election(
        &self,
        sender: Address,
        election: NewElection,
    ) -> Result<ElectionId, LedgerError> {
        let outcome = self
            .ledger
            .submit(
                sender,
                Call::CreateElection {
                    target: self.address,
                    name: election.name,
                    description: election.description,
                    start_time: election.start_time,
                    end_time: election.end_time,
                    whitelist: election.whitelist,
                },
            )
            .await?;
        match outcome {
            Outcome::ElectionCreated { id } => Ok(id),
            other => Err(LedgerError::UnexpectedOutcome(other)),
        }
    }

    /// Register `candidate` into `election`
    ///
    /// # Errors
    /// If `sender` is not the owner or the election does not exist
    pub async fn register_candidate_in_election(
        &self,
        sender: Address,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::RegisterCandidateInElection {
                    target: self.address,
                    election,
                    candidate,
                },
            )
            .await
            .map(drop)
    }

    /// Look up an election
    ///
    /// # Errors
    /// "No such election" if `id` was never assigned
    pub async fn get_election(&self, id: ElectionId) -> Result<Election, LedgerError> {
        self.read(|c| c.get_election(id).cloned()).await
    }

    /// The whitelist of an election
    ///
    /// # Errors
    /// "No such election" if `id` was never assigned
    pub async fn get_whitelist(&self, id: ElectionId) -> Result<Vec<Address>, LedgerError> {
        self.read(|c| c.get_whitelist(id).map(<[Address]>::to_vec))
            .await
    }

    /// The candidates of an election, in registration order
    ///
    /// # Errors
    /// "No such election" if `id` was never assigned
    pub async fn get_election_candidates(
        &self,
        id: ElectionId,
    ) -> Result<Vec<CandidateId>, LedgerError> {
        self.read(|c| c.get_election_candidates(id).map(<[CandidateId]>::to_vec))
            .await
    }

    /// Number of elections created
    ///
    /// # Errors
    /// If the manager is not deployed at this address
    pub async fn election_count(&self) -> Result<u64, LedgerError> {
        self.read(|c| Ok(c.election_count())).await
    }

    /// The phase of an election at the current ledger time
    ///
    /// # Errors
    /// "No such election" if `id` was never assigned
    pub async fn election_phase(&self, id: ElectionId) -> Result<ElectionPhase, LedgerError> {
        let now = self.ledger.now().await;
        self.read(|c| c.election_phase(id, now)).await
    }
}

impl<S: Storage> BallotHandle<S> {
    /// Issue voting rights through the registry this ballot owns
    ///
    /// # Errors
    /// If `sender` is not the owner, or the ballot does not own its registry
    pub async fn add_voters(
        &self,
        sender: Address,
        election: ElectionId,
        voters: Vec<Address>,
    ) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::AddVoters {
                    target: self.address,
                    election,
                    voters,
                },
            )
            .await
            .map(drop)
    }

    /// Cast `sender`'s vote
    ///
    /// # Errors
    /// "Not active", "Candidate not in election" or "No voting token", among others
    pub async fn vote(
        &self,
        sender: Address,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<(), LedgerError> {
        self.ledger
            .submit(
                sender,
                Call::Vote {
                    target: self.address,
                    election,
                    candidate,
                },
            )
            .await
            .map(drop)
    }

    /// Votes for `candidate` in `election`
    ///
    /// # Errors
    /// If the ballot is not deployed at this address
    pub async fn get_votes(&self, election: ElectionId, candidate: CandidateId) -> Result<u64, LedgerError> {
        self.read(|c| Ok(c.get_votes(election, candidate))).await
    }

    /// Whether `voter` has voted in `election`
    ///
    /// # Errors
    /// If the ballot is not deployed at this address
    pub async fn has_voted(&self, election: ElectionId, voter: Address) -> Result<bool, LedgerError> {
        self.read(|c| Ok(c.has_voted(election, voter))).await
    }

    /// The registry this ballot burns rights in
    ///
    /// # Errors
    /// If the ballot is not deployed at this address
    pub async fn voter_registry(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.voter_registry())).await
    }

    /// The candidate manager this ballot reads
    ///
    /// # Errors
    /// If the ballot is not deployed at this address
    pub async fn candidate_manager(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.candidate_manager())).await
    }

    /// The election manager this ballot reads
    ///
    /// # Errors
    /// If the ballot is not deployed at this address
    pub async fn election_manager(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.election_manager())).await
    }
}

impl<S: Storage> ResultsHandle<S> {
    /// Pair each of `candidates` with its tally in `election`
    ///
    /// # Errors
    /// If the aggregator or its ballot is not deployed
    pub async fn get_election_results(
        &self,
        election: ElectionId,
        candidates: &[CandidateId],
    ) -> Result<Vec<ElectionResult>, LedgerError> {
        let address = self.address;
        Ok(self
            .ledger
            .read(|state| {
                state
                    .results(address)?
                    .get_election_results(state, election, candidates)
            })
            .await?)
    }

    /// Every candidate of `election` with its name and tally
    ///
    /// # Errors
    /// "No such election" or "Candidate does not exist"
    pub async fn get_full_results(
        &self,
        election: ElectionId,
    ) -> Result<Vec<CandidateResult>, LedgerError> {
        let address = self.address;
        Ok(self
            .ledger
            .read(|state| state.results(address)?.get_full_results(state, election))
            .await?)
    }

    /// The ballot this aggregator reads
    ///
    /// # Errors
    /// If the aggregator is not deployed at this address
    pub async fn ballot(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.ballot())).await
    }

    /// The election manager this aggregator reads
    ///
    /// # Errors
    /// If the aggregator is not deployed at this address
    pub async fn election_manager(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.election_manager())).await
    }

    /// The candidate manager this aggregator reads
    ///
    /// # Errors
    /// If the aggregator is not deployed at this address
    pub async fn candidate_manager(&self) -> Result<Address, LedgerError> {
        self.read(|c| Ok(c.candidate_manager())).await
    }
}

impl<S: Storage> Ledger<S> {
    /// Deploy a [`VoterRegistry`] owned by `sender`
    ///
    /// # Errors
    /// If the deployment is rejected or cannot be persisted
    pub async fn deploy_voter_registry(
        &self,
        sender: Address,
    ) -> Result<VoterRegistryHandle<S>, LedgerError> {
        let address = deployed(self.submit(sender, Call::DeployVoterRegistry).await?)?;
        Ok(VoterRegistryHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Deploy a [`CandidateManager`] owned by `sender`
    ///
    /// # Errors
    /// If the deployment is rejected or cannot be persisted
    pub async fn deploy_candidate_manager(
        &self,
        sender: Address,
    ) -> Result<CandidateManagerHandle<S>, LedgerError> {
        let address = deployed(self.submit(sender, Call::DeployCandidateManager).await?)?;
        Ok(CandidateManagerHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Deploy an [`ElectionManager`] owned by `sender`
    ///
    /// # Errors
    /// If the deployment is rejected or cannot be persisted
    pub async fn deploy_election_manager(
        &self,
        sender: Address,
    ) -> Result<ElectionManagerHandle<S>, LedgerError> {
        let address = deployed(self.submit(sender, Call::DeployElectionManager).await?)?;
        Ok(ElectionManagerHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Deploy a [`Ballot`] owned by `sender`, wired to the given components
    ///
    /// # Errors
    /// "No such contract" if an address does not host a component of the expected kind
    pub async fn deploy_ballot(
        &self,
        sender: Address,
        voter_registry: Address,
        candidate_manager: Address,
        election_manager: Address,
    ) -> Result<BallotHandle<S>, LedgerError> {
        let call = Call::DeployBallot {
            voter_registry,
            candidate_manager,
            election_manager,
        };
        let address = deployed(self.submit(sender, call).await?)?;
        Ok(BallotHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Deploy a results aggregator over the given components
    ///
    /// # Errors
    /// "No such contract" if an address does not host a component of the expected kind
    pub async fn deploy_results(
        &self,
        sender: Address,
        ballot: Address,
        election_manager: Address,
        candidate_manager: Address,
    ) -> Result<ResultsHandle<S>, LedgerError> {
        let call = Call::DeployResults {
            ballot,
            election_manager,
            candidate_manager,
        };
        let address = deployed(self.submit(sender, call).await?)?;
        Ok(ResultsHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Handle to the [`VoterRegistry`] at `address`
    ///
    /// # Errors
    /// "No such contract" if no registry is deployed there
    pub async fn voter_registry(&self, address: Address) -> Result<VoterRegistryHandle<S>, LedgerError> {
        self.read(|state| state.voter_registry(address).map(drop))
            .await?;
        Ok(VoterRegistryHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Handle to the [`CandidateManager`] at `address`
    ///
    /// # Errors
    /// "No such contract" if no candidate manager is deployed there
    pub async fn candidate_manager(
        &self,
        address: Address,
    ) -> Result<CandidateManagerHandle<S>, LedgerError> {
        self.read(|state| state.candidate_manager(address).map(drop))
            .await?;
        Ok(CandidateManagerHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Handle to the [`ElectionManager`] at `address`
    ///
    /// # Errors
    /// "No such contract" if no election manager is deployed there
    pub async fn election_manager(
        &self,
        address: Address,
    ) -> Result<ElectionManagerHandle<S>, LedgerError> {
        self.read(|state| state.election_manager(address).map(drop))
            .await?;
        Ok(ElectionManagerHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Handle to the [`Ballot`] at `address`
    ///
    /// # Errors
    /// "No such contract" if no ballot is deployed there
    pub async fn ballot(&self, address: Address) -> Result<BallotHandle<S>, LedgerError> {
        self.read(|state| state.ballot(address).map(drop)).await?;
        Ok(BallotHandle {
            ledger: self.clone(),
            address,
        })
    }

    /// Handle to the results aggregator at `address`
    ///
    /// # Errors
    /// "No such contract" if no aggregator is deployed there
    pub async fn results(&self, address: Address) -> Result<ResultsHandle<S>, LedgerError> {
        self.read(|state| state.results(address).map(drop)).await?;
        Ok(ResultsHandle {
            ledger: self.clone(),
            address,
        })
    }
}
