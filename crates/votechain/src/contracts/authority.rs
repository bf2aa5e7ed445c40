// Copyright (c) 2021-2024 Espresso Systems (espressosys.com)
// This file is part of the votechain repository.

// You should have received a copy of the MIT License
// along with the votechain repository. If not, see <https://mit-license.org/>.

//! Single-owner capability shared by every administered contract

use committable::{Commitment, Committable, RawCommitmentBuilder};
use serde::{Deserialize, Serialize};
use votechain_types::{data::Address, error::ProtocolError, event::EventType};

use crate::journal::{Entry, Journal};

/// The owner of a contract
///
/// Each contract holds exactly one `Authority` and checks it before touching any of its tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// The only account allowed to call owner-gated operations
    owner: Address,
}

impl Authority {
    /// Create an authority owned by `owner`
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    /// The current owner
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Check that `caller` is the owner
    ///
    /// # Errors
    /// [`ProtocolError::NotOwner`] for anyone else
    pub fn ensure_owner(&self, caller: Address) -> Result<(), ProtocolError> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(ProtocolError::NotOwner { caller })
        }
    }

    /// Hand ownership of the contract at `contract` to `new_owner`
    pub(crate) fn transfer(
        &mut self,
        contract: Address,
        caller: Address,
        new_owner: Address,
        journal: &mut Journal,
    ) -> Result<(), ProtocolError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(ProtocolError::ZeroOwner);
        }
        journal.record(Entry::Owner {
            address: contract,
            previous: self.owner,
        });
        journal.emit(
            contract,
            EventType::OwnershipTransferred {
                previous: self.owner,
                new: new_owner,
            },
        );
        self.owner = new_owner;
        Ok(())
    }

    /// Undo a transfer
    pub(crate) fn restore(&mut self, previous: Address) {
        self.owner = previous;
    }
}

impl Committable for Authority {
    fn commit(&self) -> Commitment<Self> {
        RawCommitmentBuilder::new("Authority Commitment")
            .var_size_field("owner", self.owner.as_bytes())
            .finalize()
    }

    fn tag() -> String {
        "AUTHORITY".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_the_owner_can_transfer() {
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);
        let contract = Address::from_low_u64_be(100);
        let mut authority = Authority::new(alice);
        let mut journal = Journal::new();

        assert_eq!(
            authority.transfer(contract, bob, bob, &mut journal),
            Err(ProtocolError::NotOwner { caller: bob })
        );
        assert_eq!(
            authority.transfer(contract, alice, Address::zero(), &mut journal),
            Err(ProtocolError::ZeroOwner)
        );
        assert_eq!(journal.len(), 0);

        authority.transfer(contract, alice, bob, &mut journal).unwrap();
        assert_eq!(authority.owner(), bob);
        assert!(authority.ensure_owner(alice).is_err());
        assert_eq!(journal.len(), 1);
        assert_eq!(
            journal.into_events(),
            vec![(
                contract,
                EventType::OwnershipTransferred {
                    previous: alice,
                    new: bob
                }
            )]
        );
    }
}
