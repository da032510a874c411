//! Owner registry
//!
//! Holds the owner set and the quorum threshold. The registry is only
//! built from scratch once; afterwards it changes exclusively through
//! [`OwnerChange`]s carried by executed administrative transactions.

use crate::crypto::Address;
use crate::multisig::error::{MultisigError, MultisigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default cap on the number of owners
pub const MAX_OWNER_COUNT: usize = 50;

/// A mutation of the owner set or threshold
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OwnerChange {
    /// Add a new owner
    AddOwner { owner: Address },
    /// Remove an existing owner
    RemoveOwner { owner: Address },
    /// Swap an existing owner for a new one
    ReplaceOwner { old: Address, new: Address },
    /// Change the number of confirmations required
    ChangeRequirement { required: usize },
}

impl OwnerChange {
    /// Owner that leaves the set when this change applies, if any
    pub fn departing_owner(&self) -> Option<Address> {
        match self {
            OwnerChange::RemoveOwner { owner } => Some(*owner),
            OwnerChange::ReplaceOwner { old, .. } => Some(*old),
            _ => None,
        }
    }

    /// Stable byte encoding, used as the payload of administrative transactions
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + 2 * Address::LEN);
        match self {
            OwnerChange::AddOwner { owner } => {
                out.push(0x01);
                out.extend_from_slice(owner.as_bytes());
            }
            OwnerChange::RemoveOwner { owner } => {
                out.push(0x02);
                out.extend_from_slice(owner.as_bytes());
            }
            OwnerChange::ReplaceOwner { old, new } => {
                out.push(0x03);
                out.extend_from_slice(old.as_bytes());
                out.extend_from_slice(new.as_bytes());
            }
            OwnerChange::ChangeRequirement { required } => {
                out.push(0x04);
                out.extend_from_slice(&(*required as u64).to_be_bytes());
            }
        }
        out
    }
}

impl fmt::Display for OwnerChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerChange::AddOwner { owner } => write!(f, "add owner {}", owner),
            OwnerChange::RemoveOwner { owner } => write!(f, "remove owner {}", owner),
            OwnerChange::ReplaceOwner { old, new } => {
                write!(f, "replace owner {} with {}", old, new)
            }
            OwnerChange::ChangeRequirement { required } => {
                write!(f, "change requirement to {}", required)
            }
        }
    }
}

/// Owner set and quorum threshold
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerRegistry {
    /// Owners in registration order
    owners: Vec<Address>,
    /// Confirmations required to execute
    required: usize,
    /// Upper bound on the owner count
    max_owners: usize,
}

impl OwnerRegistry {
    /// Create a registry with the default owner cap
    ///
    /// # Errors
    /// Returns `Config` if owners is empty, has duplicates or the null
    /// address, or if `required` is outside `1..=owners.len()`.
    pub fn new(owners: Vec<Address>, required: usize) -> MultisigResult<Self> {
        Self::with_max_owners(owners, required, MAX_OWNER_COUNT)
    }

    /// Create a registry with an explicit owner cap
    pub fn with_max_owners(
        owners: Vec<Address>,
        required: usize,
        max_owners: usize,
    ) -> MultisigResult<Self> {
        let registry = Self {
            owners,
            required,
            max_owners,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Check every registry invariant
    pub fn validate(&self) -> MultisigResult<()> {
        if self.owners.is_empty() {
            return Err(MultisigError::config("owner set must not be empty"));
        }

        if self.owners.len() > self.max_owners {
            return Err(MultisigError::config(format!(
                "owner count {} exceeds maximum {}",
                self.owners.len(),
                self.max_owners
            )));
        }

        let mut seen = HashSet::with_capacity(self.owners.len());
        for owner in &self.owners {
            if owner.is_zero() {
                return Err(MultisigError::config("null address cannot be an owner"));
            }
            if !seen.insert(owner) {
                return Err(MultisigError::config(format!("duplicate owner {}", owner)));
            }
        }

        Self::check_requirement(self.owners.len(), self.required)
    }

    fn check_requirement(owner_count: usize, required: usize) -> MultisigResult<()> {
        if required == 0 {
            return Err(MultisigError::config("required must be at least 1"));
        }
        if required > owner_count {
            return Err(MultisigError::config(format!(
                "required {} exceeds owner count {}",
                required, owner_count
            )));
        }
        Ok(())
    }

    /// Check if an address is a current owner
    pub fn is_owner(&self, id: &Address) -> bool {
        self.owners.contains(id)
    }

    /// Fail with `NotOwner` unless `caller` is a current owner
    pub fn ensure_owner(&self, caller: &Address) -> MultisigResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(MultisigError::NotOwner(*caller))
        }
    }

    /// Confirmations required to execute
    pub fn required(&self) -> usize {
        self.required
    }

    /// Number of current owners
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Current owners in registration order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Owner cap
    pub fn max_owners(&self) -> usize {
        self.max_owners
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.required, self.owners.len())
    }

    /// Check that `change` could be applied to the current state
    pub fn check(&self, change: &OwnerChange) -> MultisigResult<()> {
        match change {
            OwnerChange::AddOwner { owner } => self.check_new_owner(owner),
            OwnerChange::RemoveOwner { owner } => {
                self.ensure_member(owner)?;
                let remaining = self.owners.len() - 1;
                if remaining == 0 {
                    return Err(MultisigError::config("cannot remove the last owner"));
                }
                if self.required > remaining {
                    return Err(MultisigError::config(format!(
                        "removing {} would leave {} owners for requirement {}",
                        owner, remaining, self.required
                    )));
                }
                Ok(())
            }
            OwnerChange::ReplaceOwner { old, new } => {
                self.ensure_member(old)?;
                self.check_candidate(new)
            }
            OwnerChange::ChangeRequirement { required } => {
                Self::check_requirement(self.owners.len(), *required)
            }
        }
    }

    /// Apply `change`, leaving the registry untouched if it is invalid
    pub fn apply(&mut self, change: &OwnerChange) -> MultisigResult<()> {
        self.check(change)?;

        match change {
            OwnerChange::AddOwner { owner } => self.owners.push(*owner),
            OwnerChange::RemoveOwner { owner } => self.owners.retain(|o| o != owner),
            OwnerChange::ReplaceOwner { old, new } => {
                if let Some(slot) = self.owners.iter_mut().find(|o| *o == old) {
                    *slot = *new;
                }
            }
            OwnerChange::ChangeRequirement { required } => self.required = *required,
        }

        log::info!("Owner registry updated: {} ({})", change, self.description());
        Ok(())
    }

    fn ensure_member(&self, owner: &Address) -> MultisigResult<()> {
        if self.is_owner(owner) {
            Ok(())
        } else {
            Err(MultisigError::config(format!("{} is not an owner", owner)))
        }
    }

    fn check_candidate(&self, owner: &Address) -> MultisigResult<()> {
        if owner.is_zero() {
            return Err(MultisigError::config("null address cannot be an owner"));
        }
        if self.is_owner(owner) {
            return Err(MultisigError::config(format!("{} is already an owner", owner)));
        }
        Ok(())
    }

    fn check_new_owner(&self, owner: &Address) -> MultisigResult<()> {
        self.check_candidate(owner)?;
        if self.owners.len() >= self.max_owners {
            return Err(MultisigError::config(format!(
                "owner count would exceed maximum {}",
                self.max_owners
            )));
        }
        Ok(())
    }
}
