//! Owner registry - the fixed set of approvers and the confirmation threshold

use cosign_core::Address;
use std::collections::HashSet;

use crate::error::VaultError;

/// Authorized approvers and the number of confirmations a transfer needs.
///
/// Built once and never changed afterwards. `owners` keeps construction order;
/// `members` is the same set for constant-time lookups.
#[derive(Debug, Clone)]
pub struct OwnerRegistry {
    owners: Vec<Address>,
    members: HashSet<Address>,
    required: usize,
}

impl OwnerRegistry {
    /// Validate candidates and build the registry.
    ///
    /// Checks run in this order: owner count, threshold, then each candidate
    /// (zero address, duplicate) in list order. Nothing is built unless all pass.
    pub fn new(candidates: Vec<Address>, required: usize) -> Result<Self, VaultError> {
        if candidates.is_empty() {
            return Err(VaultError::InvalidOwnerCount);
        }

        if required == 0 || required > candidates.len() {
            return Err(VaultError::InvalidThreshold {
                required,
                owners: candidates.len(),
            });
        }

        let mut members = HashSet::with_capacity(candidates.len());
        for (position, owner) in candidates.iter().enumerate() {
            if owner.is_zero() {
                return Err(VaultError::InvalidOwner { position });
            }
            if !members.insert(*owner) {
                return Err(VaultError::OwnerNotUnique(*owner));
            }
        }

        Ok(Self {
            owners: candidates,
            members,
            required,
        })
    }

    /// Authorization gate used by every protocol operation
    pub fn is_owner(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Fail with `NotOwner` unless the caller is an owner
    pub fn authorize(&self, caller: &Address) -> Result<(), VaultError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(VaultError::NotOwner(*caller))
        }
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    /// Confirmations required to execute
    pub fn required(&self) -> usize {
        self.required
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
