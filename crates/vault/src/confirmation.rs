//! Confirmation tracker - per-transaction, per-owner approval bits
//!
//! The counter on each `Transaction` is only ever changed here, in the same
//! step that flips the owner's bit, so `num_confirmations` always equals the
//! number of owners recorded for that transaction.

use cosign_core::Address;
use std::collections::{BTreeSet, HashMap};

use crate::error::VaultError;
use crate::ledger::{Transaction, TxIndex};

/// Which owners currently confirm which transaction
#[derive(Debug, Clone, Default)]
pub struct ConfirmationTracker {
    confirmed: HashMap<TxIndex, BTreeSet<Address>>,
}

impl ConfirmationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `owner`'s approval of `tx`.
    ///
    /// The caller has already authorized `owner` and resolved `tx_index`.
    pub fn confirm(
        &mut self,
        tx_index: TxIndex,
        tx: &mut Transaction,
        owner: Address,
    ) -> Result<usize, VaultError> {
        if tx.executed {
            return Err(VaultError::TxAlreadyExecuted(tx_index));
        }
        if self.is_confirmed(tx_index, &owner) {
            return Err(VaultError::TxAlreadyConfirmed { tx_index, owner });
        }

        self.confirmed.entry(tx_index).or_default().insert(owner);
        tx.num_confirmations += 1;
        Ok(tx.num_confirmations)
    }

    /// Withdraw `owner`'s earlier approval of `tx`.
    pub fn revoke(
        &mut self,
        tx_index: TxIndex,
        tx: &mut Transaction,
        owner: Address,
    ) -> Result<usize, VaultError> {
        if tx.executed {
            return Err(VaultError::TxAlreadyExecuted(tx_index));
        }

        let removed = self
            .confirmed
            .get_mut(&tx_index)
            .map_or(false, |owners| owners.remove(&owner));
        if !removed {
            return Err(VaultError::TxNotConfirmed { tx_index, owner });
        }

        tx.num_confirmations -= 1;
        Ok(tx.num_confirmations)
    }

    /// Whether `owner` currently confirms `tx_index`
    pub fn is_confirmed(&self, tx_index: TxIndex, owner: &Address) -> bool {
        self.confirmed
            .get(&tx_index)
            .map_or(false, |owners| owners.contains(owner))
    }

    /// Owners confirming `tx_index`, in address order
    pub fn confirmers(&self, tx_index: TxIndex) -> Vec<Address> {
        self.confirmed
            .get(&tx_index)
            .map(|owners| owners.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Raw table, for audits
    pub(crate) fn table(&self) -> &HashMap<TxIndex, BTreeSet<Address>> {
        &self.confirmed
    }

    /// Seed the table from stored data without touching any counter
    pub(crate) fn restore(&mut self, tx_index: TxIndex, owners: impl IntoIterator<Item = Address>) {
        let set: BTreeSet<Address> = owners.into_iter().collect();
        if !set.is_empty() {
            self.confirmed.insert(tx_index, set);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionLedger;
    use cosign_core::Amount;

    fn ledger_with_one() -> TransactionLedger {
        let mut ledger = TransactionLedger::new();
        ledger.append(Address::from_low_u8(9), Amount::from_units(5), vec![]);
        ledger
    }

    #[test]
    fn test_confirm_increments_and_records() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();
        let x = Address::from_low_u8(1);

        let count = tracker.confirm(0, ledger.get_mut(0).unwrap(), x).unwrap();

        assert_eq!(count, 1);
        assert!(tracker.is_confirmed(0, &x));
        assert_eq!(ledger.get(0).unwrap().num_confirmations, 1);
    }

    #[test]
    fn test_double_confirm_rejected_without_change() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();
        let x = Address::from_low_u8(1);

        tracker.confirm(0, ledger.get_mut(0).unwrap(), x).unwrap();
        let err = tracker.confirm(0, ledger.get_mut(0).unwrap(), x).unwrap_err();

        assert_eq!(err, VaultError::TxAlreadyConfirmed { tx_index: 0, owner: x });
        assert_eq!(ledger.get(0).unwrap().num_confirmations, 1);
    }

    #[test]
    fn test_revoke_requires_prior_confirmation() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();
        let x = Address::from_low_u8(1);

        let err = tracker.revoke(0, ledger.get_mut(0).unwrap(), x).unwrap_err();
        assert_eq!(err, VaultError::TxNotConfirmed { tx_index: 0, owner: x });
        assert_eq!(ledger.get(0).unwrap().num_confirmations, 0);
    }

    #[test]
    fn test_confirm_revoke_confirm_cycle() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();
        let x = Address::from_low_u8(1);

        for _ in 0..3 {
            tracker.confirm(0, ledger.get_mut(0).unwrap(), x).unwrap();
            assert_eq!(tracker.revoke(0, ledger.get_mut(0).unwrap(), x).unwrap(), 0);
        }
        assert!(!tracker.is_confirmed(0, &x));
        assert!(tracker.confirmers(0).is_empty());
    }

    #[test]
    fn test_executed_transaction_is_frozen() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();
        let x = Address::from_low_u8(1);
        let y = Address::from_low_u8(2);

        tracker.confirm(0, ledger.get_mut(0).unwrap(), x).unwrap();
        ledger.get_mut(0).unwrap().executed = true;

        assert_eq!(
            tracker.confirm(0, ledger.get_mut(0).unwrap(), y).unwrap_err(),
            VaultError::TxAlreadyExecuted(0)
        );
        assert_eq!(
            tracker.revoke(0, ledger.get_mut(0).unwrap(), x).unwrap_err(),
            VaultError::TxAlreadyExecuted(0)
        );
        assert_eq!(ledger.get(0).unwrap().num_confirmations, 1);
    }

    #[test]
    fn test_confirmers_sorted() {
        let mut ledger = ledger_with_one();
        let mut tracker = ConfirmationTracker::new();

        tracker
            .confirm(0, ledger.get_mut(0).unwrap(), Address::from_low_u8(3))
            .unwrap();
        tracker
            .confirm(0, ledger.get_mut(0).unwrap(), Address::from_low_u8(1))
            .unwrap();

        assert_eq!(
            tracker.confirmers(0),
            vec![Address::from_low_u8(1), Address::from_low_u8(3)]
        );
    }
}
