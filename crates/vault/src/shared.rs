//! Shared vault handle for concurrent callers
//!
//! Every mutating call takes the write lock for its full duration, including
//! the awaited transfer in `execute`. Operations on one vault are therefore
//! totally ordered, and a transfer primitive that calls back into the same
//! vault waits until the execution that invoked it has finished.
//!
//! `execute` runs on its own task that owns the write guard. A caller that
//! stops waiting (timeout, dropped future) does not stop the execution; its
//! outcome is still committed or rolled back as a whole.

use cosign_core::{Address, Amount};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::audit::{AuditError, AuditReport};
use crate::error::VaultError;
use crate::ledger::{Transaction, TxIndex};
use crate::snapshot::VaultSnapshot;
use crate::vault::Vault;

/// Cloneable, task-safe handle to one vault
#[derive(Debug, Clone)]
pub struct SharedVault {
    inner: Arc<RwLock<Vault>>,
}

impl SharedVault {
    pub fn new(vault: Vault) -> Self {
        Self {
            inner: Arc::new(RwLock::new(vault)),
        }
    }

    pub async fn deposit(&self, sender: Address, amount: Amount) -> Amount {
        let mut vault = self.inner.write().await;
        vault.deposit(sender, amount)
    }

    pub async fn submit(
        &self,
        caller: Address,
        to: Address,
        value: Amount,
        data: Vec<u8>,
    ) -> Result<TxIndex, VaultError> {
        let mut vault = self.inner.write().await;
        vault.submit(caller, to, value, data)
    }

    pub async fn confirm(&self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        let mut vault = self.inner.write().await;
        vault.confirm(caller, tx_index)
    }

    pub async fn revoke(&self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        let mut vault = self.inner.write().await;
        vault.revoke(caller, tx_index)
    }

    /// Execute while holding the write lock across the transfer
    pub async fn execute(&self, caller: Address, tx_index: TxIndex) -> Result<(), VaultError> {
        let mut vault = Arc::clone(&self.inner).write_owned().await;
        let task = tokio::spawn(async move { vault.execute(caller, tx_index).await });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(tx_index, error = %e, "Execution task did not finish");
                Err(VaultError::ExecutionInterrupted(tx_index))
            }
        }
    }

    // === Reads ===

    pub async fn transaction(&self, tx_index: TxIndex) -> Result<Transaction, VaultError> {
        self.inner.read().await.transaction(tx_index).cloned()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transaction_count()
    }

    pub async fn is_confirmed(&self, tx_index: TxIndex, owner: &Address) -> Result<bool, VaultError> {
        self.inner.read().await.is_confirmed(tx_index, owner)
    }

    pub async fn owners(&self) -> Vec<Address> {
        self.inner.read().await.owners().to_vec()
    }

    pub async fn required_confirmations(&self) -> usize {
        self.inner.read().await.required_confirmations()
    }

    pub async fn snapshot(&self) -> VaultSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn audit(&self) -> Result<AuditReport, AuditError> {
        self.inner.read().await.audit()
    }

    /// Borrow the vault for several reads under one lock
    pub async fn read(&self) -> RwLockReadGuard<'_, Vault> {
        self.inner.read().await
    }
}

impl From<Vault> for SharedVault {
    fn from(vault: Vault) -> Self {
        Self::new(vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{FundTransfer, TransferError, Treasury};
    use async_trait::async_trait;
    use cosign_events::{EventKind, MemorySink, NullSink};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn addr(n: u8) -> Address {
        Address::from_low_u8(n)
    }

    fn owners(count: u8) -> Vec<Address> {
        (1..=count).map(addr).collect()
    }

    #[tokio::test]
    async fn test_concurrent_confirmations() {
        let vault = SharedVault::new(
            Vault::new(
                owners(5),
                3,
                Arc::new(Treasury::new()),
                Arc::new(NullSink),
            )
            .unwrap(),
        );
        vault
            .submit(addr(1), addr(9), Amount::from_units(1), vec![])
            .await
            .unwrap();

        let mut handles = Vec::new();
        for owner in owners(5) {
            let vault = vault.clone();
            handles.push(tokio::spawn(async move { vault.confirm(owner, 0).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(vault.transaction(0).await.unwrap().num_confirmations, 5);
        assert_eq!(vault.audit().await.unwrap().confirmations, 5);
    }

    /// Tries to confirm on the vault that is executing it
    #[derive(Default)]
    struct ReentrantTransfer {
        target: Mutex<Option<SharedVault>>,
        callback_blocked: AtomicBool,
    }

    #[async_trait]
    impl FundTransfer for ReentrantTransfer {
        fn name(&self) -> &str {
            "reentrant"
        }

        async fn transfer(&self, _to: Address, _value: Amount, _data: &[u8]) -> Result<(), TransferError> {
            let target = self.target.lock().unwrap().clone();
            if let Some(vault) = target {
                let attempt =
                    tokio::time::timeout(Duration::from_millis(50), vault.confirm(addr(3), 0)).await;
                self.callback_blocked.store(attempt.is_err(), Ordering::SeqCst);
            }
            Ok(())
        }

        fn balance(&self) -> Amount {
            Amount::ZERO
        }
    }

    #[tokio::test]
    async fn test_reentrant_callback_waits_for_execution() {
        let transfer = Arc::new(ReentrantTransfer::default());
        let vault = SharedVault::new(
            Vault::new(owners(3), 2, transfer.clone(), Arc::new(NullSink)).unwrap(),
        );
        *transfer.target.lock().unwrap() = Some(vault.clone());

        vault
            .submit(addr(1), addr(9), Amount::from_units(1), vec![])
            .await
            .unwrap();
        vault.confirm(addr(1), 0).await.unwrap();
        vault.confirm(addr(2), 0).await.unwrap();

        vault.execute(addr(1), 0).await.unwrap();

        assert!(transfer.callback_blocked.load(Ordering::SeqCst));
        let tx = vault.transaction(0).await.unwrap();
        assert!(tx.executed);
        assert_eq!(tx.num_confirmations, 2);
        assert!(!vault.is_confirmed(0, &addr(3)).await.unwrap());

        // Break the handle cycle
        transfer.target.lock().unwrap().take();
    }

    #[tokio::test]
    async fn test_vaults_are_independent() {
        let first = SharedVault::new(
            Vault::new(owners(2), 1, Arc::new(Treasury::new()), Arc::new(NullSink)).unwrap(),
        );
        let second = SharedVault::new(
            Vault::new(owners(2), 2, Arc::new(Treasury::new()), Arc::new(NullSink)).unwrap(),
        );

        first
            .submit(addr(1), addr(9), Amount::from_units(1), vec![])
            .await
            .unwrap();

        assert_eq!(first.transaction_count().await, 1);
        assert_eq!(second.transaction_count().await, 0);
        assert_eq!(
            second.confirm(addr(1), 0).await.unwrap_err(),
            VaultError::TxDoesNotExist(0)
        );
        assert_eq!(second.required_confirmations().await, 2);
    }

    #[tokio::test]
    async fn test_read_guard_sees_consistent_state() {
        let vault = SharedVault::new(
            Vault::new(owners(3), 2, Arc::new(Treasury::new()), Arc::new(NullSink)).unwrap(),
        );
        vault
            .submit(addr(2), addr(9), Amount::from_units(4), vec![])
            .await
            .unwrap();
        vault.confirm(addr(2), 0).await.unwrap();

        let guard = vault.read().await;
        assert_eq!(guard.pending().count(), 1);
        assert_eq!(guard.confirmations(0).unwrap(), vec![addr(2)]);
        assert_eq!(vault.owners().await.len(), 3);
    }

    #[tokio::test]
    async fn test_deposit_and_revoke_through_handle() {
        let events = Arc::new(MemorySink::new());
        let vault = SharedVault::new(
            Vault::new(
                owners(3),
                2,
                Arc::new(Treasury::with_reserve(Amount::from_units(12))),
                events.clone(),
            )
            .unwrap(),
        );

        assert_eq!(
            vault.deposit(addr(7), Amount::from_units(12)).await,
            Amount::from_units(12)
        );
        vault
            .submit(addr(1), addr(9), Amount::from_units(3), vec![])
            .await
            .unwrap();
        assert_eq!(vault.confirm(addr(2), 0).await.unwrap(), 1);
        assert_eq!(vault.revoke(addr(2), 0).await.unwrap(), 0);
        assert_eq!(
            vault.revoke(addr(2), 0).await.unwrap_err(),
            VaultError::TxNotConfirmed {
                tx_index: 0,
                owner: addr(2)
            }
        );

        assert!(!vault.is_confirmed(0, &addr(2)).await.unwrap());
        let kinds: Vec<EventKind> = events.events().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Deposit,
                EventKind::Submit,
                EventKind::Confirm,
                EventKind::Revoke
            ]
        );
    }

    /// Succeeds after a delay
    #[derive(Default)]
    struct SlowTransfer {
        completed: AtomicUsize,
    }

    #[async_trait]
    impl FundTransfer for SlowTransfer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn transfer(&self, _to: Address, _value: Amount, _data: &[u8]) -> Result<(), TransferError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn balance(&self) -> Amount {
            Amount::ZERO
        }
    }

    #[tokio::test]
    async fn test_execute_finishes_after_caller_gives_up() {
        let transfer = Arc::new(SlowTransfer::default());
        let events = Arc::new(MemorySink::new());
        let vault = SharedVault::new(
            Vault::new(owners(3), 2, transfer.clone(), events.clone()).unwrap(),
        );
        vault
            .submit(addr(1), addr(9), Amount::from_units(5), vec![])
            .await
            .unwrap();
        vault.confirm(addr(1), 0).await.unwrap();
        vault.confirm(addr(2), 0).await.unwrap();

        let attempt =
            tokio::time::timeout(Duration::from_millis(10), vault.execute(addr(1), 0)).await;
        assert!(attempt.is_err());

        // Queues behind the write guard still held by the execution task
        let tx = vault.transaction(0).await.unwrap();
        assert!(tx.executed);
        assert_eq!(transfer.completed.load(Ordering::SeqCst), 1);
        assert_eq!(events.events().last().unwrap().kind(), EventKind::Execute);
        assert_eq!(
            vault.execute(addr(2), 0).await.unwrap_err(),
            VaultError::TxAlreadyExecuted(0)
        );
        vault.audit().await.unwrap();
    }
}
