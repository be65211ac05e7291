//! The vault aggregate - owns all approval state for one deployment

use cosign_core::{Address, Amount};
use cosign_events::{EventSink, VaultEvent};
use std::sync::Arc;

use crate::confirmation::ConfirmationTracker;
use crate::config::VaultConfig;
use crate::error::VaultError;
use crate::ledger::{Transaction, TransactionLedger, TxIndex};
use crate::owners::OwnerRegistry;
use crate::transfer::FundTransfer;

/// Shared-custody vault: N owners, M-of-N approval, gated execution.
///
/// Every mutating method takes `&mut self`, so one vault value processes one
/// operation at a time. Use [`crate::SharedVault`] to share it between tasks.
pub struct Vault {
    pub(crate) name: String,
    pub(crate) owners: OwnerRegistry,
    pub(crate) ledger: TransactionLedger,
    pub(crate) confirmations: ConfirmationTracker,
    pub(crate) transfer: Arc<dyn FundTransfer>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl Vault {
    /// Create a vault. Fails without building anything if the owner set or
    /// threshold is invalid.
    pub fn new(
        owners: Vec<Address>,
        required_confirmations: usize,
        transfer: Arc<dyn FundTransfer>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, VaultError> {
        Self::from_config(
            &VaultConfig::new(owners, required_confirmations),
            transfer,
            events,
        )
    }

    /// Create a vault from deployment configuration
    pub fn from_config(
        config: &VaultConfig,
        transfer: Arc<dyn FundTransfer>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, VaultError> {
        let registry = config.registry()?;

        tracing::info!(
            vault = %config.name,
            owners = registry.len(),
            required = registry.required(),
            transfer = transfer.name(),
            events = events.name(),
            "Vault created"
        );

        Ok(Self::from_parts(
            config.name.clone(),
            registry,
            TransactionLedger::new(),
            ConfirmationTracker::new(),
            transfer,
            events,
        ))
    }

    pub(crate) fn from_parts(
        name: String,
        owners: OwnerRegistry,
        ledger: TransactionLedger,
        confirmations: ConfirmationTracker,
        transfer: Arc<dyn FundTransfer>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            name,
            owners,
            ledger,
            confirmations,
            transfer,
            events,
        }
    }

    // === Protocol ===

    /// Record an incoming credit. Open to anyone; touches no ledger state.
    ///
    /// Returns the balance reported by the transfer primitive.
    pub fn deposit(&mut self, sender: Address, amount: Amount) -> Amount {
        let balance = self.transfer.balance();

        tracing::info!(
            vault = %self.name,
            sender = %sender,
            amount = %amount,
            balance = %balance,
            "Deposit received"
        );
        self.publish(VaultEvent::deposit(sender, amount, balance));
        balance
    }

    /// Propose a transfer. Returns the new transaction's index.
    pub fn submit(
        &mut self,
        caller: Address,
        to: Address,
        value: Amount,
        data: Vec<u8>,
    ) -> Result<TxIndex, VaultError> {
        if let Err(e) = self.owners.authorize(&caller) {
            log_rejection(&self.name, "submit", &caller, &e);
            return Err(e);
        }

        let tx_index = self.ledger.append(to, value, data.clone());

        tracing::info!(
            vault = %self.name,
            owner = %caller,
            tx_index,
            to = %to,
            value = %value,
            "Transaction submitted"
        );
        self.publish(VaultEvent::submitted(caller, tx_index, to, value, data));
        Ok(tx_index)
    }

    /// Approve a pending transaction. Returns its new confirmation count.
    pub fn confirm(&mut self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        let count = match self.apply_confirm(caller, tx_index) {
            Ok(count) => count,
            Err(e) => {
                log_rejection(&self.name, "confirm", &caller, &e);
                return Err(e);
            }
        };

        tracing::info!(
            vault = %self.name,
            owner = %caller,
            tx_index,
            confirmations = count,
            required = self.owners.required(),
            "Transaction confirmed"
        );
        self.publish(VaultEvent::confirmed(caller, tx_index));
        Ok(count)
    }

    /// Withdraw an earlier approval. Returns the new confirmation count.
    pub fn revoke(&mut self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        let count = match self.apply_revoke(caller, tx_index) {
            Ok(count) => count,
            Err(e) => {
                log_rejection(&self.name, "revoke", &caller, &e);
                return Err(e);
            }
        };

        tracing::info!(
            vault = %self.name,
            owner = %caller,
            tx_index,
            confirmations = count,
            "Confirmation revoked"
        );
        self.publish(VaultEvent::revoked(caller, tx_index));
        Ok(count)
    }

    fn apply_confirm(&mut self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        self.owners.authorize(&caller)?;
        let tx = self.ledger.get_mut(tx_index)?;
        self.confirmations.confirm(tx_index, tx, caller)
    }

    fn apply_revoke(&mut self, caller: Address, tx_index: TxIndex) -> Result<usize, VaultError> {
        self.owners.authorize(&caller)?;
        let tx = self.ledger.get_mut(tx_index)?;
        self.confirmations.revoke(tx_index, tx, caller)
    }

    // === Read surface ===

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owners in construction order
    pub fn owners(&self) -> &[Address] {
        self.owners.owners()
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.is_owner(address)
    }

    pub fn required_confirmations(&self) -> usize {
        self.owners.required()
    }

    pub fn transaction_count(&self) -> usize {
        self.ledger.count()
    }

    pub fn transaction(&self, tx_index: TxIndex) -> Result<&Transaction, VaultError> {
        self.ledger.get(tx_index)
    }

    /// Whether `owner` currently confirms `tx_index`
    pub fn is_confirmed(&self, tx_index: TxIndex, owner: &Address) -> Result<bool, VaultError> {
        self.ledger.get(tx_index)?;
        Ok(self.confirmations.is_confirmed(tx_index, owner))
    }

    /// Owners confirming `tx_index`, in owner order
    pub fn confirmations(&self, tx_index: TxIndex) -> Result<Vec<Address>, VaultError> {
        self.ledger.get(tx_index)?;
        Ok(self
            .owners
            .owners()
            .iter()
            .filter(|owner| self.confirmations.is_confirmed(tx_index, owner))
            .copied()
            .collect())
    }

    /// All transactions, in submission order
    pub fn transactions(&self) -> impl Iterator<Item = (TxIndex, &Transaction)> {
        self.ledger.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> impl Iterator<Item = (TxIndex, &Transaction)> {
        self.ledger.iter().filter(|(_, tx)| !tx.executed)
    }

    /// Whether `tx_index` could execute right now
    pub fn is_executable(&self, tx_index: TxIndex) -> Result<bool, VaultError> {
        let tx = self.ledger.get(tx_index)?;
        Ok(!tx.executed && tx.has_enough_confirmations(self.owners.required()))
    }

    /// Funds held for the vault, as reported by the transfer primitive
    pub fn balance(&self) -> Amount {
        self.transfer.balance()
    }

    // === Events ===

    /// Publish an audit record. Sink failures are logged, never returned:
    /// the state change has already committed.
    pub(crate) fn publish(&self, event: VaultEvent) {
        if let Err(e) = self.events.publish(&event) {
            tracing::error!(
                vault = %self.name,
                sink = self.events.name(),
                kind = %event.kind(),
                error = %e,
                "Failed to publish vault event"
            );
        }
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("name", &self.name)
            .field("owners", &self.owners.owners())
            .field("required", &self.owners.required())
            .field("transactions", &self.ledger.count())
            .field("transfer", &self.transfer.name())
            .field("events", &self.events.name())
            .finish()
    }
}

/// Log a refused operation. Unauthorized callers are worth a warning.
pub(crate) fn log_rejection(vault: &str, op: &'static str, caller: &Address, err: &VaultError) {
    match err {
        VaultError::NotOwner(_) => tracing::warn!(
            vault = %vault,
            op,
            caller = %caller,
            "Rejected call from non-owner"
        ),
        _ => tracing::debug!(
            vault = %vault,
            op,
            caller = %caller,
            error = %err,
            "Operation rejected"
        ),
    }
}
