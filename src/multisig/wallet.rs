//! Multi-signature wallet
//!
//! [`MultisigWallet`] is the call surface of the engine. It owns the owner
//! registry, the transaction ledger and the event log, and routes every
//! operation through the confirmation tracker and execution engine.
//!
//! Every mutating method takes `&mut self` and either applies completely
//! or returns an error with no state change. The one exception is a failed
//! external call, see [`crate::multisig::executor`].

use crate::crypto::{sha256_parts, Address};
use crate::multisig::error::{MultisigError, MultisigResult};
use crate::multisig::events::{EventKind, EventLog, WalletEvent};
use crate::multisig::executor::{ExecutionEngine, ExecutionResult, Executor};
use crate::multisig::ledger::TransactionLedger;
use crate::multisig::registry::{OwnerRegistry, MAX_OWNER_COUNT};
use crate::multisig::tracker::ConfirmationTracker;
use crate::multisig::transaction::{Action, Transaction, TxId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wallet behaviour settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletSettings {
    /// Upper bound on the owner count
    pub max_owners: usize,
    /// Whether submitting a transaction also confirms it for the submitter
    pub auto_confirm_on_submit: bool,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            max_owners: MAX_OWNER_COUNT,
            auto_confirm_on_submit: true,
        }
    }
}

/// A multi-signature wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultisigWallet {
    /// Wallet address, derived from the initial configuration
    address: Address,
    /// Optional human-readable label
    pub label: Option<String>,
    settings: WalletSettings,
    registry: OwnerRegistry,
    ledger: TransactionLedger,
    events: EventLog,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl MultisigWallet {
    /// Create a wallet with default settings
    ///
    /// # Errors
    /// Returns `Config` if the owner set or requirement is invalid
    pub fn new(owners: Vec<Address>, required: usize) -> MultisigResult<Self> {
        Self::with_settings(owners, required, WalletSettings::default())
    }

    /// Create a wallet with explicit settings
    pub fn with_settings(
        owners: Vec<Address>,
        required: usize,
        settings: WalletSettings,
    ) -> MultisigResult<Self> {
        let registry = OwnerRegistry::with_max_owners(owners, required, settings.max_owners)?;
        let address = Self::generate_address(&registry);

        log::info!(
            "Multisig wallet {} created ({})",
            address,
            registry.description()
        );

        Ok(Self {
            address,
            label: None,
            settings,
            registry,
            ledger: TransactionLedger::new(),
            events: EventLog::new(),
            created_at: Utc::now(),
        })
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Derive the wallet address from `required || sorted owners`
    fn generate_address(registry: &OwnerRegistry) -> Address {
        let mut sorted = registry.owners().to_vec();
        sorted.sort();

        let required = (registry.required() as u64).to_be_bytes();
        let mut parts: Vec<&[u8]> = vec![&b"multisig"[..], &required[..]];
        for owner in &sorted {
            parts.push(owner.as_bytes());
        }

        Address::from_digest(&sha256_parts(&parts))
    }

    /// Re-check every invariant, e.g. after loading from disk
    pub fn validate(&self) -> MultisigResult<()> {
        self.registry.validate()?;
        self.ledger.validate()?;

        if self.registry.max_owners() != self.settings.max_owners {
            return Err(MultisigError::config(format!(
                "owner cap {} differs from configured maximum {}",
                self.registry.max_owners(),
                self.settings.max_owners
            )));
        }

        for tx in self.ledger.iter() {
            if tx.is_executed() {
                continue;
            }
            if let Some(stale) = tx
                .confirmations()
                .iter()
                .find(|c| !self.registry.is_owner(c))
            {
                return Err(MultisigError::config(format!(
                    "pending transaction {} holds confirmation from non-owner {}",
                    tx.id, stale
                )));
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Get the wallet address
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn is_owner(&self, id: &Address) -> bool {
        self.registry.is_owner(id)
    }

    pub fn required(&self) -> usize {
        self.registry.required()
    }

    pub fn owner_count(&self) -> usize {
        self.registry.owner_count()
    }

    pub fn owners(&self) -> &[Address] {
        self.registry.owners()
    }

    /// Get human-readable description like "2-of-3"
    pub fn description(&self) -> String {
        self.registry.description()
    }

    /// Get a transaction by ID
    pub fn get_transaction(&self, id: TxId) -> MultisigResult<&Transaction> {
        self.ledger.get(id)
    }

    /// Whether transaction `id` has reached quorum among current owners
    pub fn is_confirmed(&self, id: TxId) -> MultisigResult<bool> {
        let tx = self.ledger.get(id)?;
        Ok(self.tracker().is_confirmed(tx))
    }

    /// Confirmations of `id` from current owners
    pub fn confirmation_count(&self, id: TxId) -> MultisigResult<usize> {
        let tx = self.ledger.get(id)?;
        Ok(self.tracker().confirmation_count(tx))
    }

    /// Current owners that confirmed `id`
    pub fn confirmations(&self, id: TxId) -> MultisigResult<Vec<Address>> {
        let tx = self.ledger.get(id)?;
        Ok(self.tracker().confirmations(tx))
    }

    /// Count transactions by status
    pub fn transaction_count(&self, include_pending: bool, include_executed: bool) -> usize {
        self.ledger
            .transaction_count(include_pending, include_executed)
    }

    /// IDs at positions `from..to` of the status-filtered transaction list
    pub fn transaction_ids(
        &self,
        from: usize,
        to: usize,
        include_pending: bool,
        include_executed: bool,
    ) -> Vec<TxId> {
        self.ledger
            .transaction_ids(from, to, include_pending, include_executed)
    }

    /// All transactions in ID order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.ledger.iter()
    }

    /// Recorded events
    pub fn events(&self) -> &[WalletEvent] {
        self.events.all()
    }

    /// Events with sequence number `from` or later
    pub fn events_since(&self, from: u64) -> &[WalletEvent] {
        self.events.since(from)
    }

    fn tracker(&self) -> ConfirmationTracker<'_> {
        ConfirmationTracker::new(&self.registry)
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Propose a new transaction
    ///
    /// The submitter's confirmation is recorded in the same step unless
    /// `auto_confirm_on_submit` is off.
    ///
    /// # Errors
    /// `NotOwner` if `caller` is not an owner; `Config` if an
    /// administrative action could not apply to the current registry.
    pub fn submit(&mut self, caller: Address, action: Action) -> MultisigResult<TxId> {
        self.registry.ensure_owner(&caller)?;

        if let Action::Admin(change) = &action {
            self.registry.check(change)?;
        }

        let summary = action.summary();
        let mut tx = Transaction::new(self.ledger.next_id(), action, caller);
        if self.settings.auto_confirm_on_submit {
            tx.add_confirmation(caller)?;
        }
        let id = self.ledger.append(tx);

        self.events.record(EventKind::Submission {
            id,
            submitter: caller,
        });
        if self.settings.auto_confirm_on_submit {
            self.events.record(EventKind::Confirmation { id, owner: caller });
        }

        log::info!("Transaction {} submitted by {}: {}", id, caller, summary);
        Ok(id)
    }

    /// Confirm a pending transaction
    pub fn confirm(&mut self, caller: Address, id: TxId) -> MultisigResult<()> {
        ConfirmationTracker::new(&self.registry).confirm(&mut self.ledger, caller, id)?;
        self.events
            .record(EventKind::Confirmation { id, owner: caller });
        Ok(())
    }

    /// Revoke an earlier confirmation
    pub fn revoke(&mut self, caller: Address, id: TxId) -> MultisigResult<()> {
        ConfirmationTracker::new(&self.registry).revoke(&mut self.ledger, caller, id)?;
        self.events.record(EventKind::Revocation { id, owner: caller });
        Ok(())
    }

    /// Execute a transaction that has reached quorum
    pub fn execute(
        &mut self,
        caller: Address,
        id: TxId,
        executor: &mut dyn Executor,
    ) -> MultisigResult<ExecutionResult> {
        ExecutionEngine::new(&mut self.registry, &mut self.ledger, &mut self.events)
            .execute(caller, id, executor)
    }

    /// Confirm, then execute if the confirmation completed the quorum.
    ///
    /// The confirmation stands even when execution is not attempted or
    /// fails. Returns `None` when quorum is still not met.
    pub fn confirm_and_execute(
        &mut self,
        caller: Address,
        id: TxId,
        executor: &mut dyn Executor,
    ) -> MultisigResult<Option<ExecutionResult>> {
        self.confirm(caller, id)?;

        if !self.is_confirmed(id)? {
            return Ok(None);
        }
        self.execute(caller, id, executor).map(Some)
    }

    /// Record a deposit into the wallet's funds
    pub fn record_deposit(&mut self, from: Address, amount: u128) {
        self.events.record(EventKind::Deposit { from, amount });
        log::info!("Deposit of {} from {}", amount, from);
    }
}
