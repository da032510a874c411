//! Transaction execution
//!
//! [`ExecutionEngine`] moves a quorum-satisfied transaction from `Pending`
//! to `Executed` exactly once. External calls are performed through an
//! injected [`Executor`]; administrative actions are applied to the owner
//! registry directly.
//!
//! # Failure policy
//!
//! A call transaction is marked executed *before* the executor runs. If the
//! executor reports an error the transaction stays executed, the failure is
//! recorded as its outcome, and the caller receives `ExecutionFailed`. The
//! action is never attempted again.
//!
//! Administrative actions are checked against the registry before the
//! transition. If the registry can no longer accept them the call fails with
//! `Config` and the transaction stays pending.

use crate::crypto::Address;
use crate::multisig::error::{MultisigError, MultisigResult};
use crate::multisig::events::{EventKind, EventLog};
use crate::multisig::ledger::TransactionLedger;
use crate::multisig::registry::{OwnerChange, OwnerRegistry};
use crate::multisig::tracker::ConfirmationTracker;
use crate::multisig::transaction::{Action, ExecutionOutcome, TxId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by an executor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Balance overflow")]
    Overflow,
    #[error("Call to {target} rejected: {reason}")]
    Rejected { target: Address, reason: String },
}

/// Capability that performs external actions
pub trait Executor {
    /// Perform a call, returning its output
    fn perform(
        &mut self,
        target: &Address,
        payload: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, ExecutorError>;
}

/// Result of a successful execution
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionResult {
    pub id: TxId,
    /// Hex digest of the executed transaction
    pub digest: String,
    /// Output returned by the executor (empty for administrative actions)
    pub return_data: Vec<u8>,
    pub executed_at: DateTime<Utc>,
}

/// Executes transactions against a registry and ledger
pub struct ExecutionEngine<'a> {
    registry: &'a mut OwnerRegistry,
    ledger: &'a mut TransactionLedger,
    events: &'a mut EventLog,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        registry: &'a mut OwnerRegistry,
        ledger: &'a mut TransactionLedger,
        events: &'a mut EventLog,
    ) -> Self {
        Self {
            registry,
            ledger,
            events,
        }
    }

    /// Execute transaction `id` on behalf of `caller`
    ///
    /// # Errors
    /// `NotOwner`, `TransactionNotFound`, `AlreadyExecuted`, `QuorumNotMet`
    /// (all without state change), `Config` for an administrative action the
    /// registry no longer accepts (without state change), or
    /// `ExecutionFailed` when the executor fails (transaction stays executed).
    pub fn execute(
        &mut self,
        caller: Address,
        id: TxId,
        executor: &mut dyn Executor,
    ) -> MultisigResult<ExecutionResult> {
        self.registry.ensure_owner(&caller)?;

        let tx = self.ledger.get(id)?;
        if tx.is_executed() {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        ConfirmationTracker::new(self.registry).ensure_quorum(tx)?;

        let digest = tx.digest_hex();
        match tx.action.clone() {
            Action::Admin(change) => self.execute_admin(id, change, digest),
            Action::Call {
                target,
                value,
                payload,
            } => self.execute_call(id, target, value, &payload, digest, executor),
        }
    }

    fn execute_admin(
        &mut self,
        id: TxId,
        change: OwnerChange,
        digest: String,
    ) -> MultisigResult<ExecutionResult> {
        self.registry.apply(&change)?;

        let tx = self.ledger.get_mut(id)?;
        tx.mark_executed()?;
        tx.record_outcome(ExecutionOutcome::Success {
            return_data: Vec::new(),
        });
        let executed_at = tx.executed_at.unwrap_or_else(Utc::now);

        if let Some(departed) = change.departing_owner() {
            let purged = self.ledger.purge_confirmations(&departed);
            if !purged.is_empty() {
                log::info!(
                    "Dropped confirmations of {} from pending transactions {:?}",
                    departed,
                    purged
                );
            }
        }

        self.events.record(EventKind::Execution { id });
        match change {
            OwnerChange::AddOwner { owner } => {
                self.events.record(EventKind::OwnerAddition { owner });
            }
            OwnerChange::RemoveOwner { owner } => {
                self.events.record(EventKind::OwnerRemoval { owner });
            }
            OwnerChange::ReplaceOwner { old, new } => {
                self.events.record(EventKind::OwnerRemoval { owner: old });
                self.events.record(EventKind::OwnerAddition { owner: new });
            }
            OwnerChange::ChangeRequirement { required } => {
                self.events.record(EventKind::RequirementChange { required });
            }
        }

        log::info!("Transaction {} executed", id);
        Ok(ExecutionResult {
            id,
            digest,
            return_data: Vec::new(),
            executed_at,
        })
    }

    fn execute_call(
        &mut self,
        id: TxId,
        target: Address,
        value: u128,
        payload: &[u8],
        digest: String,
        executor: &mut dyn Executor,
    ) -> MultisigResult<ExecutionResult> {
        let tx = self.ledger.get_mut(id)?;
        tx.mark_executed()?;
        let executed_at = tx.executed_at.unwrap_or_else(Utc::now);

        match executor.perform(&target, payload, value) {
            Ok(return_data) => {
                tx.record_outcome(ExecutionOutcome::Success {
                    return_data: return_data.clone(),
                });
                self.events.record(EventKind::Execution { id });
                log::info!("Transaction {} executed", id);

                Ok(ExecutionResult {
                    id,
                    digest,
                    return_data,
                    executed_at,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                tx.record_outcome(ExecutionOutcome::Failed {
                    reason: reason.clone(),
                });
                self.events.record(EventKind::ExecutionFailure {
                    id,
                    reason: reason.clone(),
                });
                log::warn!("Transaction {} failed: {}", id, reason);

                Err(MultisigError::ExecutionFailed { id, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::transaction::Transaction;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    /// Executor that counts calls and optionally fails
    #[derive(Default)]
    struct CountingExecutor {
        calls: usize,
        fail: bool,
    }

    impl Executor for CountingExecutor {
        fn perform(
            &mut self,
            target: &Address,
            _payload: &[u8],
            _value: u128,
        ) -> Result<Vec<u8>, ExecutorError> {
            self.calls += 1;
            if self.fail {
                return Err(ExecutorError::Rejected {
                    target: *target,
                    reason: "boom".to_string(),
                });
            }
            Ok(vec![0x01])
        }
    }

    struct Fixture {
        registry: OwnerRegistry,
        ledger: TransactionLedger,
        events: EventLog,
    }

    impl Fixture {
        fn new(action: Action, confirmers: &[Address]) -> Self {
            let registry = OwnerRegistry::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
            let mut ledger = TransactionLedger::new();
            let mut tx = Transaction::new(0, action, addr(1));
            for c in confirmers {
                tx.add_confirmation(*c).unwrap();
            }
            ledger.append(tx);
            Self {
                registry,
                ledger,
                events: EventLog::new(),
            }
        }

        fn execute(
            &mut self,
            caller: Address,
            executor: &mut dyn Executor,
        ) -> MultisigResult<ExecutionResult> {
            ExecutionEngine::new(&mut self.registry, &mut self.ledger, &mut self.events)
                .execute(caller, 0, executor)
        }
    }

    #[test]
    fn test_execute_once() {
        let mut fx = Fixture::new(Action::transfer(addr(9), 5), &[addr(1), addr(2)]);
        let mut executor = CountingExecutor::default();

        let result = fx.execute(addr(3), &mut executor).unwrap();
        assert_eq!(result.return_data, vec![0x01]);
        assert!(fx.ledger.get(0).unwrap().is_executed());

        assert_eq!(
            fx.execute(addr(2), &mut executor),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(executor.calls, 1);
    }

    #[test]
    fn test_quorum_not_met_has_no_effect() {
        let mut fx = Fixture::new(Action::transfer(addr(9), 5), &[addr(1)]);
        let mut executor = CountingExecutor::default();

        assert!(matches!(
            fx.execute(addr(1), &mut executor),
            Err(MultisigError::QuorumNotMet { have: 1, need: 2, .. })
        ));
        assert!(!fx.ledger.get(0).unwrap().is_executed());
        assert_eq!(executor.calls, 0);
        assert!(fx.events.is_empty());
    }

    #[test]
    fn test_failed_call_stays_executed() {
        let mut fx = Fixture::new(Action::transfer(addr(9), 5), &[addr(1), addr(2)]);
        let mut executor = CountingExecutor {
            fail: true,
            ..Default::default()
        };

        assert!(matches!(
            fx.execute(addr(1), &mut executor),
            Err(MultisigError::ExecutionFailed { id: 0, .. })
        ));

        let tx = fx.ledger.get(0).unwrap();
        assert!(tx.is_executed());
        assert!(matches!(
            tx.outcome,
            Some(ExecutionOutcome::Failed { .. })
        ));

        // No retry
        executor.fail = false;
        assert_eq!(
            fx.execute(addr(1), &mut executor),
            Err(MultisigError::AlreadyExecuted(0))
        );
        assert_eq!(executor.calls, 1);
    }

    #[test]
    fn test_admin_action_applies_and_purges() {
        let change = OwnerChange::RemoveOwner { owner: addr(2) };
        let mut fx = Fixture::new(Action::Admin(change), &[addr(1), addr(2)]);

        let mut other = Transaction::new(0, Action::transfer(addr(9), 1), addr(2));
        other.add_confirmation(addr(2)).unwrap();
        let other_id = fx.ledger.append(other);

        let mut executor = CountingExecutor::default();
        fx.execute(addr(1), &mut executor).unwrap();

        assert!(!fx.registry.is_owner(&addr(2)));
        assert!(fx.ledger.get(other_id).unwrap().confirmations().is_empty());
        assert_eq!(executor.calls, 0);
        assert!(fx
            .events
            .all()
            .iter()
            .any(|e| e.kind == EventKind::OwnerRemoval { owner: addr(2) }));
    }

    #[test]
    fn test_stale_admin_action_stays_pending() {
        let change = OwnerChange::AddOwner { owner: addr(2) };
        let mut fx = Fixture::new(Action::Admin(change), &[addr(1), addr(3)]);
        let mut executor = CountingExecutor::default();

        assert!(matches!(
            fx.execute(addr(1), &mut executor),
            Err(MultisigError::Config(_))
        ));
        assert!(!fx.ledger.get(0).unwrap().is_executed());
        assert_eq!(fx.registry.owner_count(), 3);
    }
}
