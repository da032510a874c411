//! Confirmation tracking
//!
//! Records which owners approved which transaction and decides whether a
//! transaction has reached quorum. Quorum is always evaluated against the
//! current owner set, so a former owner's approval never counts.

use crate::crypto::Address;
use crate::multisig::error::{MultisigError, MultisigResult};
use crate::multisig::ledger::TransactionLedger;
use crate::multisig::registry::OwnerRegistry;
use crate::multisig::transaction::{Transaction, TxId};

/// Confirmation rules evaluated against one registry snapshot
#[derive(Clone, Copy, Debug)]
pub struct ConfirmationTracker<'a> {
    registry: &'a OwnerRegistry,
}

impl<'a> ConfirmationTracker<'a> {
    pub fn new(registry: &'a OwnerRegistry) -> Self {
        Self { registry }
    }

    /// Record `caller`'s confirmation of transaction `id`
    ///
    /// # Errors
    /// `NotOwner`, `TransactionNotFound`, `AlreadyExecuted` or
    /// `AlreadyConfirmed`, checked in that order.
    pub fn confirm(
        &self,
        ledger: &mut TransactionLedger,
        caller: Address,
        id: TxId,
    ) -> MultisigResult<()> {
        self.registry.ensure_owner(&caller)?;
        ledger.get_mut(id)?.add_confirmation(caller)?;

        log::debug!("Transaction {} confirmed by {}", id, caller);
        Ok(())
    }

    /// Withdraw `caller`'s confirmation of transaction `id`
    ///
    /// # Errors
    /// `NotOwner`, `TransactionNotFound`, `AlreadyExecuted` or
    /// `NotConfirmed`, checked in that order.
    pub fn revoke(
        &self,
        ledger: &mut TransactionLedger,
        caller: Address,
        id: TxId,
    ) -> MultisigResult<()> {
        self.registry.ensure_owner(&caller)?;
        ledger.get_mut(id)?.remove_confirmation(caller)?;

        log::debug!("Transaction {} revoked by {}", id, caller);
        Ok(())
    }

    /// Confirmations from current owners
    pub fn confirmation_count(&self, tx: &Transaction) -> usize {
        tx.count_confirmations(self.registry)
    }

    /// Whether current-owner confirmations reach the requirement
    pub fn is_confirmed(&self, tx: &Transaction) -> bool {
        self.confirmation_count(tx) >= self.registry.required()
    }

    /// Current owners that confirmed, in owner registration order
    pub fn confirmations(&self, tx: &Transaction) -> Vec<Address> {
        self.registry
            .owners()
            .iter()
            .filter(|owner| tx.is_confirmed_by(owner))
            .copied()
            .collect()
    }

    /// Fail with `QuorumNotMet` unless `tx` has reached quorum
    pub fn ensure_quorum(&self, tx: &Transaction) -> MultisigResult<()> {
        let have = self.confirmation_count(tx);
        let need = self.registry.required();
        if have < need {
            return Err(MultisigError::QuorumNotMet {
                id: tx.id,
                have,
                need,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::transaction::Action;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn setup() -> (OwnerRegistry, TransactionLedger) {
        let registry = OwnerRegistry::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        let mut ledger = TransactionLedger::new();
        ledger.append(Transaction::new(0, Action::transfer(addr(9), 5), addr(1)));
        (registry, ledger)
    }

    #[test]
    fn test_confirm_until_quorum() {
        let (registry, mut ledger) = setup();
        let tracker = ConfirmationTracker::new(&registry);

        tracker.confirm(&mut ledger, addr(1), 0).unwrap();
        assert!(!tracker.is_confirmed(ledger.get(0).unwrap()));

        tracker.confirm(&mut ledger, addr(2), 0).unwrap();
        assert!(tracker.is_confirmed(ledger.get(0).unwrap()));
        assert_eq!(tracker.confirmation_count(ledger.get(0).unwrap()), 2);
    }

    #[test]
    fn test_quorum_matches_count_for_any_sequence() {
        let (registry, mut ledger) = setup();
        let tracker = ConfirmationTracker::new(&registry);
        let steps = [
            (addr(3), true),
            (addr(1), true),
            (addr(3), false),
            (addr(2), true),
            (addr(1), false),
            (addr(3), true),
            (addr(2), false),
        ];

        for (owner, confirm) in steps {
            if confirm {
                tracker.confirm(&mut ledger, owner, 0).unwrap();
            } else {
                tracker.revoke(&mut ledger, owner, 0).unwrap();
            }
            let tx = ledger.get(0).unwrap();
            assert_eq!(
                tx.confirmations().len() >= registry.required(),
                tracker.is_confirmed(tx)
            );
        }
    }

    #[test]
    fn test_error_order() {
        let (registry, mut ledger) = setup();
        let tracker = ConfirmationTracker::new(&registry);

        // Non-owner is rejected before the ID is looked up
        assert!(matches!(
            tracker.confirm(&mut ledger, addr(8), 42),
            Err(MultisigError::NotOwner(_))
        ));
        assert!(matches!(
            tracker.confirm(&mut ledger, addr(1), 42),
            Err(MultisigError::TransactionNotFound(42))
        ));
        assert!(matches!(
            tracker.revoke(&mut ledger, addr(8), 42),
            Err(MultisigError::NotOwner(_))
        ));
        assert!(matches!(
            tracker.revoke(&mut ledger, addr(1), 42),
            Err(MultisigError::TransactionNotFound(42))
        ));
        assert!(matches!(
            tracker.revoke(&mut ledger, addr(1), 0),
            Err(MultisigError::NotConfirmed { .. })
        ));
    }

    #[test]
    fn test_confirmations_in_owner_order() {
        let (registry, mut ledger) = setup();
        let tracker = ConfirmationTracker::new(&registry);

        tracker.confirm(&mut ledger, addr(3), 0).unwrap();
        tracker.confirm(&mut ledger, addr(1), 0).unwrap();

        let tx = ledger.get(0).unwrap();
        assert_eq!(tx.confirmations(), &[addr(3), addr(1)]);
        assert_eq!(tracker.confirmations(tx), vec![addr(1), addr(3)]);
    }

    #[test]
    fn test_ensure_quorum_reports_counts() {
        let (registry, mut ledger) = setup();
        let tracker = ConfirmationTracker::new(&registry);
        tracker.confirm(&mut ledger, addr(1), 0).unwrap();

        assert_eq!(
            tracker.ensure_quorum(ledger.get(0).unwrap()),
            Err(MultisigError::QuorumNotMet {
                id: 0,
                have: 1,
                need: 2
            })
        );
    }
}
