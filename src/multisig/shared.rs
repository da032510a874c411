//! Thread-safe wallet handle
//!
//! [`SharedWallet`] serialises every operation through one mutex around the
//! wallet and its executor, so two callers racing to execute the same
//! transaction can never both perform it.

use crate::crypto::Address;
use crate::multisig::error::MultisigResult;
use crate::multisig::executor::{ExecutionResult, Executor, ExecutorError};
use crate::multisig::transaction::{Action, TxId};
use crate::multisig::wallet::MultisigWallet;
use crate::treasury::Treasury;
use parking_lot::Mutex;
use std::sync::Arc;

struct Inner<E> {
    wallet: MultisigWallet,
    executor: E,
}

/// Cloneable handle to a wallet and the executor that performs its calls
pub struct SharedWallet<E> {
    inner: Arc<Mutex<Inner<E>>>,
}

impl<E> Clone for SharedWallet<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Executor> SharedWallet<E> {
    pub fn new(wallet: MultisigWallet, executor: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { wallet, executor })),
        }
    }

    pub fn submit(&self, caller: Address, action: Action) -> MultisigResult<TxId> {
        self.inner.lock().wallet.submit(caller, action)
    }

    pub fn confirm(&self, caller: Address, id: TxId) -> MultisigResult<()> {
        self.inner.lock().wallet.confirm(caller, id)
    }

    pub fn revoke(&self, caller: Address, id: TxId) -> MultisigResult<()> {
        self.inner.lock().wallet.revoke(caller, id)
    }

    pub fn execute(&self, caller: Address, id: TxId) -> MultisigResult<ExecutionResult> {
        let mut guard = self.inner.lock();
        let Inner { wallet, executor } = &mut *guard;
        wallet.execute(caller, id, executor)
    }

    pub fn confirm_and_execute(
        &self,
        caller: Address,
        id: TxId,
    ) -> MultisigResult<Option<ExecutionResult>> {
        let mut guard = self.inner.lock();
        let Inner { wallet, executor } = &mut *guard;
        wallet.confirm_and_execute(caller, id, executor)
    }

    /// Run a read-only query against the wallet
    pub fn with_wallet<R>(&self, f: impl FnOnce(&MultisigWallet) -> R) -> R {
        f(&self.inner.lock().wallet)
    }

    /// Run a closure against both wallet and executor under one lock
    pub fn with_parts<R>(&self, f: impl FnOnce(&mut MultisigWallet, &mut E) -> R) -> R {
        let mut guard = self.inner.lock();
        let Inner { wallet, executor } = &mut *guard;
        f(wallet, executor)
    }
}

impl SharedWallet<Treasury> {
    /// Fund the treasury and record the deposit on the wallet.
    ///
    /// Returns the new treasury balance.
    pub fn deposit(&self, from: Address, amount: u128) -> Result<u128, ExecutorError> {
        let mut guard = self.inner.lock();
        let balance = guard.executor.deposit(from, amount)?;
        guard.wallet.record_deposit(from, amount);
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::executor::ExecutorError;
    use crate::multisig::MultisigError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[derive(Clone, Default)]
    struct CountingExecutor {
        calls: Arc<AtomicUsize>,
    }

    impl Executor for CountingExecutor {
        fn perform(
            &mut self,
            _target: &Address,
            _payload: &[u8],
            _value: u128,
        ) -> Result<Vec<u8>, ExecutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_concurrent_execute_performs_once() {
        let executor = CountingExecutor::default();
        let calls = Arc::clone(&executor.calls);
        let wallet = MultisigWallet::new(vec![addr(1), addr(2), addr(3)], 2).unwrap();
        let shared = SharedWallet::new(wallet, executor);

        let id = shared.submit(addr(1), Action::transfer(addr(9), 1)).unwrap();
        shared.confirm(addr(2), id).unwrap();

        let handles: Vec<_> = (1..=3u8)
            .map(|n| {
                let shared = shared.clone();
                thread::spawn(move || shared.execute(addr(n), id))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(MultisigError::AlreadyExecuted(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_submissions_get_distinct_ids() {
        let wallet = MultisigWallet::new(vec![addr(1), addr(2)], 1).unwrap();
        let shared = SharedWallet::new(wallet, CountingExecutor::default());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || shared.submit(addr(1 + i % 2), Action::transfer(addr(9), 1)))
            })
            .collect();
        let mut ids: Vec<TxId> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        ids.sort_unstable();

        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert_eq!(shared.with_wallet(|w| w.transaction_count(true, true)), 8);
    }

    #[test]
    fn test_deposit_records_event() {
        let wallet = MultisigWallet::new(vec![addr(1), addr(2)], 1).unwrap();
        let shared = SharedWallet::new(wallet, Treasury::new());

        assert_eq!(shared.deposit(addr(7), 50).unwrap(), 50);
        assert!(matches!(
            shared.deposit(addr(7), 0),
            Err(ExecutorError::InvalidAmount)
        ));

        shared.with_parts(|wallet, treasury| {
            assert_eq!(treasury.balance(), 50);
            assert_eq!(wallet.events().len(), 1);
        });
    }
}
