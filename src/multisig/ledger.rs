//! Append-only transaction ledger
//!
//! Stores every submitted transaction by ID. Entries are never removed:
//! a transaction stays in the ledger forever, either pending or executed.

use crate::crypto::Address;
use crate::multisig::error::{MultisigError, MultisigResult};
use crate::multisig::transaction::{Transaction, TxId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ledger of submitted transactions
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionLedger {
    /// Transactions by ID
    transactions: BTreeMap<TxId, Transaction>,
    /// Next ID to hand out
    next_id: TxId,
}

impl TransactionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            transactions: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// ID the next appended transaction will receive
    pub fn next_id(&self) -> TxId {
        self.next_id
    }

    /// Store a transaction under the next ID, returning that ID.
    ///
    /// The transaction's own `id` field is overwritten.
    pub fn append(&mut self, mut tx: Transaction) -> TxId {
        let id = self.next_id;
        self.next_id += 1;
        tx.id = id;
        self.transactions.insert(id, tx);
        id
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TxId) -> MultisigResult<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or(MultisigError::TransactionNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: TxId) -> MultisigResult<&mut Transaction> {
        self.transactions
            .get_mut(&id)
            .ok_or(MultisigError::TransactionNotFound(id))
    }

    /// Number of stored transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// All transactions in ID order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    fn filtered(
        &self,
        include_pending: bool,
        include_executed: bool,
    ) -> impl Iterator<Item = &Transaction> {
        self.transactions.values().filter(move |tx| {
            (include_pending && !tx.is_executed()) || (include_executed && tx.is_executed())
        })
    }

    /// Count transactions matching the status filter
    pub fn transaction_count(&self, include_pending: bool, include_executed: bool) -> usize {
        self.filtered(include_pending, include_executed).count()
    }

    /// IDs at positions `from..to` of the status-filtered list.
    ///
    /// Out-of-range bounds are clamped to the filtered list.
    pub fn transaction_ids(
        &self,
        from: usize,
        to: usize,
        include_pending: bool,
        include_executed: bool,
    ) -> Vec<TxId> {
        let end = to.max(from);
        self.filtered(include_pending, include_executed)
            .skip(from)
            .take(end - from)
            .map(|tx| tx.id)
            .collect()
    }

    /// Remove a departed owner's confirmations from every pending transaction.
    ///
    /// Returns the IDs that lost a confirmation.
    pub(crate) fn purge_confirmations(&mut self, owner: &Address) -> Vec<TxId> {
        self.transactions
            .values_mut()
            .filter_map(|tx| tx.purge(owner).then_some(tx.id))
            .collect()
    }

    /// Check that stored IDs are consistent with the ID counter
    pub fn validate(&self) -> MultisigResult<()> {
        for (key, tx) in &self.transactions {
            if *key != tx.id || tx.id >= self.next_id {
                return Err(MultisigError::config(format!(
                    "ledger entry {} is inconsistent with next id {}",
                    tx.id, self.next_id
                )));
            }
        }
        Ok(())
    }
}
