//! Multisig error taxonomy

use crate::crypto::Address;
use crate::multisig::transaction::TxId;
use thiserror::Error;

/// Errors related to multisig operations
///
/// Every variant except [`MultisigError::ExecutionFailed`] is reported with
/// no state change. `ExecutionFailed` is reported after the transaction has
/// been marked executed; see [`crate::multisig::ExecutionEngine`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Caller is not an owner: {0}")]
    NotOwner(Address),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TxId),
    #[error("Transaction {0} already executed")]
    AlreadyExecuted(TxId),
    #[error("Transaction {id} already confirmed by {owner}")]
    AlreadyConfirmed { id: TxId, owner: Address },
    #[error("Transaction {id} not confirmed by {owner}")]
    NotConfirmed { id: TxId, owner: Address },
    #[error("Quorum not met for transaction {id}: have {have}, need {need}")]
    QuorumNotMet { id: TxId, have: usize, need: usize },
    #[error("Execution of transaction {id} failed: {reason}")]
    ExecutionFailed { id: TxId, reason: String },
}

impl MultisigError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        MultisigError::Config(msg.into())
    }
}

/// Result alias for multisig operations
pub type MultisigResult<T> = Result<T, MultisigError>;
