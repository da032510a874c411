//! Proposed wallet transactions
//!
//! A transaction carries the action to perform, the set of owners that
//! confirmed it, and its execution status. The status only ever moves
//! from `Pending` to `Executed`.

use crate::crypto::{sha256_parts, Address};
use crate::multisig::error::{MultisigError, MultisigResult};
use crate::multisig::registry::{OwnerChange, OwnerRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction identifier, assigned in strictly increasing order
pub type TxId = u64;

/// What a transaction does once executed
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Send `value` to `target` with an opaque `payload`, through the executor
    Call {
        target: Address,
        value: u128,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
    },
    /// Mutate the wallet's own owner registry
    Admin(OwnerChange),
}

impl Action {
    /// Plain value transfer with no payload
    pub fn transfer(target: Address, value: u128) -> Self {
        Action::Call {
            target,
            value,
            payload: Vec::new(),
        }
    }

    /// Call target; `None` designates the wallet's own registry
    pub fn target(&self) -> Option<Address> {
        match self {
            Action::Call { target, .. } => Some(*target),
            Action::Admin(_) => None,
        }
    }

    /// Value attached to the action
    pub fn value(&self) -> u128 {
        match self {
            Action::Call { value, .. } => *value,
            Action::Admin(_) => 0,
        }
    }

    /// Call payload, or the encoded registry mutation
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Action::Call { payload, .. } => payload.clone(),
            Action::Admin(change) => change.encode(),
        }
    }

    /// Whether this action changes the owner registry
    pub fn is_admin(&self) -> bool {
        matches!(self, Action::Admin(_))
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        match self {
            Action::Call {
                target,
                value,
                payload,
            } if payload.is_empty() => format!("transfer {} to {}", value, target),
            Action::Call {
                target,
                value,
                payload,
            } => format!(
                "call {} with {} bytes, value {}",
                target,
                payload.len(),
                value
            ),
            Action::Admin(change) => change.to_string(),
        }
    }
}

/// Execution status of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxStatus {
    /// Collecting confirmations
    Pending,
    /// Executed; terminal
    Executed,
}

/// Recorded result of an execution attempt
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The action was performed
    Success {
        #[serde(with = "hex_payload")]
        return_data: Vec<u8>,
    },
    /// The action was attempted and failed; it will not be retried
    Failed { reason: String },
}

/// A proposed transaction and its confirmation state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: TxId,
    /// Action performed on execution
    pub action: Action,
    /// Owner that submitted the transaction
    pub submitter: Address,
    /// Owners that confirmed, in confirmation order
    confirmations: Vec<Address>,
    /// Current status
    status: TxStatus,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
    /// When the transaction was executed
    pub executed_at: Option<DateTime<Utc>>,
    /// Result of the execution attempt
    pub outcome: Option<ExecutionOutcome>,
}

impl Transaction {
    /// Create a new pending transaction with no confirmations
    pub fn new(id: TxId, action: Action, submitter: Address) -> Self {
        Self {
            id,
            action,
            submitter,
            confirmations: Vec::new(),
            status: TxStatus::Pending,
            submitted_at: Utc::now(),
            executed_at: None,
            outcome: None,
        }
    }

    /// Current status
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Whether the transaction has been executed
    pub fn is_executed(&self) -> bool {
        self.status == TxStatus::Executed
    }

    /// Recorded confirmers, in confirmation order
    pub fn confirmations(&self) -> &[Address] {
        &self.confirmations
    }

    /// Whether `owner` has confirmed
    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.contains(owner)
    }

    /// Confirmations that belong to current owners
    pub fn count_confirmations(&self, registry: &OwnerRegistry) -> usize {
        self.confirmations
            .iter()
            .filter(|c| registry.is_owner(c))
            .count()
    }

    /// Digest over the ID and the encoded action
    pub fn digest(&self) -> Vec<u8> {
        let target = self.action.target().unwrap_or(Address::ZERO);
        let id = self.id.to_be_bytes();
        let value = self.action.value().to_be_bytes();
        let payload = self.action.payload();
        sha256_parts(&[&id[..], &target.as_bytes()[..], &value[..], &payload[..]])
    }

    /// Hex form of [`Transaction::digest`]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    fn ensure_pending(&self) -> MultisigResult<()> {
        if self.is_executed() {
            return Err(MultisigError::AlreadyExecuted(self.id));
        }
        Ok(())
    }

    /// Record a confirmation from `owner`
    pub(crate) fn add_confirmation(&mut self, owner: Address) -> MultisigResult<()> {
        self.ensure_pending()?;

        if self.is_confirmed_by(&owner) {
            return Err(MultisigError::AlreadyConfirmed { id: self.id, owner });
        }

        self.confirmations.push(owner);
        Ok(())
    }

    /// Withdraw the confirmation from `owner`
    pub(crate) fn remove_confirmation(&mut self, owner: Address) -> MultisigResult<()> {
        self.ensure_pending()?;

        let before = self.confirmations.len();
        self.confirmations.retain(|c| *c != owner);
        if self.confirmations.len() == before {
            return Err(MultisigError::NotConfirmed { id: self.id, owner });
        }
        Ok(())
    }

    /// Drop a departed owner's confirmation from a pending transaction
    pub(crate) fn purge(&mut self, owner: &Address) -> bool {
        if self.is_executed() {
            return false;
        }
        let before = self.confirmations.len();
        self.confirmations.retain(|c| c != owner);
        self.confirmations.len() != before
    }

    /// Flip to `Executed`
    pub(crate) fn mark_executed(&mut self) -> MultisigResult<()> {
        self.ensure_pending()?;
        self.status = TxStatus::Executed;
        self.executed_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn record_outcome(&mut self, outcome: ExecutionOutcome) {
        self.outcome = Some(outcome);
    }
}

/// Serialize byte payloads as hex strings
mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn create_test_tx() -> Transaction {
        Transaction::new(0, Action::transfer(addr(9), 50), addr(1))
    }

    #[test]
    fn test_pending_tx_creation() {
        let tx = create_test_tx();

        assert_eq!(tx.status(), TxStatus::Pending);
        assert!(tx.confirmations().is_empty());
        assert!(tx.executed_at.is_none());
        assert!(tx.outcome.is_none());
    }

    #[test]
    fn test_duplicate_confirmation_rejected() {
        let mut tx = create_test_tx();

        tx.add_confirmation(addr(1)).unwrap();
        let result = tx.add_confirmation(addr(1));
        assert!(matches!(result, Err(MultisigError::AlreadyConfirmed { .. })));
        assert_eq!(tx.confirmations(), &[addr(1)]);
    }

    #[test]
    fn test_remove_unknown_confirmation() {
        let mut tx = create_test_tx();

        let result = tx.remove_confirmation(addr(2));
        assert!(matches!(result, Err(MultisigError::NotConfirmed { .. })));
    }

    #[test]
    fn test_executed_tx_is_frozen() {
        let mut tx = create_test_tx();
        tx.add_confirmation(addr(1)).unwrap();
        tx.mark_executed().unwrap();

        assert!(matches!(
            tx.add_confirmation(addr(2)),
            Err(MultisigError::AlreadyExecuted(0))
        ));
        assert!(matches!(
            tx.remove_confirmation(addr(1)),
            Err(MultisigError::AlreadyExecuted(0))
        ));
        assert!(matches!(
            tx.mark_executed(),
            Err(MultisigError::AlreadyExecuted(0))
        ));
        assert!(!tx.purge(&addr(1)));
        assert_eq!(tx.confirmations(), &[addr(1)]);
    }

    #[test]
    fn test_count_ignores_former_owners() {
        let registry = OwnerRegistry::new(vec![addr(1), addr(2)], 2).unwrap();
        let mut tx = create_test_tx();
        tx.add_confirmation(addr(1)).unwrap();
        tx.add_confirmation(addr(3)).unwrap();

        assert_eq!(tx.count_confirmations(&registry), 1);
    }

    #[test]
    fn test_digest_depends_on_id_and_action() {
        let a = Transaction::new(0, Action::transfer(addr(9), 50), addr(1));
        let b = Transaction::new(1, Action::transfer(addr(9), 50), addr(1));
        let c = Transaction::new(0, Action::transfer(addr(9), 51), addr(1));

        assert_eq!(a.digest_hex().len(), 64);
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_admin_action_accessors() {
        let action = Action::Admin(OwnerChange::ChangeRequirement { required: 3 });

        assert!(action.is_admin());
        assert_eq!(action.target(), None);
        assert_eq!(action.value(), 0);
        assert_eq!(action.payload()[0], 0x04);
    }

    #[test]
    fn test_payload_serializes_as_hex() {
        let action = Action::Call {
            target: addr(9),
            value: 1,
            payload: vec![0xde, 0xad],
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"dead\""));

        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
