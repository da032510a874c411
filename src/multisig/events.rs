//! Wallet event log
//!
//! Every state change the wallet makes is appended here with a sequence
//! number and a timestamp.

use crate::crypto::Address;
use crate::multisig::transaction::TxId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Submission { id: TxId, submitter: Address },
    Confirmation { id: TxId, owner: Address },
    Revocation { id: TxId, owner: Address },
    Execution { id: TxId },
    ExecutionFailure { id: TxId, reason: String },
    Deposit { from: Address, amount: u128 },
    OwnerAddition { owner: Address },
    OwnerRemoval { owner: Address },
    RequirementChange { required: usize },
}

/// A recorded wallet event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletEvent {
    /// Position in the log, starting at 0
    pub seq: u64,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

/// Append-only list of wallet events
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<WalletEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event and return its sequence number
    pub fn record(&mut self, kind: EventKind) -> u64 {
        let seq = self.events.len() as u64;
        self.events.push(WalletEvent {
            seq,
            kind,
            timestamp: Utc::now(),
        });
        seq
    }

    pub fn all(&self) -> &[WalletEvent] {
        &self.events
    }

    /// Events with `seq >= from`
    pub fn since(&self, from: u64) -> &[WalletEvent] {
        let start = (from as usize).min(self.events.len());
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        assert_eq!(log.record(EventKind::Execution { id: 0 }), 0);
        assert_eq!(
            log.record(EventKind::RequirementChange { required: 2 }),
            1
        );

        assert_eq!(log.len(), 2);
        assert_eq!(log.since(1).len(), 1);
        assert_eq!(log.since(1)[0].kind, EventKind::RequirementChange { required: 2 });
        assert!(log.since(10).is_empty());
    }
}
