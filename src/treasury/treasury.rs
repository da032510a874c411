//! In-memory treasury executor
//!
//! Holds the wallet's balance and performs the calls of executed
//! transactions: `value` moves from the treasury balance to the target, and
//! every performed call is appended to the call history.

use crate::crypto::Address;
use crate::multisig::executor::{Executor, ExecutorError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A call performed by the treasury
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRecord {
    /// Position in the call history
    pub seq: u64,
    pub target: Address,
    pub value: u128,
    /// Hex-encoded payload
    pub payload: String,
    pub performed_at: DateTime<Utc>,
}

/// Funds held on behalf of a multisig wallet
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Treasury {
    /// Spendable balance
    balance: u128,
    /// Total deposited, by depositor
    deposits: BTreeMap<Address, u128>,
    /// Total paid out, by recipient
    credits: BTreeMap<Address, u128>,
    /// Performed calls
    calls: Vec<CallRecord>,
    /// Targets whose calls are refused
    blocked: BTreeSet<Address>,
}

impl Treasury {
    /// Create an empty treasury
    pub fn new() -> Self {
        Self::default()
    }

    /// Spendable balance
    pub fn balance(&self) -> u128 {
        self.balance
    }

    /// Total received by `address` from executed transactions
    pub fn credited(&self, address: &Address) -> u128 {
        self.credits.get(address).copied().unwrap_or(0)
    }

    /// Total deposited by `address`
    pub fn deposited_by(&self, address: &Address) -> u128 {
        self.deposits.get(address).copied().unwrap_or(0)
    }

    /// Performed calls, oldest first
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    /// Add funds. Returns the new balance.
    pub fn deposit(&mut self, from: Address, amount: u128) -> Result<u128, ExecutorError> {
        if amount == 0 {
            return Err(ExecutorError::InvalidAmount);
        }

        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(ExecutorError::Overflow)?;
        let total = self
            .deposited_by(&from)
            .checked_add(amount)
            .ok_or(ExecutorError::Overflow)?;

        self.balance = balance;
        self.deposits.insert(from, total);

        log::debug!("Treasury deposit of {} from {}", amount, from);
        Ok(balance)
    }

    /// Refuse all future calls to `target`
    pub fn block(&mut self, target: Address) {
        self.blocked.insert(target);
    }

    /// Accept calls to `target` again
    pub fn unblock(&mut self, target: &Address) {
        self.blocked.remove(target);
    }

    pub fn is_blocked(&self, target: &Address) -> bool {
        self.blocked.contains(target)
    }
}

impl Executor for Treasury {
    fn perform(
        &mut self,
        target: &Address,
        payload: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, ExecutorError> {
        if self.is_blocked(target) {
            return Err(ExecutorError::Rejected {
                target: *target,
                reason: "target is blocked".to_string(),
            });
        }

        if value > self.balance {
            return Err(ExecutorError::InsufficientFunds {
                have: self.balance,
                need: value,
            });
        }

        let credited = self
            .credited(target)
            .checked_add(value)
            .ok_or(ExecutorError::Overflow)?;

        self.balance -= value;
        self.credits.insert(*target, credited);

        let seq = self.calls.len() as u64;
        self.calls.push(CallRecord {
            seq,
            target: *target,
            value,
            payload: hex::encode(payload),
            performed_at: Utc::now(),
        });

        log::debug!("Treasury paid {} to {}", value, target);
        Ok(seq.to_be_bytes().to_vec())
    }
}
