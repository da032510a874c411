//! Owner-quorum multi-signature wallet
//!
//! A wallet holds a set of owners and a requirement `M`. Any owner may
//! propose a transaction; it executes only once `M` distinct current owners
//! have confirmed it, and then exactly once. Changes to the owner set or the
//! requirement are themselves transactions and need the same quorum.
//!
//! # Example
//!
//! ```ignore
//! use quorum_wallet::multisig::{Action, MultisigWallet};
//! use quorum_wallet::treasury::Treasury;
//!
//! // Create a 2-of-3 wallet
//! let mut wallet = MultisigWallet::new(vec![alice, bob, carol], 2)?;
//! let mut treasury = Treasury::new();
//! treasury.deposit(alice, 1_000)?;
//!
//! // Alice proposes (and thereby confirms) a transfer
//! let id = wallet.submit(alice, Action::transfer(recipient, 250))?;
//!
//! // Bob's confirmation completes the quorum
//! wallet.confirm(bob, id)?;
//! wallet.execute(carol, id, &mut treasury)?;
//! ```

pub mod error;
pub mod events;
pub mod executor;
pub mod ledger;
pub mod registry;
pub mod shared;
pub mod tracker;
pub mod transaction;
pub mod wallet;

pub use error::{MultisigError, MultisigResult};
pub use events::{EventKind, EventLog, WalletEvent};
pub use executor::{ExecutionEngine, ExecutionResult, Executor, ExecutorError};
pub use ledger::TransactionLedger;
pub use registry::{OwnerChange, OwnerRegistry, MAX_OWNER_COUNT};
pub use shared::SharedWallet;
pub use tracker::ConfirmationTracker;
pub use transaction::{Action, ExecutionOutcome, Transaction, TxId, TxStatus};
pub use wallet::{MultisigWallet, WalletSettings};
