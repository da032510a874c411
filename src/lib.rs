//! Quorum Wallet: an owner-quorum multi-signature wallet engine in Rust
//!
//! This crate provides:
//! - An owner registry with an M-of-N confirmation requirement
//! - An append-only ledger of proposed transactions
//! - Per-owner confirmation tracking evaluated against the current owners
//! - Exactly-once execution through an injected executor
//! - Owner-set and requirement changes that need the same quorum as payments
//! - A thread-safe handle for concurrent callers
//! - JSON persistence with backups, and a command-line driver
//!
//! # Example
//!
//! ```rust
//! use quorum_wallet::crypto::Address;
//! use quorum_wallet::multisig::{Action, MultisigWallet};
//! use quorum_wallet::treasury::Treasury;
//!
//! let (alice, bob, carol) = (Address::random(), Address::random(), Address::random());
//! let recipient = Address::random();
//!
//! // Create a 2-of-3 wallet and fund it
//! let mut wallet = MultisigWallet::new(vec![alice, bob, carol], 2).unwrap();
//! let mut treasury = Treasury::new();
//! treasury.deposit(alice, 1_000).unwrap();
//!
//! // Alice proposes a payment, Bob approves, Carol executes
//! let id = wallet.submit(alice, Action::transfer(recipient, 250)).unwrap();
//! wallet.confirm(bob, id).unwrap();
//! wallet.execute(carol, id, &mut treasury).unwrap();
//!
//! assert_eq!(treasury.credited(&recipient), 250);
//! ```

pub mod cli;
pub mod crypto;
pub mod multisig;
pub mod storage;
pub mod treasury;

// Re-export commonly used types
pub use crypto::Address;
pub use multisig::{
    Action, ExecutionResult, Executor, MultisigError, MultisigWallet, OwnerChange, SharedWallet,
    Transaction, TxId, WalletSettings,
};
pub use storage::{Storage, StorageConfig, WalletSnapshot};
pub use treasury::Treasury;
