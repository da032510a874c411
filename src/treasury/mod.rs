//! Wallet funds
//!
//! The treasury is the executor used by the command-line driver: it keeps
//! the wallet's balance and pays out the value of executed transactions.
//!
//! # Example
//!
//! ```ignore
//! use quorum_wallet::treasury::Treasury;
//!
//! let mut treasury = Treasury::new();
//! treasury.deposit(depositor, 1_000)?;
//!
//! // Pass it to `MultisigWallet::execute` as the executor
//! wallet.execute(owner, id, &mut treasury)?;
//! ```

pub mod treasury;

pub use treasury::{CallRecord, Treasury};
