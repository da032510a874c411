//! CLI commands for the wallet
//!
//! Implements all command handlers for the CLI interface. Every handler
//! loads the saved state, runs one wallet operation and saves the result.

use crate::crypto::Address;
use crate::multisig::{
    Action, EventKind, ExecutionOutcome, ExecutionResult, MultisigError, MultisigWallet,
    OwnerChange, Transaction, TxId, WalletSettings,
};
use crate::storage::{self, Storage, StorageConfig, WalletSnapshot};
use crate::treasury::Treasury;
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub wallet: MultisigWallet,
    pub treasury: Treasury,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the saved wallet from `data_dir`
    pub fn load(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "no wallet found in {:?}; create one with: quorum-wallet init",
                data_dir
            )
            .into());
        }

        let WalletSnapshot { wallet, treasury } = storage.load()?;
        log::debug!("Loaded wallet {} from {:?}", wallet.address(), data_dir);

        Ok(Self {
            wallet,
            treasury,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        let snapshot = WalletSnapshot::new(self.wallet.clone(), self.treasury.clone());
        self.storage.save(&snapshot)?;
        Ok(())
    }
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    let config = StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    };
    Ok(Storage::new(config)?)
}

/// Options for `init`
#[derive(Debug, Clone)]
pub struct InitOptions {
    pub owners: Vec<Address>,
    pub required: usize,
    pub label: Option<String>,
    pub max_owners: Option<usize>,
    pub auto_confirm: bool,
    pub force: bool,
}

/// Create a new wallet
pub fn cmd_init(data_dir: &Path, options: InitOptions) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !options.force {
        println!("⚠️  A wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let defaults = WalletSettings::default();
    let settings = WalletSettings {
        max_owners: options.max_owners.unwrap_or(defaults.max_owners),
        auto_confirm_on_submit: options.auto_confirm,
    };

    let mut wallet = MultisigWallet::with_settings(options.owners, options.required, settings)?;
    if let Some(label) = options.label {
        wallet = wallet.with_label(label);
    }

    storage.save(&WalletSnapshot::new(wallet.clone(), Treasury::new()))?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", wallet.address());
    println!("   🔐 Policy: {}", wallet.description());
    for owner in wallet.owners() {
        println!("   └─ Owner {}", owner);
    }

    Ok(())
}

/// Print fresh random addresses
pub fn cmd_keygen(count: u32) -> CliResult<()> {
    println!("🔑 Generated addresses:");
    for _ in 0..count {
        println!("   {}", Address::random());
    }
    Ok(())
}

/// Add funds to the treasury
pub fn cmd_deposit(state: &mut AppState, from: Address, amount: u128) -> CliResult<()> {
    let balance = state.treasury.deposit(from, amount)?;
    state.wallet.record_deposit(from, amount);
    state.save()?;

    println!("💰 Deposited {} from {}", amount, from);
    println!("   Balance: {}", balance);
    Ok(())
}

/// Build the action for a value transfer or call
pub fn transfer_action(to: Address, value: u128, payload: Option<&str>) -> CliResult<Action> {
    let payload = match payload {
        Some(hex_str) => hex::decode(hex_str.trim_start_matches("0x"))?,
        None => Vec::new(),
    };
    Ok(Action::Call {
        target: to,
        value,
        payload,
    })
}

/// Build an administrative action
pub fn admin_action(change: OwnerChange) -> Action {
    Action::Admin(change)
}

/// Submit a transaction
pub fn cmd_submit(state: &mut AppState, caller: Address, action: Action) -> CliResult<()> {
    let summary = action.summary();
    let id = state.wallet.submit(caller, action)?;
    state.save()?;

    println!("📤 Transaction {} submitted", id);
    println!("   Action: {}", summary);
    println!("   From: {}", caller);
    print_confirmations(state, id)?;
    Ok(())
}

/// Confirm a transaction, optionally executing it when quorum is reached
pub fn cmd_confirm(
    state: &mut AppState,
    caller: Address,
    id: TxId,
    execute: bool,
) -> CliResult<()> {
    // The confirmation is persisted before any execution attempt
    state.wallet.confirm(caller, id)?;
    state.save()?;

    println!("✍️  Transaction {} confirmed by {}", id, caller);
    print_confirmations(state, id)?;

    if !execute {
        return Ok(());
    }
    if !state.wallet.is_confirmed(id)? {
        println!("   Quorum not yet reached; not executing");
        return Ok(());
    }

    let outcome = state.wallet.execute(caller, id, &mut state.treasury);
    finish_execution(state, id, outcome)
}

/// Revoke a confirmation
pub fn cmd_revoke(state: &mut AppState, caller: Address, id: TxId) -> CliResult<()> {
    state.wallet.revoke(caller, id)?;
    state.save()?;

    println!("↩️  Confirmation of transaction {} revoked by {}", id, caller);
    print_confirmations(state, id)?;
    Ok(())
}

/// Execute a confirmed transaction
pub fn cmd_execute(state: &mut AppState, caller: Address, id: TxId) -> CliResult<()> {
    let outcome = state.wallet.execute(caller, id, &mut state.treasury);
    finish_execution(state, id, outcome)
}

fn finish_execution(
    state: &mut AppState,
    id: TxId,
    outcome: Result<ExecutionResult, MultisigError>,
) -> CliResult<()> {
    match outcome {
        Ok(result) => {
            state.save()?;
            println!("✅ Transaction {} executed", id);
            println!("   Digest: {}", result.digest);
            if !result.return_data.is_empty() {
                println!("   Return data: 0x{}", hex::encode(&result.return_data));
            }
            Ok(())
        }
        Err(e @ MultisigError::ExecutionFailed { .. }) => {
            // The transaction is executed even though the call failed
            state.save()?;
            println!("❌ Transaction {} was executed but its call failed", id);
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_confirmations(state: &AppState, id: TxId) -> CliResult<()> {
    let confirmers = state.wallet.confirmations(id)?;
    println!(
        "   Confirmations: {}/{}",
        confirmers.len(),
        state.wallet.required()
    );
    for owner in confirmers {
        println!("   └─ {}", owner);
    }
    Ok(())
}

/// Show one transaction
pub fn cmd_show(state: &AppState, id: TxId, json: bool) -> CliResult<()> {
    let tx = state.wallet.get_transaction(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(tx)?);
        return Ok(());
    }

    print_transaction(state, tx)?;
    Ok(())
}

fn print_transaction(state: &AppState, tx: &Transaction) -> CliResult<()> {
    println!("🧾 Transaction {}", tx.id);
    println!("   ├─ Action: {}", tx.action.summary());
    println!("   ├─ Submitter: {}", tx.submitter);
    println!(
        "   ├─ Submitted: {}",
        tx.submitted_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!("   ├─ Digest: {}", tx.digest_hex());
    println!(
        "   ├─ Confirmed: {} ({}/{})",
        state.wallet.is_confirmed(tx.id)?,
        state.wallet.confirmation_count(tx.id)?,
        state.wallet.required()
    );
    match (&tx.executed_at, &tx.outcome) {
        (Some(at), Some(ExecutionOutcome::Success { .. })) => {
            println!("   └─ Executed: {}", at.format("%Y-%m-%d %H:%M:%S"))
        }
        (Some(at), Some(ExecutionOutcome::Failed { reason })) => println!(
            "   └─ Executed: {} (call failed: {})",
            at.format("%Y-%m-%d %H:%M:%S"),
            reason
        ),
        _ => println!("   └─ Status: pending"),
    }
    Ok(())
}

/// List transactions
pub fn cmd_list(state: &AppState, pending: bool, executed: bool) -> CliResult<()> {
    // No filter flags means everything
    let (pending, executed) = if !pending && !executed {
        (true, true)
    } else {
        (pending, executed)
    };

    let total = state.wallet.transaction_count(pending, executed);
    if total == 0 {
        println!("📭 No transactions found.");
        return Ok(());
    }

    println!("📋 Transactions ({}):", total);
    for id in state.wallet.transaction_ids(0, total, pending, executed) {
        let tx = state.wallet.get_transaction(id)?;
        let status = if tx.is_executed() { "executed" } else { "pending" };
        println!(
            "   #{} | {} | {}/{} | {}",
            id,
            status,
            state.wallet.confirmation_count(id)?,
            state.wallet.required(),
            tx.action.summary()
        );
    }
    Ok(())
}

/// Show owners and policy
pub fn cmd_owners(state: &AppState) -> CliResult<()> {
    println!("🔐 Wallet {}", state.wallet.address());
    if let Some(label) = &state.wallet.label {
        println!("   🏷️  Label: {}", label);
    }
    println!("   Policy: {}", state.wallet.description());
    for owner in state.wallet.owners() {
        println!("   └─ {}", owner);
    }
    Ok(())
}

/// Show the event log
pub fn cmd_events(state: &AppState, since: u64) -> CliResult<()> {
    let events = state.wallet.events_since(since);

    if events.is_empty() {
        println!("📭 No events.");
        return Ok(());
    }

    println!("📜 Events:");
    for event in events {
        let text = match &event.kind {
            EventKind::Submission { id, submitter } => {
                format!("submission of #{} by {}", id, submitter)
            }
            EventKind::Confirmation { id, owner } => format!("#{} confirmed by {}", id, owner),
            EventKind::Revocation { id, owner } => format!("#{} revoked by {}", id, owner),
            EventKind::Execution { id } => format!("#{} executed", id),
            EventKind::ExecutionFailure { id, reason } => {
                format!("#{} execution failed: {}", id, reason)
            }
            EventKind::Deposit { from, amount } => format!("deposit of {} from {}", amount, from),
            EventKind::OwnerAddition { owner } => format!("owner {} added", owner),
            EventKind::OwnerRemoval { owner } => format!("owner {} removed", owner),
            EventKind::RequirementChange { required } => {
                format!("requirement changed to {}", required)
            }
        };
        println!(
            "   {:>4} | {} | {}",
            event.seq,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            text
        );
    }
    Ok(())
}

/// Show the treasury balance, or what an address has received
pub fn cmd_balance(state: &AppState, address: Option<Address>) -> CliResult<()> {
    match address {
        Some(address) => {
            println!("💰 {}", address);
            println!("   Received: {}", state.treasury.credited(&address));
            println!("   Deposited: {}", state.treasury.deposited_by(&address));
        }
        None => {
            println!("💰 Treasury of {}", state.wallet.address());
            println!("   Balance: {}", state.treasury.balance());
            println!("   Calls performed: {}", state.treasury.calls().len());
        }
    }
    Ok(())
}

/// Export wallet state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    let snapshot = WalletSnapshot::new(state.wallet.clone(), state.treasury.clone());
    storage::save_to_file(&snapshot, path)?;
    println!("📦 Wallet exported to {:?}", path);
    Ok(())
}

/// Import wallet state from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let WalletSnapshot { wallet, treasury } = storage::load_from_file(path)?;

    state.wallet = wallet;
    state.treasury = treasury;
    state.save()?;

    println!("📥 Wallet imported from {:?}", path);
    println!("   Address: {}", state.wallet.address());
    println!("   Transactions: {}", state.wallet.transaction_count(true, true));
    Ok(())
}
