//! Quorum Wallet CLI Application
//!
//! A command-line interface for operating an owner-quorum multisig wallet.

use clap::{Parser, Subcommand};
use quorum_wallet::cli::{self, AppState, InitOptions};
use quorum_wallet::crypto::Address;
use quorum_wallet::multisig::{OwnerChange, TxId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quorum-wallet")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An owner-quorum multisig wallet in Rust", long_about = None)]
struct Cli {
    /// Data directory for wallet storage
    #[arg(short, long, default_value = ".quorum_wallet")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Init {
        /// Owner addresses (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        owners: Vec<Address>,

        /// Confirmations required to execute
        #[arg(short, long)]
        required: usize,

        /// Optional label for the wallet
        #[arg(short, long)]
        label: Option<String>,

        /// Maximum number of owners
        #[arg(long)]
        max_owners: Option<usize>,

        /// Do not confirm transactions on behalf of their submitter
        #[arg(long)]
        no_auto_confirm: bool,

        /// Overwrite an existing wallet
        #[arg(long)]
        force: bool,
    },

    /// Generate random addresses
    Keygen {
        /// Number of addresses
        #[arg(short, long, default_value = "1")]
        count: u32,
    },

    /// Deposit funds into the wallet
    Deposit {
        /// Depositor address
        #[arg(short, long)]
        from: Address,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u128,
    },

    /// Propose a transaction
    Submit {
        /// Submitting owner
        #[arg(short, long)]
        caller: Address,

        #[command(subcommand)]
        action: SubmitCommands,
    },

    /// Confirm a transaction
    Confirm {
        /// Confirming owner
        #[arg(short, long)]
        caller: Address,

        /// Transaction ID
        #[arg(short, long)]
        id: TxId,

        /// Execute right away if this confirmation completes the quorum
        #[arg(short, long)]
        execute: bool,
    },

    /// Revoke a confirmation
    Revoke {
        /// Revoking owner
        #[arg(short, long)]
        caller: Address,

        /// Transaction ID
        #[arg(short, long)]
        id: TxId,
    },

    /// Execute a confirmed transaction
    Execute {
        /// Executing owner
        #[arg(short, long)]
        caller: Address,

        /// Transaction ID
        #[arg(short, long)]
        id: TxId,
    },

    /// Show a transaction
    Show {
        /// Transaction ID
        #[arg(short, long)]
        id: TxId,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions
    List {
        /// Include pending transactions
        #[arg(long)]
        pending: bool,

        /// Include executed transactions
        #[arg(long)]
        executed: bool,
    },

    /// Show owners and policy
    Owners,

    /// Show the event log
    Events {
        /// First event sequence number to show
        #[arg(long, default_value = "0")]
        since: u64,
    },

    /// Show balances
    Balance {
        /// Show what this address has received instead
        #[arg(short, long)]
        address: Option<Address>,
    },

    /// Export wallet state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import wallet state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum SubmitCommands {
    /// Send value (and optionally a call payload) to an address
    Transfer {
        /// Recipient address
        #[arg(short, long)]
        to: Address,

        /// Amount to send
        #[arg(short, long, default_value = "0")]
        value: u128,

        /// Call payload as hex
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Add an owner
    AddOwner {
        #[arg(short, long)]
        owner: Address,
    },

    /// Remove an owner
    RemoveOwner {
        #[arg(short, long)]
        owner: Address,
    },

    /// Replace an owner
    ReplaceOwner {
        #[arg(long)]
        old: Address,

        #[arg(long)]
        new: Address,
    },

    /// Change the number of required confirmations
    ChangeRequirement {
        #[arg(short, long)]
        required: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle commands that don't need saved state
    match cli.command {
        Commands::Init {
            owners,
            required,
            label,
            max_owners,
            no_auto_confirm,
            force,
        } => {
            let options = InitOptions {
                owners,
                required,
                label,
                max_owners,
                auto_confirm: !no_auto_confirm,
                force,
            };
            return cli::cmd_init(&cli.data_dir, options);
        }
        Commands::Keygen { count } => return cli::cmd_keygen(count),
        command => run_command(command, cli.data_dir),
    }
}

fn run_command(command: Commands, data_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize application state
    let mut state = AppState::load(data_dir)?;

    // Process commands
    match command {
        Commands::Init { .. } | Commands::Keygen { .. } => unreachable!(),

        Commands::Deposit { from, amount } => {
            cli::cmd_deposit(&mut state, from, amount)?;
        }

        Commands::Submit { caller, action } => {
            let action = match action {
                SubmitCommands::Transfer { to, value, payload } => {
                    cli::transfer_action(to, value, payload.as_deref())?
                }
                SubmitCommands::AddOwner { owner } => {
                    cli::admin_action(OwnerChange::AddOwner { owner })
                }
                SubmitCommands::RemoveOwner { owner } => {
                    cli::admin_action(OwnerChange::RemoveOwner { owner })
                }
                SubmitCommands::ReplaceOwner { old, new } => {
                    cli::admin_action(OwnerChange::ReplaceOwner { old, new })
                }
                SubmitCommands::ChangeRequirement { required } => {
                    cli::admin_action(OwnerChange::ChangeRequirement { required })
                }
            };
            cli::cmd_submit(&mut state, caller, action)?;
        }

        Commands::Confirm {
            caller,
            id,
            execute,
        } => {
            cli::cmd_confirm(&mut state, caller, id, execute)?;
        }

        Commands::Revoke { caller, id } => {
            cli::cmd_revoke(&mut state, caller, id)?;
        }

        Commands::Execute { caller, id } => {
            cli::cmd_execute(&mut state, caller, id)?;
        }

        Commands::Show { id, json } => {
            cli::cmd_show(&state, id, json)?;
        }

        Commands::List { pending, executed } => {
            cli::cmd_list(&state, pending, executed)?;
        }

        Commands::Owners => {
            cli::cmd_owners(&state)?;
        }

        Commands::Events { since } => {
            cli::cmd_events(&state, since)?;
        }

        Commands::Balance { address } => {
            cli::cmd_balance(&state, address)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}
