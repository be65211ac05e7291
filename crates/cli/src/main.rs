//! Cosign CLI - Main entry point

use clap::{Parser, Subcommand};
use cosign_cli::{commands, AppContext};
use cosign_core::Address;
use cosign_events::EventKind;
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cosign")]
#[command(about = "Cosign - shared-custody M-of-N vault", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a vault with a fixed owner set and threshold
    Init {
        /// Owner address (repeat for each owner)
        #[arg(long = "owner", required = true)]
        owners: Vec<Address>,
        /// Confirmations required to execute
        #[arg(long)]
        required: usize,
        /// Vault label
        #[arg(long, default_value = "vault")]
        name: String,
    },

    /// Credit funds to the vault
    Deposit {
        /// Sender address
        #[arg(long)]
        from: Address,
        /// Amount in native units
        amount: Decimal,
    },

    /// Propose a transfer
    Submit {
        /// Calling owner
        #[arg(long = "as")]
        caller: Address,
        /// Recipient address
        to: Address,
        /// Amount in native units
        value: Decimal,
        /// Hex payload forwarded to the transfer
        #[arg(long)]
        data: Option<String>,
    },

    /// Approve a pending transaction
    Confirm {
        /// Calling owner
        #[arg(long = "as")]
        caller: Address,
        /// Transaction index
        tx: usize,
    },

    /// Withdraw an earlier approval
    Revoke {
        /// Calling owner
        #[arg(long = "as")]
        caller: Address,
        /// Transaction index
        tx: usize,
    },

    /// Execute a transaction that has enough confirmations
    Execute {
        /// Calling owner
        #[arg(long = "as")]
        caller: Address,
        /// Transaction index
        tx: usize,
    },

    /// Show one transaction
    Show {
        /// Transaction index
        tx: usize,
    },

    /// List all transactions
    List,

    /// Show owners, threshold and balance
    Owners,

    /// Verify confirmation counters against the confirmation table
    Audit,

    /// Print journaled events
    History {
        /// Only events for this transaction
        #[arg(long)]
        tx: Option<usize>,
        /// Only events of this kind (deposit, submit, confirm, revoke, execute)
        #[arg(long)]
        kind: Option<EventKind>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let open = || AppContext::open(&cli.data);

    match cli.command {
        Commands::Init {
            owners,
            required,
            name,
        } => {
            commands::init(&cli.data, &name, owners, required)?;
        }

        Commands::Deposit { from, amount } => {
            commands::deposit(&mut open()?, from, amount)?;
        }

        Commands::Submit {
            caller,
            to,
            value,
            data,
        } => {
            commands::submit(&mut open()?, caller, to, value, data.as_deref())?;
        }

        Commands::Confirm { caller, tx } => {
            commands::confirm(&mut open()?, caller, tx)?;
        }

        Commands::Revoke { caller, tx } => {
            commands::revoke(&mut open()?, caller, tx)?;
        }

        Commands::Execute { caller, tx } => {
            commands::execute(&mut open()?, caller, tx).await?;
        }

        Commands::Show { tx } => {
            commands::show(&open()?, tx)?;
        }

        Commands::List => {
            commands::list(&open()?)?;
        }

        Commands::Owners => {
            commands::owners(&open()?)?;
        }

        Commands::Audit => {
            commands::audit(&open()?)?;
        }

        Commands::History { tx, kind } => {
            commands::history(&open()?, tx, kind)?;
        }
    }

    Ok(())
}
