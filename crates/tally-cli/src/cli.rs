use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_types::Decimal;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally - account balances kept in append-only logs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the ledger files (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open a new account
    CreateAccount(CreateAccountArgs),
    /// Credit an account
    Deposit(AmountArgs),
    /// Debit an account
    Withdraw(AmountArgs),
    /// Move funds between two accounts
    Transfer(TransferArgs),
    /// Show one account
    Balance(BalanceArgs),
    /// List every account with totals
    Summary(SummaryArgs),
    /// List the transactions of one account
    History(HistoryArgs),
    /// Report transfers whose two legs do not pair up
    Audit(AuditArgs),
    /// Run the walkthrough scenario, restart, and keep going
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct CreateAccountArgs {
    pub name: String,
    #[arg(default_value = "0")]
    pub opening_balance: Decimal,
    /// Defaults to the configured currency
    #[arg(long)]
    pub currency: Option<String>,
}

#[derive(Args)]
pub struct AmountArgs {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Args)]
pub struct TransferArgs {
    pub source: String,
    pub target: String,
    pub amount: Decimal,
}

#[derive(Args)]
pub struct BalanceArgs {
    pub name: String,
}

#[derive(Args)]
pub struct SummaryArgs {}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(required_unless_present = "system")]
    pub name: Option<String>,
    /// Show only the most recent N rows
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Read the system-wide log instead of one account
    #[arg(long, conflicts_with = "name")]
    pub system: bool,
}

#[derive(Args)]
pub struct AuditArgs {}

#[derive(Args)]
pub struct DemoArgs {
    /// Skip the simulated validity-check latency
    #[arg(long)]
    pub fast: bool,
}
