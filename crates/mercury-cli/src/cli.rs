use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mercury_types::{Currency, EventKind};

#[derive(Parser)]
#[command(name = "mercury", about = "Mercury economy ledger", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Server configuration file (TOML). Missing file means defaults.
    #[arg(short, long, global = true, default_value = "mercury.toml")]
    pub config: PathBuf,

    /// Event log to use instead of the configured `data_path`.
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

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

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    Transfer,
    Mint,
    Burn,
}

impl From<KindArg> for EventKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Transfer => EventKind::Transfer,
            KindArg::Mint => EventKind::Mint,
            KindArg::Burn => EventKind::Burn,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Show an account balance
    Balance(BalanceArgs),
    /// Show recent events, newest first
    History(HistoryArgs),
    /// Create currency in an account
    Mint(MintArgs),
    /// Move currency between accounts
    Transfer(TransferArgs),
    /// Destroy currency from an account
    Burn(BurnArgs),
    /// Grant the standard stipend
    Stipend(StipendArgs),
    /// Replay and audit the whole event log
    Verify,
    /// Import records exported in the untagged legacy format
    ImportLegacy(ImportLegacyArgs),
    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[arg(long)]
    pub admin_token: Option<String>,
}

#[derive(Args)]
pub struct BalanceArgs {
    pub user: String,
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Only events involving this account
    pub user: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    /// Only events of these kinds
    #[arg(long, value_enum)]
    pub kind: Vec<KindArg>,
    /// Only events committed after this time (ms since epoch)
    #[arg(long)]
    pub since: Option<u64>,
}

#[derive(Args)]
pub struct MintArgs {
    pub to: String,
    /// Amount in units, e.g. `12.5`
    pub amount: Currency,
    #[arg(short, long, default_value = "")]
    pub note: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub from: String,
    pub to: String,
    pub amount: Currency,
    #[arg(short, long, default_value = "")]
    pub note: String,
}

#[derive(Args)]
pub struct BurnArgs {
    pub from: String,
    pub amount: Currency,
    #[arg(short, long, default_value = "")]
    pub note: String,
    #[arg(long, default_value = "")]
    pub link: String,
}

#[derive(Args)]
pub struct StipendArgs {
    pub user: String,
    /// Grant even if the cooldown has not elapsed
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ImportLegacyArgs {
    /// JSON file holding an array of legacy records
    pub input: PathBuf,
    /// Check the records without writing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
