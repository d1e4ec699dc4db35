use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinconv::core::asset::Asset;
use coinconv::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display crypto prices converted into a currency
    Prices {
        /// Target currency code, e.g. EUR
        #[arg(long)]
        currency: Option<String>,
        /// Number of units to convert, defaults to 1
        #[arg(long)]
        amount: Option<String>,
    },
    /// Display exchange rates for the configured base currency
    Rates {
        /// Only show these currency codes
        #[arg(long = "filter", num_args = 1..)]
        filter: Vec<String>,
    },
    /// Convert an amount of one asset into a currency
    Convert {
        /// Asset id or ticker, e.g. bitcoin or BTC
        asset: Asset,
        /// Number of units to convert, defaults to 1
        #[arg(long)]
        amount: Option<String>,
        /// Target currency code, e.g. EUR
        #[arg(long)]
        to: Option<String>,
    },
}

impl From<Commands> for coinconv::AppCommand {
    fn from(cmd: Commands) -> coinconv::AppCommand {
        match cmd {
            Commands::Prices { currency, amount } => {
                coinconv::AppCommand::Prices { currency, amount }
            }
            Commands::Rates { filter } => coinconv::AppCommand::Rates { filter },
            Commands::Convert { asset, amount, to } => coinconv::AppCommand::Convert {
                asset,
                amount,
                currency: to,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinconv::cli::setup::setup(),
        Some(cmd) => coinconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
