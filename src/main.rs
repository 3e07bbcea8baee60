use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rust_decimal::Decimal;
use tecaj::core::RateType;
use tecaj::core::log::init_logging;
use tracing::level_filters::LevelFilter;

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

impl From<Commands> for tecaj::AppCommand {
    fn from(cmd: Commands) -> tecaj::AppCommand {
        match cmd {
            Commands::Show => tecaj::AppCommand::Show,
            Commands::Convert {
                value,
                currency,
                rate,
            } => tecaj::AppCommand::Convert {
                value,
                currency,
                rate,
            },
            Commands::Serve => tecaj::AppCommand::Serve,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current exchange rates
    Show,
    /// Convert an amount of foreign currency to kuna
    Convert {
        /// Amount in the foreign currency
        value: Decimal,
        /// Three letter currency label, e.g. EUR
        currency: String,
        /// Rate to convert with: buy, middle or sell
        #[arg(short, long, default_value = "middle")]
        rate: RateType,
    },
    /// Serve exchange rates as a JSON API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, default_level);

    let result = match cli.command {
        Some(Commands::Setup) => tecaj::cli::setup::setup(),
        Some(cmd) => tecaj::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
