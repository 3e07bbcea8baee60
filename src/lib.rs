pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::RateType;
use crate::core::config::AppConfig;
use crate::providers::HnbProvider;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info};

pub enum AppCommand {
    Show,
    Convert {
        value: Decimal,
        currency: String,
        rate: RateType,
    },
    Serve,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("tecaj starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Show => {
            let provider = HnbProvider::from_config(&config.source)
                .context("Failed to create HNB client")?;
            cli::show::run(&provider).await
        }
        AppCommand::Convert {
            value,
            currency,
            rate,
        } => {
            let provider = HnbProvider::from_config(&config.source)
                .context("Failed to create HNB client")?;
            cli::convert::run(&provider, value, &currency, rate).await
        }
        AppCommand::Serve => cli::serve::run(&config).await,
    }
}
