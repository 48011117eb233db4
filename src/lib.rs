pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::calc::CalcArgs;
use crate::core::PollingScheduler;
use crate::core::config::AppConfig;
use crate::core::scheduler::SchedulerSettings;
use crate::providers::exchange_rate::ExchangeRateProvider;
use crate::providers::goldapi::GoldApiProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Quote {
        currency: Option<String>,
        json: bool,
    },
    Watch {
        currency: Option<String>,
    },
    Calc(CalcArgs),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Gold ticker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currency = %config.currency,
        price_api = %config.providers.goldapi.base_url,
        fx_api = %config.providers.fx.base_url,
        polling = ?config.polling,
        "Loaded config"
    );

    run_with_config(command, &config).await
}

/// Runs a command against an already loaded configuration.
pub async fn run_with_config(command: AppCommand, config: &AppConfig) -> Result<()> {
    match command {
        AppCommand::Quote { currency, json } => {
            cli::quote::run(config, currency.as_deref(), json).await
        }
        AppCommand::Watch { currency } => cli::watch::run(config, currency.as_deref()).await,
        AppCommand::Calc(args) => cli::calc::run(config, args).await,
    }
}

/// Wires the configured providers into a scheduler.
pub fn build_scheduler(config: &AppConfig) -> Result<PollingScheduler> {
    let timeout = config.polling.request_timeout();
    let price_provider = GoldApiProvider::from_config(&config.providers.goldapi, timeout)?;
    let fx_provider = ExchangeRateProvider::from_config(&config.providers.fx, timeout)?;

    Ok(PollingScheduler::new(
        Arc::new(price_provider),
        Arc::new(fx_provider),
        SchedulerSettings::from(&config.polling),
    ))
}
