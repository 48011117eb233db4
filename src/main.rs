use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use goldtick::cli::calc::CalcArgs;
use goldtick::core::log::init_logging;

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

impl From<Commands> for goldtick::AppCommand {
    fn from(cmd: Commands) -> goldtick::AppCommand {
        match cmd {
            Commands::Quote { currency, json } => goldtick::AppCommand::Quote { currency, json },
            Commands::Watch { currency } => goldtick::AppCommand::Watch { currency },
            Commands::Calc {
                karat,
                weight,
                unit,
                currency,
            } => goldtick::AppCommand::Calc(CalcArgs {
                karat,
                weight,
                unit,
                currency,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the current gold price for every karat
    Quote {
        /// Display currency, e.g. AED
        #[arg(long)]
        currency: Option<String>,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stream live prices until Ctrl-C
    Watch {
        /// Display currency, e.g. AED
        #[arg(long)]
        currency: Option<String>,
    },
    /// Value a quantity of gold
    Calc {
        /// Purity, e.g. 22 or 22k
        #[arg(short, long)]
        karat: String,
        /// Weight in `unit`
        #[arg(short, long)]
        weight: f64,
        /// g, kg or oz
        #[arg(short, long, default_value = "g")]
        unit: String,
        /// Display currency, e.g. AED
        #[arg(long)]
        currency: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => goldtick::cli::setup::setup_at_path(path),
            None => goldtick::cli::setup::setup(),
        },
        Some(cmd) => goldtick::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
