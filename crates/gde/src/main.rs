//! gde - plugin-driven agent exporting Grafana dashboards and datasources
//!
//! # Usage
//!
//! ```bash
//! # generate a config file
//! gde config > gde.conf
//!
//! # collect once and log what was collected
//! gde --config gde.conf --test
//!
//! # run with every plugin defined in the config file
//! gde --config gde.conf
//! ```

mod cmd;
mod logging;
mod panic_hook;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gde_config::{Config, LogLevel, LogSettings, default_config_path};

use crate::cmd::run::RunArgs;
use crate::logging::Logging;

/// gde - plugin-driven agent exporting Grafana dashboards and datasources
#[derive(Parser, Debug)]
#[command(name = "gde")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a full sample configuration
    Config,

    /// Print the version
    Version,

    /// Print the sample settings of one plugin
    Usage {
        /// Plugin name, ie 'grafana'
        plugin: String,
    },

    /// List available input plugins
    Inputs,

    /// List available output plugins
    Outputs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let registry = cmd::registry();

    match cli.command {
        Some(Command::Config) => {
            print!("{}", cmd::plugins::sample_config(&registry, &cli.run.filters())?);
        }
        Some(Command::Version) => {
            println!("gde v{}", env!("CARGO_PKG_VERSION"));
        }
        Some(Command::Usage { plugin }) => {
            print!("{}", cmd::plugins::usage(&registry, &plugin)?);
        }
        Some(Command::Inputs) => {
            print!("{}", cmd::plugins::list_inputs(&registry)?);
        }
        Some(Command::Outputs) => {
            print!("{}", cmd::plugins::list_outputs(&registry)?);
        }
        // No subcommand = run the agent
        None => {
            let logging = Arc::new(Logging::init(&initial_log_settings(&cli.run))?);
            panic_hook::install();
            cmd::run::run(cli.run, registry, logging).await?;
        }
    }

    Ok(())
}

/// Logging before the first run cycle: CLI switches, plus format and
/// destination from the config file when it parses
///
/// Load errors are ignored here; the run cycle reports them.
fn initial_log_settings(args: &RunArgs) -> LogSettings {
    let config = args
        .config
        .clone()
        .or_else(|| default_config_path().ok())
        .and_then(|path| Config::from_file(path).ok());

    match config {
        Some(config) => config.agent.log_settings(args.debug, args.quiet),
        None => LogSettings {
            level: LogLevel::from_switches(args.debug, args.quiet),
            ..LogSettings::default()
        },
    }
}
