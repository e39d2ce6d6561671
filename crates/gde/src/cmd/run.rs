//! Run command - collect until stopped
//!
//! Every run cycle re-reads the configuration, rebuilds the plugins and
//! connects the outputs. SIGHUP ends the current cycle and starts the next
//! one; SIGINT and SIGTERM end the last one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use gde_agent::{Agent, ControlHandle, Filters, Lifecycle, Plan, RunMode};
use gde_config::{Config, default_config_path};
use gde_core::Registry;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::logging::Logging;

/// Options of the default command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Configuration file to load
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing additional *.conf files
    #[arg(long, global = true)]
    pub config_directory: Option<PathBuf>,

    /// Gather once, log what was collected, and exit
    #[arg(long)]
    pub test: bool,

    /// Turn on debug logging
    #[arg(long)]
    pub debug: bool,

    /// Log errors only
    #[arg(long)]
    pub quiet: bool,

    /// File to write the process id to
    #[arg(long)]
    pub pidfile: Option<PathBuf>,

    /// Inputs to enable, separated by ':'
    #[arg(long, global = true)]
    pub input_filter: Option<String>,

    /// Outputs to enable, separated by ':'
    #[arg(long, global = true)]
    pub output_filter: Option<String>,
}

impl RunArgs {
    /// Plugin filters from `--input-filter` / `--output-filter`
    pub fn filters(&self) -> Filters {
        Filters::parse(self.input_filter.as_deref(), self.output_filter.as_deref())
    }

    /// Config file to load: `--config`, else the first default location
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path()
                .context("no config file found; pass --config or create one with 'gde config > gde.conf'"),
        }
    }
}

/// Everything a run cycle needs to start
struct Session {
    args: RunArgs,
    config_path: PathBuf,
    registry: Registry,
    filters: Filters,
    logging: Arc<Logging>,
}

impl Session {
    fn load(&self) -> gde_agent::Result<Config> {
        let mut config = Config::from_file(&self.config_path)?;
        if let Some(dir) = &self.args.config_directory {
            config.load_directory(dir)?;
        }
        Ok(config)
    }

    fn apply_logging(&self, config: &Config) {
        let settings = config.agent.log_settings(self.args.debug, self.args.quiet);
        if let Err(e) = self.logging.apply(&settings) {
            error!(error = %e, "failed to apply logging settings");
        }
    }

    /// Build and connect the agent for one run cycle
    async fn start(&self) -> gde_agent::Result<Agent> {
        let config = self.load()?;
        self.apply_logging(&config);

        let plan = Plan::build(&config, &self.registry, &self.filters, RunMode::Run)?;
        info!(
            version = env!("CARGO_PKG_VERSION"),
            config = %self.config_path.display(),
            "starting gde"
        );
        info!(outputs = %plan.output_names().join(" "), "loaded outputs");
        info!(inputs = %plan.input_names().join(" "), "loaded inputs");

        let mut agent = Agent::new(plan);
        agent.connect().await?;

        if let Some(path) = &self.args.pidfile
            && let Err(e) = write_pidfile(path)
        {
            error!(pidfile = %path.display(), error = %e, "unable to write pidfile");
        }
        Ok(agent)
    }

    /// Collect once from every input
    async fn test(&self) -> Result<()> {
        let config = self.load()?;
        self.apply_logging(&config);

        let plan = Plan::build(&config, &self.registry, &self.filters, RunMode::Test)?;
        Agent::new(plan).test().await?;
        Ok(())
    }
}

/// Run the agent until shutdown, or once in test mode
pub async fn run(args: RunArgs, registry: Registry, logging: Arc<Logging>) -> Result<()> {
    let session = Arc::new(Session {
        config_path: args.config_path()?,
        filters: args.filters(),
        args,
        registry,
        logging,
    });

    if session.args.test {
        return session.test().await;
    }

    let control = ControlHandle::new();
    let signals = watch_signals(control.clone())?;
    let lifecycle = Lifecycle::new(control);

    let result = lifecycle
        .run(|| {
            let session = Arc::clone(&session);
            async move { session.start().await }
        })
        .await;

    signals.abort();
    if let Some(path) = &session.args.pidfile {
        remove_pidfile(path);
    }

    result.context("agent failed")?;
    info!("gde stopped");
    Ok(())
}

/// Translate process signals into control requests
#[cfg(unix)]
fn watch_signals(control: ControlHandle) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interrupt.recv() => control.request_shutdown(),
                _ = terminate.recv() => control.request_shutdown(),
                _ = hangup.recv() => {
                    if control.request_reload() {
                        info!("SIGHUP: reloading config");
                    }
                }
            }
        }
    }))
}

#[cfg(not(unix))]
fn watch_signals(control: ControlHandle) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            control.request_shutdown();
        }
    }))
}

/// Write our pid, newline-terminated
pub fn write_pidfile(path: &Path) -> std::io::Result<()> {
    std::fs::write(path, format!("{}\n", std::process::id()))?;
    debug!(pidfile = %path.display(), "pidfile written");
    Ok(())
}

fn remove_pidfile(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(pidfile = %path.display(), "pidfile removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => error!(pidfile = %path.display(), error = %e, "unable to remove pidfile"),
    }
}
