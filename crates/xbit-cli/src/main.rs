mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod ui;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::ui::{UiEvent, UiManager};
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// The display task together with the handles needed to feed and stop it.
struct Display {
    events: mpsc::Sender<UiEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Display {
    fn spawn() -> Self {
        let (manager, events, shutdown) = UiManager::new();
        Self {
            events,
            shutdown,
            task: tokio::spawn(manager.run()),
        }
    }

    async fn close(self) -> Result<()> {
        // The manager may already be gone if it panicked; the join below reports that.
        let _ = self.shutdown.send(true);
        drop(self.events);
        self.task
            .await
            .map_err(|e| CliError::Other(anyhow::anyhow!("display task failed: {}", e)))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Let the last log lines reach the terminal before the error.
            tokio::time::sleep(Duration::from_millis(50)).await;
            eprintln!("\n❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let display = Display::spawn();
    let cli = Cli::parse();
    logging::setup_logging(
        cli.verbose,
        cli.quiet,
        cli.log_file.clone(),
        display.events.clone(),
    )?;
    install_panic_reporting()?;

    info!("xBIT v{} starting.", env!("CARGO_PKG_VERSION"));
    debug!(?cli, "Parsed command line.");

    let outcome = dispatch(cli.command, display.events.clone()).await;
    if let Err(e) = &outcome {
        error!("Command failed: {}", e);
    }

    display.close().await?;
    outcome
}

async fn dispatch(command: Commands, events: mpsc::Sender<UiEvent>) -> Result<()> {
    match command {
        Commands::Run(args) => commands::run::run(args, events).await,
        Commands::ScanTypes => commands::run::list_scan_types(),
    }
}

/// Routes panic reports through tracing so they end up in the log file as well.
fn install_panic_reporting() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |info| {
        error!("{}", panic_hook.panic_report(info));
    }));
    Ok(())
}
