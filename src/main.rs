//! XKeys GW - Rust implementation
//!
//! Gateway driving a video switcher from an X-keys backlit panel with T-bar.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xkeys_gw::cli::{self, ConsoleInput};
use xkeys_gw::link::Link;
use xkeys_gw::mapping::MappingTable;
use xkeys_gw::panel::PanelCommand;
use xkeys_gw::switcher::SwitcherCommand;
use xkeys_gw::{AppConfig, Gateway};

/// XKeys Gateway - Drive a video switcher from an X-keys panel
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for daily rolling log files
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Validate the configuration, print the key mappings and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Guard must live until exit so buffered file logs are flushed
    let _log_guard = init_logging(&args.log_level, args.log_dir.as_deref())?;

    info!("Starting XKeys GW...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load(&args.config).await?;
    info!("Configuration loaded: {} key mappings", config.keys.len());

    if args.check_config {
        let table = MappingTable::new(&config.keys);
        cli::print_mapping_summary(&config, &table);
        return Ok(());
    }

    run_app(config, shutdown_signal()).await?;

    info!("XKeys GW shutdown complete");
    Ok(())
}

async fn run_app(config: AppConfig, shutdown: impl std::future::Future<Output = ()>) -> Result<()> {
    info!("Switcher address: {}", config.switcher_ip);

    // Transport tasks drain these; here the console prints them
    let (panel_link, mut panel_rx) = Link::<PanelCommand>::channel("panel");
    let (switcher_link, mut switcher_rx) = Link::<SwitcherCommand>::channel("switcher");

    let mut gateway = Gateway::new(config, panel_link, switcher_link);
    gateway.initialize();
    info!("Gateway initialized");

    // rustyline blocks; a plain thread is not joined at runtime shutdown
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let (console_done_tx, mut console_done) = oneshot::channel();
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            let _ = console_done_tx.send(cli::run_console(input_tx));
        })
        .context("Failed to start console thread")?;

    info!("Ready to process events!");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(input) = input_rx.recv() => match input {
                ConsoleInput::Panel(event) => gateway.on_panel_event(event),
                ConsoleInput::Switcher(event) => gateway.on_switcher_event(event),
                ConsoleInput::ShowState => cli::print_snapshot(&gateway.snapshot()),
            },

            Some(command) = panel_rx.recv() => cli::print_panel_command(&command),

            Some(command) = switcher_rx.recv() => cli::print_switcher_command(&command),

            result = &mut console_done => {
                match result {
                    Ok(Ok(())) => info!("Console closed"),
                    Ok(Err(e)) => warn!("Console failed: {:#}", e),
                    Err(_) => warn!("Console thread exited unexpectedly"),
                }
                break;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    // Drain what the last handler queued
    while let Ok(command) = panel_rx.try_recv() {
        cli::print_panel_command(&command);
    }
    while let Ok(command) = switcher_rx.try_recv() {
        cli::print_switcher_command(&command);
    }

    Ok(())
}

fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "xkeys-gw.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
