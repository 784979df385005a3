#![forbid(unsafe_code)]

//! `folder-courier` server binary.
//!
//! Bootstraps configuration and the background scheduling engine, then
//! runs until a shutdown signal arrives.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::{fmt, EnvFilter};

use folder_courier::config::GlobalConfig;
use folder_courier::fsops::LocalFileStore;
use folder_courier::poller::{CycleContext, FolderPollExecutor};
use folder_courier::registry::{FolderRegistry, TomlFolderRegistry};
use folder_courier::scheduler::{spawn_worker_loop, SchedulerHandle, TaskQueue};
use folder_courier::webhook::HttpWebhookClient;
use folder_courier::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "folder-courier", about = "Folder polling webhook forwarder", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("folder-courier bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let config = GlobalConfig::load_from_path(&args.config)?;
    let span = info_span!("instance", name = %config.instance_name);

    run_engine(args.config, config).instrument(span).await
}

async fn run_engine(config_path: PathBuf, config: GlobalConfig) -> Result<()> {
    info!(
        folders = config.folders.len(),
        polling = config.folders_to_poll().len(),
        interval_secs = config.polling_interval_seconds,
        "configuration loaded"
    );

    // ── Build the scheduling engine ─────────────────────
    let queue = Arc::new(TaskQueue::new());
    let registry: Arc<dyn FolderRegistry> =
        Arc::new(TomlFolderRegistry::new(config_path.clone()));

    // One connection pool for the process; each cycle gets a fresh context
    // bundle over it, with its own registry so configuration is re-read.
    let webhook = HttpWebhookClient::new();
    let factory_path = config_path;
    let executor = Arc::new(FolderPollExecutor::new(
        Arc::clone(&queue),
        config.max_parallel_folders,
        config.polling_interval(),
        Box::new(move || CycleContext {
            registry: Arc::new(TomlFolderRegistry::new(factory_path.clone())),
            files: Arc::new(LocalFileStore::new()),
            webhook: Arc::new(webhook.clone()),
        }),
    ));

    let ct = CancellationToken::new();
    let worker_handle = spawn_worker_loop(
        Arc::clone(&queue),
        executor,
        registry,
        config.startup_delay(),
        config.polling_interval(),
        ct.clone(),
    );
    info!("worker loop started");

    let handle = SchedulerHandle::new(queue);
    info!(
        pending = handle.snapshot().len(),
        "initial schedule seeded"
    );

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    let _ = worker_handle.await;

    // Pending entries are in-memory only; report what is being dropped.
    info!(
        pending = handle.snapshot().len(),
        "folder-courier shut down, pending schedule entries discarded"
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
