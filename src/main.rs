//! SOP Trainer - adaptive flight-training loop
//!
//! # Usage
//!
//! ```bash
//! # Serve the API and live WebSocket stream
//! cargo run --release
//!
//! # Run five training cycles back to back, no pacing
//! cargo run --release -- batch --cycles 5
//!
//! # Evaluate one session piped in from the generator
//! ./simulation --format json | ./sop-trainer replay-stdin
//! ```
//!
//! # Environment Variables
//!
//! - `SOP_TRAINER_CONFIG`: Path to the TOML configuration file
//! - `SOP_TRAINER_SERVER_ADDR`: Override the server bind address
//! - `SOP_TRAINER_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: Set to "json" for JSON log lines

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use axum::Router;
use sop_trainer::api::{create_app, DashboardState};
use sop_trainer::catalog::RuleCatalog;
use sop_trainer::config::{self, defaults, TrainerConfig};
use sop_trainer::pipeline::source::StdinSource;
use sop_trainer::pipeline::{CycleOutcome, SessionError, TrainingCoordinator};
use sop_trainer::storage::SnapshotStore;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sop-trainer")]
#[command(about = "Adaptive SOP flight-training simulator")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base seed for the telemetry generator (cycle N uses seed + N)
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug, Default)]
enum SubCommand {
    /// Serve the JSON API and the live WebSocket stream (default)
    #[default]
    Serve,

    /// Run training cycles back to back and print each report
    Batch {
        /// Number of cycles to run
        #[arg(long, default_value = "1")]
        cycles: u64,
        /// Speed multiplier (1 = one tick per second, 0 or unset = no delay)
        #[arg(long)]
        speed: Option<u64>,
    },

    /// Evaluate one session from JSON aircraft states on stdin
    ReplayStdin,
}

// ============================================================================
// Supervised Tasks
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    BatchLoop,
    StdinReplay,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::BatchLoop => write!(f, "BatchLoop"),
            TaskName::StdinReplay => write!(f, "StdinReplay"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 [Supervisor] All tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("🛑 [Supervisor] Shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("🔒 [Supervisor] Task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("🔒 [Supervisor] Task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("🔒 [Supervisor] Task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("🔒 [Supervisor] All tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the remaining tasks observe the cancellation before returning
    cancel_token.cancel();
    while task_set.join_next().await.is_some() {}
    Ok(())
}

// ============================================================================
// Modes
// ============================================================================

fn print_outcome(outcome: &CycleOutcome) {
    println!("{}", outcome.report.render_text());
}

async fn run_serve(
    coordinator: TrainingCoordinator,
    server_addr: &str,
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let state = DashboardState::new(coordinator, config::get().live.clone(), cancel_token.clone());
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", server_addr))?;
    info!("🌐 Dashboard API listening on http://{}", server_addr);
    info!("   Live stream: ws://{}/ws", server_addr);

    spawn_http_server(task_set, listener, app, cancel_token);
    Ok(())
}

fn spawn_batch(
    task_set: &mut JoinSet<Result<TaskName>>,
    mut coordinator: TrainingCoordinator,
    cycles: u64,
    speed: Option<u64>,
    cancel_token: CancellationToken,
) {
    let delay_ms = match speed {
        Some(s) if s > 0 => defaults::BATCH_BASE_DELAY_MS / s,
        _ => 0,
    };
    info!("⏱️  Batch: {} cycle(s), {}ms delay between ticks", cycles, delay_ms);

    task_set.spawn(async move {
        for _ in 0..cycles {
            match coordinator.run_batch_cycle(delay_ms, &cancel_token).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(SessionError::Cancelled) => {
                    info!("[BatchLoop] Cancelled mid-cycle, session abandoned");
                    break;
                }
                Err(e) => return Err(anyhow::anyhow!("batch cycle failed: {}", e)),
            }
        }
        // Batch mode ends the process when the cycles are done
        cancel_token.cancel();
        Ok(TaskName::BatchLoop)
    });
}

fn spawn_stdin_replay(
    task_set: &mut JoinSet<Result<TaskName>>,
    mut coordinator: TrainingCoordinator,
    cancel_token: CancellationToken,
) {
    info!("📥 Input: stdin (JSON aircraft states)");
    task_set.spawn(async move {
        let session = match coordinator.open_session() {
            Ok(session) => session,
            Err(e) => return Err(anyhow::anyhow!("stdin replay not started: {}", e)),
        };
        let mut source = StdinSource::new();
        match coordinator.run_session_from(session, &mut source, &cancel_token).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(SessionError::Cancelled) => info!("[StdinReplay] Cancelled, session abandoned"),
            Err(e) => return Err(anyhow::anyhow!("stdin replay failed: {}", e)),
        }
        cancel_token.cancel();
        Ok(TaskName::StdinReplay)
    });
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> TrainerConfig {
    match path {
        Some(p) => match TrainerConfig::load_from_file(p) {
            Ok(c) => {
                info!(path = %p.display(), "Loaded trainer config");
                c
            }
            Err(e) => {
                warn!(error = %e, "Failed to load --config file, using defaults");
                TrainerConfig::default()
            }
        },
        None => TrainerConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = CliArgs::parse();

    let mut trainer_config = load_config(args.config.as_ref());
    if args.seed.is_some() {
        trainer_config.simulation.seed = args.seed;
    }
    config::init(trainer_config);
    let cfg = config::get();

    let server_addr = args
        .addr
        .or_else(|| std::env::var("SOP_TRAINER_SERVER_ADDR").ok())
        .unwrap_or_else(|| cfg.server.addr.clone());

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  SOP Trainer - Adaptive Flight Training Loop");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "✈️  Profile: {:.1} min @ {} ticks/s, error probability {:.2}, seed {}",
        cfg.simulation.duration_minutes,
        cfg.simulation.ticks_per_second,
        cfg.simulation.error_probability,
        cfg.simulation
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string())
    );

    let catalog = Arc::new(RuleCatalog::builtin().context("Invalid SOP rule catalog")?);
    info!("📋 Rule catalog: {} rules", catalog.len());

    let mut coordinator = TrainingCoordinator::new(catalog, cfg.simulation.clone());
    if cfg.storage.snapshot_enabled {
        coordinator = coordinator.with_snapshots(SnapshotStore::new(cfg.storage.snapshot_path.clone()));
    }

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    match args.command.unwrap_or_default() {
        SubCommand::Serve => {
            run_serve(coordinator, &server_addr, &mut task_set, cancel_token.clone()).await?;
        }
        SubCommand::Batch { cycles, speed } => {
            spawn_batch(&mut task_set, coordinator, cycles, speed, cancel_token.clone());
        }
        SubCommand::ReplayStdin => {
            spawn_stdin_replay(&mut task_set, coordinator, cancel_token.clone());
        }
    }

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("✓ SOP Trainer shutdown complete");
    Ok(())
}
