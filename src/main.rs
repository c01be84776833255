//! worker-cluster
//!
//! A primary process that spawns a fixed pool of worker processes and
//! spreads HTTP traffic over them in strict rotation.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────── primary ────────────────────────┐
//!                      │                                                          │
//!   Client Request     │  ┌──────────┐   ┌───────────────┐   ┌────────────────┐  │
//!   ───────────────────┼─▶│   net    │──▶│ RequestRouter │──▶│ ProxyForwarder │──┼──▶ worker i
//!                      │  │ listener │   │  pick_next()  │   │   (streaming)  │  │    (base_port+i+1)
//!   Client Response    │  └──────────┘   └───────────────┘   └────────────────┘  │
//!   ◀──────────────────┼───────────────────────────────────────────────┘         │
//!                      │                                                          │
//!                      │  ┌──────────────────────────────────────────────────┐   │
//!                      │  │ Supervisor: spawn N children (PORT via env),      │   │
//!                      │  │ probe readiness, log exits, kill on shutdown      │   │
//!                      │  └──────────────────────────────────────────────────┘   │
//!                      └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers are this same binary started with the `worker` subcommand.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use worker_cluster::app::{users_router, UserStore};
use worker_cluster::config::loader::{load_config, Overrides};
use worker_cluster::http::{ProxyForwarder, RequestRouter};
use worker_cluster::lifecycle::{wait_for_signal, Shutdown};
use worker_cluster::net::BoundedListener;
use worker_cluster::observability::{logging, metrics};
use worker_cluster::supervisor::{Supervisor, SupervisorSettings};
use worker_cluster::worker::WorkerRuntime;

#[derive(Parser)]
#[command(name = "worker-cluster", version)]
#[command(about = "Round-robin load balancer over a pool of worker processes", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balancer port; workers take the following ports
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Number of worker processes (default: parallelism minus one)
    #[arg(short, long, env = "WORKERS")]
    workers: Option<usize>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the load balancer and supervise the workers (default)
    Primary,
    /// Run a single worker; normally started by the primary
    Worker {
        /// Port to listen on
        #[arg(long, env = "PORT")]
        port: u16,

        /// Slot index assigned by the primary
        #[arg(long, env = "WORKER_INDEX")]
        index: Option<usize>,

        /// Interface to bind
        #[arg(long, env = "WORKER_HOST", default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Worker { port, index, host }) => {
            logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));
            run_worker(index, host, port).await
        }
        Some(Commands::Primary) | None => {
            let overrides = Overrides {
                base_port: cli.port,
                workers: cli.workers,
            };
            run_primary(cli.config, overrides, cli.log_level).await
        }
    }
}

async fn run_worker(index: Option<usize>, host: String, port: u16) -> Result<(), Box<dyn Error>> {
    let store = Arc::new(UserStore::new());
    WorkerRuntime::new(index, host, port)
        .run(users_router(store), wait_for_signal())
        .await?;
    Ok(())
}

async fn run_primary(
    config_path: Option<PathBuf>,
    overrides: Overrides,
    log_level: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path.as_deref(), &overrides)?;

    logging::init_logging(log_level.as_deref().unwrap_or(&config.observability.log_level));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_port = config.listener.base_port,
        workers = config.worker_count(),
        restart_policy = ?config.workers.restart.policy,
        "worker-cluster starting"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(error = %e, "Failed to parse metrics address"),
        }
    }

    // Bind before spawning so a taken port fails fast without orphans.
    let listener =
        BoundedListener::bind(&config.listener.bind_address(), config.listener.max_connections).await?;

    let shutdown = Shutdown::new();
    let mut supervisor = Supervisor::new(SupervisorSettings::from_config(&config)?);
    let pool = supervisor.start(config.worker_count(), config.listener.base_port, &shutdown);

    let forwarder = ProxyForwarder::new(config.workers.upstream_host.clone(), &config.timeouts);
    let router = RequestRouter::new(pool, forwarder);

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let served = router.serve(listener, shutdown.signalled()).await;

    // Serving may also end on an I/O error; workers go down either way.
    shutdown.trigger();
    supervisor.wait().await;

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
