//! puscaled — the processing-unit autoscaler daemon.
//!
//! Serves scaling requests over HTTP against an in-memory fleet seeded
//! from the config file, or evaluates a single decision offline.
//!
//! # Usage
//!
//! ```text
//! puscaled serve --port 8080 --config puscaled.toml
//! puscaled evaluate --current 500 --utilization 80 --step 100 --min 100 --max 1000
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use puscale_autoscale::{Autoscaler, DecisionInput, InMemoryCooldownStore, InMemoryFleet, decide};
use puscale_core::config::cooldown_from_env;
use puscale_core::{
    DEFAULT_COOLDOWN, DEFAULT_SCALE_DOWN_THRESHOLD, DEFAULT_SCALE_UP_THRESHOLD, DaemonConfig,
    ScalingPolicy,
};

#[derive(Parser)]
#[command(name = "puscaled", about = "Processing-unit autoscaler daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve scaling requests over HTTP.
    Serve {
        /// Port to listen on (overrides [server].port).
        #[arg(long)]
        port: Option<u16>,

        /// Path to puscaled.toml.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the decision engine once and print the outcome.
    Evaluate {
        /// Current processing units.
        #[arg(long)]
        current: u32,

        /// Utilization percentage (0-100).
        #[arg(long)]
        utilization: f64,

        /// Units added or removed per action.
        #[arg(long)]
        step: u32,

        #[arg(long)]
        min: u32,

        #[arg(long)]
        max: u32,

        #[arg(long, default_value_t = DEFAULT_SCALE_UP_THRESHOLD)]
        scale_up_threshold: f64,

        #[arg(long, default_value_t = DEFAULT_SCALE_DOWN_THRESHOLD)]
        scale_down_threshold: f64,

        /// Minutes since the last scale-down; omit if there was none.
        #[arg(long)]
        since_last_scale_down_minutes: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,puscaled=debug,puscale=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, config } => run_serve(port, config).await,
        Command::Evaluate {
            current,
            utilization,
            step,
            min,
            max,
            scale_up_threshold,
            scale_down_threshold,
            since_last_scale_down_minutes,
        } => {
            let policy = ScalingPolicy::new(
                step,
                min,
                max,
                scale_up_threshold,
                scale_down_threshold,
                cooldown_from_env(DEFAULT_COOLDOWN),
            )?;
            let decision = decide(&DecisionInput {
                current_units: current,
                utilization,
                policy: &policy,
                now: Instant::now(),
                since_last_scale_down: since_last_scale_down_minutes.map(minutes),
            });
            println!("{}", decision.summary());
            Ok(())
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

async fn run_serve(port: Option<u16>, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => DaemonConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };

    let port = port.unwrap_or(config.server.port);
    let call_timeout = config.request_timeout()?;
    let window = config.utilization_window()?;
    let cooldown = config.cooldown();

    // ── Initialize subsystems ──────────────────────────────────

    let fleet = Arc::new(InMemoryFleet::from_seeds(&config.resources));
    info!(resources = config.resources.len(), "in-memory fleet seeded");

    let cooldowns = Arc::new(InMemoryCooldownStore::new());

    let autoscaler = Autoscaler::with_backend(fleet, cooldowns)
        .with_call_timeout(call_timeout)
        .with_utilization_window(window);
    info!(
        cooldown_secs = cooldown.as_secs(),
        call_timeout_secs = call_timeout.as_secs(),
        window_secs = window.as_secs(),
        "autoscaler initialized"
    );

    // ── Start API server ───────────────────────────────────────

    let router = puscale_api::build_router(puscale_api::ApiState {
        autoscaler,
        cooldown,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("puscaled stopped");
    Ok(())
}
