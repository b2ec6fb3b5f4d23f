// SPDX-License-Identifier: MIT

//! gw-dashboard
//!
//! The fleet dashboard: a single process that opens the shared instance
//! registry, claims a loopback port (or discovers that another dashboard
//! already holds one), and serves the read-only fleet view plus proxy/
//! force-kill routes while periodically health-checking and pruning
//! zombie instances.

use std::sync::Arc;

use gw_core::clock::SystemClock;
use gw_dashboard::health::{health_check_loop, prune_loop};
use gw_dashboard::port::{choose_port, PortDecision};
use gw_dashboard::proxy::DashboardState;
use gw_dashboard::router;
use gw_registry::registry::DEFAULT_ZOMBIE_TIMEOUT;
use gw_registry::InstanceRegistry;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_PORT: u16 = 9122;

fn setup_logging() -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = gw_registry::paths::state_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("gw-dashboard.log");
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("gw-dashboard.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    Ok(guard)
}

fn print_help() {
    println!("gw-dashboard {}", env!("CARGO_PKG_VERSION"));
    println!("Fleet dashboard for the gw-gateway coding-assistant instances.");
    println!();
    println!("USAGE:");
    println!("    gw-dashboard");
    println!();
    println!("Configuration is read from the environment:");
    println!("    GW_DASHBOARD_PORT   preferred loopback port (default 9122)");
    println!("    GW_STATE_DIR        registry state directory override");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("gw-dashboard {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: gw-dashboard [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let log_guard = setup_logging()?;

    let preferred_port: u16 = std::env::var("GW_DASHBOARD_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let registry = Arc::new(InstanceRegistry::<SystemClock>::open()?);
    let state = DashboardState::new(Arc::clone(&registry));

    let port = match choose_port(&registry, &state.http, preferred_port).await? {
        PortDecision::AlreadyRunning(port) => {
            info!(port, "a global dashboard is already running, exiting");
            drop(log_guard);
            return Ok(());
        }
        PortDecision::Start(port) => port,
    };

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let bound_port = listener.local_addr()?.port();
    registry.set_global_dashboard(std::process::id(), bound_port)?;
    info!(port = bound_port, "fleet dashboard listening");

    let shutdown = Arc::new(Notify::new());
    let health_task = tokio::spawn(health_check_loop(state.clone(), Arc::clone(&shutdown)));
    let prune_task = tokio::spawn(prune_loop(state.clone(), DEFAULT_ZOMBIE_TIMEOUT, Arc::clone(&shutdown)));

    let app = router(state);
    let graceful = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        shutdown.notify_waiters();
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(graceful).await {
        warn!(error = %e, "dashboard server loop exited with an error");
    }

    let _ = health_task.await;
    let _ = prune_task.await;
    let _ = registry.clear_global_dashboard(std::process::id());

    drop(log_guard);
    Ok(())
}
