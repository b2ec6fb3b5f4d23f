// SPDX-License-Identifier: MIT

//! gw-serverd
//!
//! The centralized multi-session coding-assistant gateway. Listens on a
//! loopback HTTP port, registers itself in the shared instance registry, and
//! dispatches tool calls on behalf of whichever clients connect through the
//! stdio bridge (`gw-bridge`).

use std::sync::Arc;

use gw_server::config::ServerConfig;
use gw_server::server::CentralServer;
use gw_server::{api, logging, registration::RegistrationHandle};
use gw_tools::builtin::{AlwaysFailsTool, EchoTool};
use gw_tools::ToolCatalog;
use tokio::net::TcpListener;
use tracing::{error, info};

fn print_help() {
    println!("gw-serverd {}", env!("CARGO_PKG_VERSION"));
    println!("Centralized multi-session coding-assistant gateway.");
    println!();
    println!("USAGE:");
    println!("    gw-serverd");
    println!();
    println!("Configuration is read from the environment (GW_BIND_ADDR,");
    println!("GW_CONTEXT_NAME, GW_DEFAULT_MODES, GW_SHUTDOWN_TIMEOUT_SECS,");
    println!("GW_DISABLE_REGISTRY, GW_STATE_DIR). gw-serverd is typically");
    println!("started by an orchestrator and talked to via the stdio bridge,");
    println!("not invoked interactively.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

fn default_catalog() -> Arc<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    catalog.register(Arc::new(EchoTool));
    catalog.register(Arc::new(AlwaysFailsTool));
    Arc::new(catalog)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-v" => {
                println!("gw-serverd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: gw-serverd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = ServerConfig::from_env();
    let log_guard = logging::setup_logging(&config)?;
    info!(context = %config.context_name, "starting gw-serverd");

    let listener = TcpListener::bind(&config.bind_addr).await?;
    let port = listener.local_addr()?.port();

    let server = Arc::new(CentralServer::new(
        config.context_name.clone(),
        config.default_modes.clone(),
        default_catalog(),
        Arc::new(gw_server::project::FilesystemProjectResolver),
        gw_core::clock::SystemClock,
    ));

    if config.registry_enabled {
        if let Some(handle) = RegistrationHandle::start(config.context_name.clone(), config.default_modes.clone(), port) {
            server.attach_registration(handle);
        }
    }

    let app = api::router(Arc::clone(&server));
    info!(port, "listening");

    let shutdown_server = Arc::clone(&server);
    let graceful = async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal");
        shutdown_server.shutdown(config.shutdown_timeout).await;
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(graceful).await {
        error!(error = %e, "server loop exited with an error");
    }

    drop(log_guard);
    Ok(())
}
