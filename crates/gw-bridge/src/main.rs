// SPDX-License-Identifier: MIT

//! gw-bridge
//!
//! stdio↔HTTP transport adapter. Translates line-delimited JSON-RPC on
//! stdin/stdout into HTTP calls against a `gw-serverd` instance, keeping the
//! session alive with a 30s heartbeat. Logs go to a file: stdout is reserved
//! for the wire protocol.

use std::sync::Arc;

use gw_bridge::McpBridge;
use tokio::io::{stdin, stdout, BufReader};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn setup_logging() -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = gw_registry::paths::state_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("gw-bridge.log");
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("gw-bridge.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
    Ok(guard)
}

fn print_help() {
    println!("gw-bridge {}", env!("CARGO_PKG_VERSION"));
    println!("stdio<->HTTP bridge for the gw-gateway coding-assistant server.");
    println!();
    println!("USAGE:");
    println!("    gw-bridge");
    println!();
    println!("Configuration is read from the environment:");
    println!("    GW_SERVER_URL    gateway base URL (default http://127.0.0.1:9121)");
    println!("    GW_SESSION_ID    existing session id to reconnect to");
    println!("    GW_CLIENT_NAME   human-readable client name");
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
                println!("gw-bridge {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: gw-bridge [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let log_guard = setup_logging()?;

    let server_url = std::env::var("GW_SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:9121".to_string());
    let client_name = std::env::var("GW_CLIENT_NAME").unwrap_or_else(|_| format!("gw-bridge-{}", std::process::id()));
    let existing_session_id = std::env::var("GW_SESSION_ID").ok();

    info!(server_url, "starting gw-bridge");
    let bridge = Arc::new(McpBridge::new(server_url, client_name));
    bridge.connect(existing_session_id).await;

    let heartbeat = tokio::spawn({
        let bridge = Arc::clone(&bridge);
        async move { bridge.heartbeat_loop().await }
    });

    bridge.run(BufReader::new(stdin()), stdout()).await;

    heartbeat.abort();
    drop(log_guard);
    Ok(())
}
