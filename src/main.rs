// src/main.rs

//! The main entry point for the Inflight server application.

use anyhow::Result;
use inflight::config::Config;
use inflight::core::memory::CountingAllocator;
use inflight::server;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("Inflight version {VERSION}");
        return Ok(());
    }

    // An explicit --config path must exist; otherwise config.toml is used if
    // present, and the built-in defaults if not.
    let config_path = match args.iter().position(|arg| arg == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Some(path.as_str()),
            None => {
                eprintln!("--config flag requires a value");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let mut config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Override port if provided as a command-line argument
    if let Some(port_index) = args.iter().position(|arg| arg == "--port") {
        if let Some(port_str) = args.get(port_index + 1) {
            let Ok(port) = port_str.parse::<u16>() else {
                eprintln!("Invalid port number: {port_str}");
                std::process::exit(1);
            };
            if let Err(e) = config.override_port(port) {
                eprintln!("Invalid --port {port}: {e:#}");
                std::process::exit(1);
            }
        } else {
            eprintln!("--port flag requires a value");
            std::process::exit(1);
        }
    }

    // Get the log level from the env var, falling back to the config.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());

    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true), // Enable ANSI color codes for log levels.
        )
        .init();

    info!("Inflight version {} starting.", VERSION);

    if let Err(e) = server::run(config).await {
        error!("Server runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
