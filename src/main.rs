// scrolltape - Distance measurer using the mouse scroll wheel
//
// Calibrate by rolling the wheel over a 30 cm reference, then measure any
// distance by rolling it over the thing you care about.
//
// Architecture:
// - Core (core/): tick counter, calibration, measurement, session state machine
// - Scroll sources (source/): terminal mouse capture, simulated demo ticks
// - Console (console.rs): blocking interactive menu
// - Web server (axum): polling control page + JSON session API
//
// Both front ends are built only on SessionController's public operations;
// the controller behaves identically whether driven by the blocking menu or
// polled concurrently by HTTP handlers.

mod cli;
mod config;
mod console;
mod core;
mod server;
mod source;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::core::SessionController;
use cli::{Cli, Commands};
use config::Config;
use console::Console;
use source::{ScrollSource, SimulatedScrollSource, TerminalScrollSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management commands exit early
    if let Some(Commands::Config { show, reset, path }) = &cli.command {
        cli::handle_config_command(*show, *reset, *path);
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();

    // CLI flags override env and file
    let console_mode = match &cli.command {
        Some(Commands::Serve { bind, demo }) => {
            if let Some(bind) = bind {
                config.bind_addr = *bind;
            }
            config.demo_mode |= *demo;
            false
        }
        Some(Commands::Console { demo }) => {
            config.demo_mode |= *demo;
            true
        }
        // No subcommand: the console menu is the default experience
        None => true,
        Some(Commands::Config { .. }) => unreachable!("handled above"),
    };

    // Initialize tracing/logging
    // Console mode defaults to warn: the menu owns the terminal and info
    // chatter would garble the prompts. RUST_LOG overrides either way.
    let default_filter = if console_mode {
        "scrolltape=warn".to_string()
    } else {
        format!(
            "scrolltape={},tower_http=debug,axum=debug",
            config.logging.level
        )
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Wire up the scroll source. The console keeps a concrete handle to the
    // terminal backend for the stop keypress (raw mode routes keyboard input
    // through the capture thread while a session is live).
    let terminal_source: Option<Arc<TerminalScrollSource>>;
    let source: Arc<dyn ScrollSource> = if config.demo_mode {
        tracing::info!("Demo mode active (synthetic scroll ticks)");
        terminal_source = None;
        Arc::new(SimulatedScrollSource::new())
    } else {
        let terminal = Arc::new(TerminalScrollSource::new());
        terminal_source = Some(terminal.clone());
        terminal
    };

    // One controller instance owns session state for the whole process
    let controller = Arc::new(SessionController::new(source));

    if console_mode {
        // Menu loop blocks on stdin, keep it off the async runtime
        let console = Console::new(
            controller,
            terminal_source,
            Duration::from_secs(config.capture_window_secs),
        );
        tokio::task::spawn_blocking(move || console.run()).await??;
        return Ok(());
    }

    // Serve mode: run the web server until ctrl-c
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let server_config = config.clone();
    let server_handle = tokio::spawn(async move {
        server::start_server(server_config, controller, shutdown_rx).await
    });

    println!();
    println!("  scrolltape v{}", config::VERSION);
    println!("  Control page: http://{}", config.bind_addr);
    if config.demo_mode {
        println!("  Demo mode active (synthetic scroll ticks)");
    }
    println!();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    // If the send fails, the server has already shut down (which is fine)
    let _ = shutdown_tx.send(());
    server_handle.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
