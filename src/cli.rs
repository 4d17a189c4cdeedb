// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - console (default): interactive calibrate/measure menu
// - serve: web front end with the polling control page
// - config --show / --path / --reset: configuration management

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;

/// scrolltape - Measure distances with your mouse scroll wheel
#[derive(Parser)]
#[command(name = "scrolltape")]
#[command(version = VERSION)]
#[command(about = "Measure distances with your mouse scroll wheel", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive console menu (default)
    Console {
        /// Use synthetic scroll ticks instead of terminal capture
        #[arg(long)]
        demo: bool,
    },

    /// Run the web front end
    Serve {
        /// Bind address for the web server (overrides config)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Use synthetic scroll ticks instead of terminal capture
        #[arg(long)]
        demo: bool,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle the config subcommand. Returns true if it was handled (exit after).
pub fn handle_config_command(show: bool, reset: bool, path: bool) -> bool {
    if path {
        handle_config_path();
    } else if show {
        handle_config_show();
    } else if reset {
        handle_config_reset();
    } else {
        // No flag provided, show usage
        println!("Usage: scrolltape config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    true
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        let _ = std::io::stdin().read_line(&mut input);

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return;
        }
    }

    // Write the default config (using Config's single source of truth)
    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}
