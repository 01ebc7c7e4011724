// Copyright (c) 2026 Coffer Contributors. MIT License.
// See LICENSE for details.

//! # COFFER Node
//!
//! Entry point for the `coffer-node` binary. Parses CLI arguments,
//! initializes logging, and drives the engine through the scripted demo
//! scenario.
//!
//! The binary supports two subcommands:
//!
//! - `demo`    -- wire the engine to its reference ports and run the full
//!   deposit / yield / reward / reallocation walk-through
//! - `version` -- print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::Result;
use clap::Parser;

use cli::{CofferCli, Commands};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = CofferCli::parse();

    match cli.command {
        Commands::Demo(args) => {
            logging::init_logging(
                coffer_engine::config::DEFAULT_LOG_FILTER,
                LogFormat::from_str_lossy(&args.log_format),
            );
            scenario::run(&args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Prints version information for the binary and the engine crate.
fn print_version() {
    println!(
        "coffer-node {} (engine {})",
        env!("CARGO_PKG_VERSION"),
        coffer_engine::config::ENGINE_VERSION
    );
}
