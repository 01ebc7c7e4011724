//! # CLI Interface
//!
//! Defines the command-line argument structure for `coffer-node` using
//! `clap` derive. Two subcommands: `demo` runs the scripted end-to-end
//! scenario against an in-memory bank, `version` prints build information.

use clap::{Parser, Subcommand};

/// COFFER vault engine CLI.
///
/// Wires the share-accounting engine to its reference ports and drives a
/// complete deposit / yield / reward / reallocation scenario, emitting a
/// JSON report on stdout and structured logs on stderr.
#[derive(Parser, Debug)]
#[command(
    name = "coffer-node",
    about = "COFFER vault engine demo CLI",
    version,
    propagate_version = true
)]
pub struct CofferCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `coffer-node` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scripted end-to-end scenario.
    Demo(DemoArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Reward emission rate in reward units per second.
    #[arg(long, env = "COFFER_REWARD_RATE", default_value_t = 10)]
    pub reward_rate: u64,

    /// Simulated accrual window in seconds between the deposits and the
    /// claim. The demo runs on a manual clock, so this costs no wall time.
    #[arg(long, env = "COFFER_ACCRUAL_SECS", default_value_t = 3_600)]
    pub accrual_secs: u64,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "COFFER_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
