//! # Engine Configuration & Constants
//!
//! Every magic number in COFFER lives here. A constant hardcoded anywhere
//! else is a bug waiting for a second copy to drift.

/// Fixed-point scale for the reward-per-share accumulator.
///
/// The accumulator tracks reward-per-share as an integer scaled by 10^18,
/// which keeps sub-unit precision without floating point. All accumulator
/// arithmetic widens to `u128` before multiplying by this.
pub const REWARD_SCALE: u128 = 1_000_000_000_000_000_000;

/// Allowance value treated as unlimited by the in-memory transfer port.
///
/// A delegated transfer against an unlimited allowance does not decrement
/// it, matching the convention of every fungible-token ledger worth
/// integrating with.
pub const UNLIMITED_ALLOWANCE: u64 = u64::MAX;

/// Default `tracing` filter directives for binaries embedding the engine.
pub const DEFAULT_LOG_FILTER: &str = "coffer_node=info,coffer_engine=info";

/// Engine version string, straight from the crate manifest.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
