// Copyright (c) 2026 Coffer Contributors. MIT License.
// See LICENSE for details.

//! # COFFER Engine -- Pooled-Asset Share Accounting
//!
//! The core of COFFER: users deposit a single asset into a vault, receive
//! proportional ownership shares, and later redeem them for a proportional
//! claim on the vault's assets -- including assets parked at an external
//! yield source. A reward accumulator streams a separate reward asset to
//! shareholders over time, and a reallocation coordinator moves a position
//! between two vaults as one atomic unit.
//!
//! ## Architecture
//!
//! The engine is split into modules that mirror its actual concerns:
//!
//! - **account / asset** -- identity newtypes: opaque account ids and
//!   content-addressed asset ids.
//! - **ports** -- the three external capability traits (asset transfer,
//!   yield adapter, exchange) plus reference implementations for tests and
//!   demos.
//! - **vault** -- the share ledger: floor-division proportional math, the
//!   conservation-by-construction share book, deposits and withdrawals.
//! - **rewards** -- the time-weighted reward-per-share accumulator with its
//!   checkpoint-before-mutate contract.
//! - **realloc** -- the asset registry and the atomic cross-vault
//!   reallocation protocol.
//! - **config / error** -- engine constants and the shared error kinds.
//!
//! ## Execution model
//!
//! One fully-serialized operation at a time. Every public entry point runs
//! to completion synchronously; nothing suspends, nothing is partially
//! visible, and any failure aborts the whole operation with zero observable
//! effect. Shared state lives behind `parking_lot` locks purely so vaults
//! can be handed to the coordinator -- there is no concurrent mutation to
//! arbitrate.
//!
//! ## Design Philosophy
//!
//! 1. Rounding always favors the pool. Floor on mint, floor on payout --
//!    cycles lose dust, they never extract it.
//! 2. Checkpoint before mutate. Reward accounting reads a share balance
//!    that is about to change, so it always runs first.
//! 3. If it touches money, it has tests. Plural.

pub mod account;
pub mod asset;
pub mod config;
pub mod error;
pub mod ports;
pub mod realloc;
pub mod rewards;
pub mod vault;

pub use account::AccountId;
pub use asset::AssetId;
pub use error::EngineError;
pub use realloc::{ReallocationCoordinator, ReallocationReceipt, Registry, SharedVault};
pub use rewards::{Clock, ManualClock, RewardAccumulator, SystemClock};
pub use vault::{DepositReceipt, Vault, VaultId, WithdrawReceipt};
