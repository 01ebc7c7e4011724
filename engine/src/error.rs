//! # Engine Errors
//!
//! One error enum for the whole engine. Every variant is a precondition
//! failure detected before any state mutation: an operation that returns an
//! error has had **zero** observable effect. The engine never retries --
//! callers retry with corrected inputs or fresh state.

use thiserror::Error;
use uuid::Uuid;

use crate::account::AccountId;
use crate::asset::AssetId;

/// Errors produced by vault, reward, and reallocation operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A zero amount or zero share count was passed where a positive value
    /// is required. Zero-value operations are no-ops and likely indicate a
    /// bug in the caller.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// The null account was passed as a sender or receiver.
    #[error("invalid address: the null account cannot send or receive")]
    InvalidAddress,

    /// The caller does not hold the capability this operation requires.
    #[error("unauthorized: {caller} lacks the '{role}' capability")]
    Unauthorized {
        /// The account that attempted the operation.
        caller: AccountId,
        /// The capability that was required (e.g. "admin", "allocator").
        role: &'static str,
    },

    /// A share debit exceeds the holder's balance.
    #[error("insufficient shares: {holder} has {available}, requested {requested}")]
    InsufficientShares {
        /// The account being debited.
        holder: AccountId,
        /// The holder's current share balance.
        available: u64,
        /// The share count that was requested.
        requested: u64,
    },

    /// The exchange cannot produce the requested output amount.
    #[error("insufficient liquidity: cannot produce {requested} of asset {asset}")]
    InsufficientLiquidity {
        /// The output asset that was requested.
        asset: AssetId,
        /// The output amount the exchange could not cover.
        requested: u64,
    },

    /// No vault is registered for the given asset.
    #[error("no vault registered for asset {0}")]
    VaultNotRegistered(AssetId),

    /// A reallocation resolved both legs to the same vault.
    #[error("source and destination resolve to the same vault ({0})")]
    SameVault(Uuid),

    /// The vault is paused and not accepting new deposits.
    #[error("vault {vault} is paused: deposits are suspended")]
    VaultPaused {
        /// The paused vault.
        vault: Uuid,
    },

    /// An asset debit exceeds the holder's balance at the transfer port.
    #[error("insufficient funds: {holder} holds {available} of {asset}, requested {requested}")]
    InsufficientFunds {
        /// The asset being moved.
        asset: AssetId,
        /// The account being debited.
        holder: AccountId,
        /// The holder's current balance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// A delegated transfer exceeds the spender's approved allowance.
    #[error(
        "insufficient allowance: {spender} may spend {available} of {owner}'s {asset}, requested {requested}"
    )]
    InsufficientAllowance {
        /// The asset being moved.
        asset: AssetId,
        /// The account whose funds are being spent.
        owner: AccountId,
        /// The delegate doing the spending.
        spender: AccountId,
        /// The currently approved allowance.
        available: u64,
        /// The amount that was requested.
        requested: u64,
    },

    /// The asset has not been registered at the transfer port.
    #[error("unknown asset {0}")]
    UnknownAsset(AssetId),

    /// The reward accumulator was asked about a vault it has never seen.
    #[error("vault {0} is not registered with this accumulator")]
    UnknownVault(Uuid),

    /// An amount computation overflowed, or share math divided by a drained
    /// vault's zero asset base.
    #[error("arithmetic overflow in amount computation")]
    Overflow,
}
