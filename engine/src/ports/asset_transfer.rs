//! # Asset Transfer Port
//!
//! The capability through which all ledger-affecting asset movement flows.
//! The engine consumes the classic fungible-token quartet -- `balance_of`,
//! `transfer`, `transfer_from`, `approve` -- and assumes nothing else about
//! the asset implementation. A failed port call aborts the enclosing
//! operation.
//!
//! [`InMemoryBank`] is the reference implementation: a multi-asset ledger
//! with issuer-gated minting and allowance-based delegated transfers. It
//! backs the test suites and the demo binary; a hosting system would swap
//! in its own adapter over a real token ledger.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::config::UNLIMITED_ALLOWANCE;
use crate::error::EngineError;

// ---------------------------------------------------------------------------
// AssetTransferPort
// ---------------------------------------------------------------------------

/// Fungible-asset movement capability.
///
/// Senders are explicit: this is an in-process trust boundary, not a signed
/// transaction surface, so the caller names the account being debited and
/// the engine is responsible for only ever debiting accounts it controls
/// (or holds an allowance for).
pub trait AssetTransferPort: Send + Sync {
    /// Returns `holder`'s balance of `asset`. Unknown assets and unknown
    /// holders both read as zero.
    fn balance_of(&self, asset: &AssetId, holder: &AccountId) -> u64;

    /// Moves `amount` of `asset` from `from` to `to`.
    fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError>;

    /// Moves `amount` of `asset` from `owner` to `to`, spending `spender`'s
    /// allowance over `owner`'s funds.
    fn transfer_from(
        &self,
        asset: &AssetId,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError>;

    /// Sets `spender`'s allowance over `owner`'s `asset` balance to exactly
    /// `amount`, replacing any previous allowance.
    fn approve(
        &self,
        asset: &AssetId,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// InMemoryBank
// ---------------------------------------------------------------------------

/// Per-asset ledger record held by the bank.
#[derive(Debug, Default)]
struct AssetRecord {
    /// The only account allowed to mint this asset.
    issuer: AccountId,
    /// Current total supply in smallest units.
    total_supply: u64,
    /// Balances keyed by holder.
    balances: HashMap<AccountId, u64>,
    /// Allowances keyed by (owner, spender).
    allowances: HashMap<(AccountId, AccountId), u64>,
}

/// In-memory multi-asset bank.
///
/// Interior mutability via a single `parking_lot::RwLock`: the execution
/// model is one fully-serialized operation at a time, so one lock over the
/// whole ledger is both sufficient and the simplest thing that is correct.
pub struct InMemoryBank {
    inner: RwLock<HashMap<AssetId, AssetRecord>>,
}

impl InMemoryBank {
    /// Creates an empty bank with no registered assets.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new asset and returns its derived id.
    ///
    /// Registration is idempotent for identical properties (the derived id
    /// is content-addressed); re-registering overwrites the issuer.
    pub fn register_asset(
        &self,
        name: &str,
        symbol: &str,
        issuer: &AccountId,
    ) -> Result<AssetId, EngineError> {
        if issuer.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let id = AssetId::derive(name, symbol, issuer.as_str());
        let mut inner = self.inner.write();
        let record = inner.entry(id).or_default();
        record.issuer = issuer.clone();
        Ok(id)
    }

    /// Mints `amount` of `asset` to `to`. Only the registered issuer may
    /// mint.
    pub fn mint(
        &self,
        asset: &AssetId,
        caller: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError> {
        if to.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(asset)
            .ok_or(EngineError::UnknownAsset(*asset))?;
        if record.issuer != *caller {
            return Err(EngineError::Unauthorized {
                caller: caller.clone(),
                role: "issuer",
            });
        }
        record.total_supply = record
            .total_supply
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        let balance = record.balances.entry(to.clone()).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(EngineError::Overflow)?;
        Ok(())
    }

    /// Returns the current total supply of `asset` (zero if unregistered).
    pub fn total_supply(&self, asset: &AssetId) -> u64 {
        self.inner
            .read()
            .get(asset)
            .map(|r| r.total_supply)
            .unwrap_or(0)
    }

    /// Returns `spender`'s current allowance over `owner`'s `asset`.
    pub fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> u64 {
        self.inner
            .read()
            .get(asset)
            .and_then(|r| r.allowances.get(&(owner.clone(), spender.clone())))
            .copied()
            .unwrap_or(0)
    }

    /// Debit/credit core shared by `transfer` and `transfer_from`.
    /// The caller holds the write lock.
    fn move_funds(
        record: &mut AssetRecord,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError> {
        let available = record.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(EngineError::InsufficientFunds {
                asset: *asset,
                holder: from.clone(),
                available,
                requested: amount,
            });
        }
        // Self-transfers must not double-count; debit and credit the same
        // entry in sequence.
        *record.balances.entry(from.clone()).or_insert(0) -= amount;
        let credit = record.balances.entry(to.clone()).or_insert(0);
        *credit = credit.checked_add(amount).ok_or(EngineError::Overflow)?;
        Ok(())
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetTransferPort for InMemoryBank {
    fn balance_of(&self, asset: &AssetId, holder: &AccountId) -> u64 {
        self.inner
            .read()
            .get(asset)
            .and_then(|r| r.balances.get(holder))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError> {
        if from.is_null() || to.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(asset)
            .ok_or(EngineError::UnknownAsset(*asset))?;
        Self::move_funds(record, asset, from, to, amount)
    }

    fn transfer_from(
        &self,
        asset: &AssetId,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError> {
        if spender.is_null() || owner.is_null() || to.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(asset)
            .ok_or(EngineError::UnknownAsset(*asset))?;

        let key = (owner.clone(), spender.clone());
        let allowed = record.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(EngineError::InsufficientAllowance {
                asset: *asset,
                owner: owner.clone(),
                spender: spender.clone(),
                available: allowed,
                requested: amount,
            });
        }

        Self::move_funds(record, asset, owner, to, amount)?;

        // An unlimited allowance is never decremented.
        if allowed != UNLIMITED_ALLOWANCE {
            record.allowances.insert(key, allowed - amount);
        }
        Ok(())
    }

    fn approve(
        &self,
        asset: &AssetId,
        owner: &AccountId,
        spender: &AccountId,
        amount: u64,
    ) -> Result<(), EngineError> {
        if owner.is_null() || spender.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(asset)
            .ok_or(EngineError::UnknownAsset(*asset))?;
        record
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
