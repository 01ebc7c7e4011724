//! # Share Book
//!
//! The per-vault ownership table: user share balances plus the running
//! total. [`ShareBook`] is the only mutation path for either figure, and
//! every path updates both together, so `total == sum(balances)` holds at
//! every observation point -- there is no way to observe a half-applied
//! mint or burn.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::account::AccountId;
use crate::error::EngineError;

/// Proportional-ownership table for a single vault.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShareBook {
    /// Share balances keyed by holder.
    balances: HashMap<AccountId, u64>,
    /// Sum of all balances.
    total: u64,
}

impl ShareBook {
    /// Creates an empty share book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `holder`'s share balance (zero for unknown holders).
    pub fn of(&self, holder: &AccountId) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Returns the total share supply.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns the number of distinct holders with an entry.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Credits `shares` to `holder` and the total.
    ///
    /// Returns the holder's new balance.
    pub fn mint(&mut self, holder: &AccountId, shares: u64) -> Result<u64, EngineError> {
        let new_total = self.total.checked_add(shares).ok_or(EngineError::Overflow)?;
        let balance = self.balances.entry(holder.clone()).or_insert(0);
        let new_balance = balance.checked_add(shares).ok_or(EngineError::Overflow)?;
        *balance = new_balance;
        self.total = new_total;
        Ok(new_balance)
    }

    /// Debits `shares` from `holder` and the total.
    ///
    /// Returns the holder's new balance. Fully-redeemed holders keep a zero
    /// entry; reward checkpoints may still reference them.
    pub fn burn(&mut self, holder: &AccountId, shares: u64) -> Result<u64, EngineError> {
        let available = self.of(holder);
        if available < shares {
            return Err(EngineError::InsufficientShares {
                holder: holder.clone(),
                available,
                requested: shares,
            });
        }
        let new_balance = available - shares;
        self.balances.insert(holder.clone(), new_balance);
        self.total -= shares;
        Ok(new_balance)
    }

    /// Iterates over `(holder, balance)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, u64)> {
        self.balances.iter().map(|(k, v)| (k, *v))
    }
}
