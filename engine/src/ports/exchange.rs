//! # Exchange Port
//!
//! The asset-for-asset conversion step inside a reallocation. The
//! coordinator's contract toward it is minimal: given an input amount,
//! produce some output amount of the requested asset, or fail with
//! `InsufficientLiquidity`.
//!
//! [`IdentityExchange`] is the placeholder implementation: it requires the
//! custodian to already hold the requested output and quotes 1:1 without
//! moving funds. A real integration replaces this with an actual venue.

use std::sync::Arc;

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::error::EngineError;
use crate::ports::AssetTransferPort;

// ---------------------------------------------------------------------------
// ExchangePort
// ---------------------------------------------------------------------------

/// Asset conversion capability used by the reallocation coordinator.
pub trait ExchangePort: Send + Sync {
    /// Converts `amount_in` into `output_asset`, returning the produced
    /// output amount. Fails with [`EngineError::InsufficientLiquidity`]
    /// when the requested output cannot be covered.
    fn swap(&self, output_asset: &AssetId, amount_in: u64) -> Result<u64, EngineError>;
}

// ---------------------------------------------------------------------------
// IdentityExchange
// ---------------------------------------------------------------------------

/// Placeholder 1:1 exchange backed by the custodian's own inventory.
///
/// `swap` verifies the custodian already holds `amount_in` of the output
/// asset and returns `amount_in` unchanged. No funds move: the coordinator
/// holds the output inventory and spends it in the deposit leg that
/// follows. Failure therefore leaves no trace anywhere.
pub struct IdentityExchange {
    bank: Arc<dyn AssetTransferPort>,
    custodian: AccountId,
}

impl IdentityExchange {
    /// Creates an identity exchange reading `custodian`'s inventory.
    pub fn new(bank: Arc<dyn AssetTransferPort>, custodian: AccountId) -> Self {
        Self { bank, custodian }
    }
}

impl ExchangePort for IdentityExchange {
    fn swap(&self, output_asset: &AssetId, amount_in: u64) -> Result<u64, EngineError> {
        let inventory = self.bank.balance_of(output_asset, &self.custodian);
        if inventory < amount_in {
            return Err(EngineError::InsufficientLiquidity {
                asset: *output_asset,
                requested: amount_in,
            });
        }
        Ok(amount_in)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
