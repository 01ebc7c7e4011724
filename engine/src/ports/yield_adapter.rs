//! # Yield Adapter Port
//!
//! A vault may delegate idle assets to an external yield source through this
//! capability. The contract is deliberately small: accept deposits, return
//! up to the requested amount on withdrawal (capping at the adapter's own
//! balance, never failing on an over-request), and self-report a valuation.
//!
//! The valuation is trusted completely -- no slippage check, no reentrancy
//! guard at this boundary. An adapter is a cooperating component in this
//! design; a hosting system that cannot extend that trust must wrap the
//! adapter before handing it to a vault.

use std::sync::Arc;

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::error::EngineError;
use crate::ports::AssetTransferPort;

// ---------------------------------------------------------------------------
// YieldAdapterPort
// ---------------------------------------------------------------------------

/// Idle-balance delegation capability. One adapter serves one vault.
pub trait YieldAdapterPort: Send + Sync {
    /// Accepts `amount` of the vault's asset into the yield source. The
    /// funds move from the vault's account as part of this call.
    fn deposit(&self, amount: u64) -> Result<(), EngineError>;

    /// Returns up to `amount` of the vault's asset back to the vault,
    /// capping at the adapter's own balance. Never fails on an
    /// over-request; the return value is what was actually moved.
    fn withdraw(&self, amount: u64) -> Result<u64, EngineError>;

    /// The adapter's self-reported valuation. May exceed deposited
    /// principal to reflect accrued yield.
    fn total_assets(&self) -> u64;
}

// ---------------------------------------------------------------------------
// SimulatedYieldAdapter
// ---------------------------------------------------------------------------

/// Reference adapter that parks the delegated funds in its own bank
/// account.
///
/// Yield is simulated from the outside: minting to the adapter's account
/// raises its reported valuation, exactly like interest landing at a real
/// yield source. Used by the test suites and the demo binary.
pub struct SimulatedYieldAdapter {
    bank: Arc<dyn AssetTransferPort>,
    asset: AssetId,
    /// The adapter's own holding account.
    account: AccountId,
    /// The vault account funds shuttle to and from.
    vault_account: AccountId,
}

impl SimulatedYieldAdapter {
    /// Creates an adapter shuttling `asset` between `vault_account` and its
    /// own holding `account`.
    pub fn new(
        bank: Arc<dyn AssetTransferPort>,
        asset: AssetId,
        account: AccountId,
        vault_account: AccountId,
    ) -> Self {
        Self {
            bank,
            asset,
            account,
            vault_account,
        }
    }

    /// The adapter's holding account. Tests mint simulated yield here.
    pub fn account(&self) -> &AccountId {
        &self.account
    }
}

impl YieldAdapterPort for SimulatedYieldAdapter {
    fn deposit(&self, amount: u64) -> Result<(), EngineError> {
        self.bank
            .transfer(&self.asset, &self.vault_account, &self.account, amount)
    }

    fn withdraw(&self, amount: u64) -> Result<u64, EngineError> {
        let held = self.bank.balance_of(&self.asset, &self.account);
        let pay = amount.min(held);
        if pay > 0 {
            self.bank
                .transfer(&self.asset, &self.account, &self.vault_account, pay)?;
        }
        Ok(pay)
    }

    fn total_assets(&self) -> u64 {
        self.bank.balance_of(&self.asset, &self.account)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InMemoryBank;

    fn setup() -> (Arc<InMemoryBank>, AssetId, AccountId, SimulatedYieldAdapter) {
        let bank = Arc::new(InMemoryBank::new());
        let issuer = AccountId::new("cof:issuer");
        let asset = bank.register_asset("Coffer USD", "cUSD", &issuer).unwrap();
        let vault_account = AccountId::new("cof:vault-treasury");
        bank.mint(&asset, &issuer, &vault_account, 1_000).unwrap();
        let adapter = SimulatedYieldAdapter::new(
            bank.clone(),
            asset,
            AccountId::new("cof:adapter"),
            vault_account,
        );
        (bank, asset, issuer, adapter)
    }

    #[test]
    fn deposit_moves_funds_to_adapter() {
        let (_, _, _, adapter) = setup();
        adapter.deposit(400).unwrap();
        assert_eq!(adapter.total_assets(), 400);
    }

    #[test]
    fn withdraw_returns_requested_amount() {
        let (bank, asset, _, adapter) = setup();
        adapter.deposit(400).unwrap();
        let returned = adapter.withdraw(150).unwrap();
        assert_eq!(returned, 150);
        assert_eq!(adapter.total_assets(), 250);
        assert_eq!(
            bank.balance_of(&asset, &AccountId::new("cof:vault-treasury")),
            750
        );
    }

    #[test]
    fn over_request_caps_at_balance() {
        let (_, _, _, adapter) = setup();
        adapter.deposit(400).unwrap();
        let returned = adapter.withdraw(10_000).unwrap();
        assert_eq!(returned, 400);
        assert_eq!(adapter.total_assets(), 0);
    }

    #[test]
    fn withdraw_from_empty_adapter_returns_zero() {
        let (_, _, _, adapter) = setup();
        assert_eq!(adapter.withdraw(100).unwrap(), 0);
    }

    #[test]
    fn minted_yield_raises_valuation() {
        let (bank, asset, issuer, adapter) = setup();
        adapter.deposit(400).unwrap();
        // Simulate 5% yield landing at the source.
        bank.mint(&asset, &issuer, adapter.account(), 20).unwrap();
        assert_eq!(adapter.total_assets(), 420);
    }
}
