//! # Reallocation -- Atomic Cross-Vault Position Moves
//!
//! Moves a user's position from one vault to another in a single
//! indivisible operation: forced withdrawal from the source ledger, an
//! exchange step converting the withdrawn asset, and a deposit into the
//! destination ledger crediting the original user.
//!
//! ## Atomicity
//!
//! There is no compensating transaction. The operation runs as two strict
//! phases:
//!
//! 1. **Pre-flight** -- every fallible condition is checked against live
//!    state under read locks: registry resolution, same-vault, the user's
//!    share balance, the destination's pause flag, reward wiring on both
//!    legs, allocator authority, and the exchange quote itself. Any
//!    failure aborts with zero observable effect.
//! 2. **Execution** -- forced withdrawal, then deposit. Under the
//!    serialized execution model nothing can invalidate the pre-flight
//!    between phases, so the mutation suffix does not fail.
//!
//! The exchange is consulted on the previewed withdrawal amount during
//! pre-flight; the placeholder implementation verifies custodian inventory
//! without moving funds, so a liquidity failure leaves both ledgers and
//! the bank untouched.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::account::AccountId;
use crate::asset::{asset_id_map, AssetId};
use crate::config::UNLIMITED_ALLOWANCE;
use crate::error::EngineError;
use crate::ports::{AssetTransferPort, ExchangePort};
use crate::vault::{Vault, VaultId};

/// A vault shared between its users and the coordinator.
pub type SharedVault = Arc<RwLock<Vault>>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps each asset to the one vault that pools it.
///
/// Admin-populated, append/overwrite only: registering an asset twice
/// routes it to the newer vault (last write wins).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    #[serde(with = "asset_id_map")]
    routes: HashMap<AssetId, VaultId>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `asset` to `vault`, replacing any previous route.
    pub fn insert(&mut self, asset: AssetId, vault: VaultId) {
        self.routes.insert(asset, vault);
    }

    /// Resolves the vault pooling `asset`.
    pub fn resolve(&self, asset: &AssetId) -> Option<VaultId> {
        self.routes.get(asset).copied()
    }

    /// Number of routed assets.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` when nothing is routed.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Receipt returned by [`ReallocationCoordinator::reallocate`] with both
/// legs' amounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReallocationReceipt {
    /// The user whose position moved.
    pub caller: AccountId,
    /// Asset of the source leg.
    pub from_asset: AssetId,
    /// Asset of the destination leg.
    pub to_asset: AssetId,
    /// Source vault.
    pub from_vault: VaultId,
    /// Destination vault.
    pub to_vault: VaultId,
    /// Shares debited from the user in the source vault.
    pub shares_withdrawn: u64,
    /// The source-leg amount, snapshotted from the exchange rate before
    /// the withdrawal executed.
    pub expected_from_amount: u64,
    /// The source-leg amount actually withdrawn.
    pub from_amount: u64,
    /// The destination-leg amount produced by the exchange.
    pub to_amount: u64,
    /// Shares minted to the user in the destination vault.
    pub shares_minted: u64,
    /// When the reallocation settled (UTC).
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ReallocationCoordinator
// ---------------------------------------------------------------------------

/// Orchestrates withdraw → exchange → deposit across two vaults.
///
/// The coordinator acts through its custodian account: source vaults must
/// name it as their allocator, and it briefly custodies the withdrawn
/// asset between the two legs.
pub struct ReallocationCoordinator {
    admin: AccountId,
    /// The coordinator's own account: allocator identity and interim
    /// custodian of in-flight funds.
    custodian: AccountId,
    bank: Arc<dyn AssetTransferPort>,
    exchange: Arc<dyn ExchangePort>,
    registry: Registry,
    vaults: HashMap<VaultId, SharedVault>,
}

impl ReallocationCoordinator {
    /// Creates a coordinator acting through `custodian`.
    pub fn new(
        admin: AccountId,
        custodian: AccountId,
        bank: Arc<dyn AssetTransferPort>,
        exchange: Arc<dyn ExchangePort>,
    ) -> Result<Self, EngineError> {
        if admin.is_null() || custodian.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        Ok(Self {
            admin,
            custodian,
            bank,
            exchange,
            registry: Registry::new(),
            vaults: HashMap::new(),
        })
    }

    /// The coordinator's custodian account.
    pub fn custodian(&self) -> &AccountId {
        &self.custodian
    }

    /// The asset→vault routing table.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn require_admin(&self, caller: &AccountId) -> Result<(), EngineError> {
        if *caller != self.admin {
            return Err(EngineError::Unauthorized {
                caller: caller.clone(),
                role: "admin",
            });
        }
        Ok(())
    }

    /// Registers `vault` as the route for its asset (last write wins) and
    /// grants the vault a standing allowance over the custodian's funds so
    /// destination deposits can pull without per-operation approvals.
    pub fn register_vault(
        &mut self,
        caller: &AccountId,
        vault: SharedVault,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        let (asset, id) = {
            let v = vault.read();
            self.bank.approve(
                &v.asset(),
                &self.custodian,
                v.account(),
                UNLIMITED_ALLOWANCE,
            )?;
            (v.asset(), v.id())
        };
        self.registry.insert(asset, id);
        self.vaults.insert(id, vault);
        tracing::info!(asset = %asset, vault = %id, "vault registered for reallocation");
        Ok(())
    }

    /// Moves `shares` of `caller`'s position from the `from_asset` vault
    /// into the `to_asset` vault through the exchange, as one atomic unit.
    pub fn reallocate(
        &self,
        caller: &AccountId,
        from_asset: &AssetId,
        to_asset: &AssetId,
        shares: u64,
    ) -> Result<ReallocationReceipt, EngineError> {
        if shares == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if caller.is_null() {
            return Err(EngineError::InvalidAddress);
        }

        let from_id = self
            .registry
            .resolve(from_asset)
            .ok_or(EngineError::VaultNotRegistered(*from_asset))?;
        let to_id = self
            .registry
            .resolve(to_asset)
            .ok_or(EngineError::VaultNotRegistered(*to_asset))?;
        if from_id == to_id {
            return Err(EngineError::SameVault(from_id));
        }
        // The registry and vault table are populated together, so both
        // lookups succeed whenever the registry resolves.
        let source = self
            .vaults
            .get(&from_id)
            .cloned()
            .ok_or(EngineError::VaultNotRegistered(*from_asset))?;
        let dest = self
            .vaults
            .get(&to_id)
            .cloned()
            .ok_or(EngineError::VaultNotRegistered(*to_asset))?;

        // Pre-flight: every remaining failure condition, checked before
        // anything mutates. The snapshot of the source exchange rate also
        // happens here, before the withdrawal.
        let expected_from_amount = {
            let src = source.read();
            if src.allocator() != Some(&self.custodian) {
                return Err(EngineError::Unauthorized {
                    caller: self.custodian.clone(),
                    role: "allocator",
                });
            }
            let held = src.shares_of(caller);
            if held < shares {
                return Err(EngineError::InsufficientShares {
                    holder: caller.clone(),
                    available: held,
                    requested: shares,
                });
            }
            // Surfaces reward-wiring misconfiguration while aborting is
            // still free.
            src.pending_rewards(caller)?;
            src.preview_withdraw(shares)?
        };
        {
            let dst = dest.read();
            if dst.is_paused() {
                return Err(EngineError::VaultPaused { vault: to_id });
            }
            dst.pending_rewards(caller)?;
        }
        if expected_from_amount == 0 {
            // A dust position that redeems to nothing cannot move.
            return Err(EngineError::ZeroAmount);
        }

        let to_amount = self.exchange.swap(to_asset, expected_from_amount)?;
        if to_amount == 0 {
            return Err(EngineError::InsufficientLiquidity {
                asset: *to_asset,
                requested: expected_from_amount,
            });
        }

        // Execution: the pre-flight has eliminated every failure path, so
        // the two legs land together or the operation has already aborted.
        let withdrawal =
            source
                .write()
                .forced_withdraw(&self.custodian, caller, &self.custodian, shares)?;
        let deposit = dest.write().deposit(&self.custodian, caller, to_amount)?;

        tracing::info!(
            caller = %caller,
            from_vault = %from_id,
            to_vault = %to_id,
            shares,
            from_amount = withdrawal.amount,
            to_amount,
            "reallocation settled"
        );

        Ok(ReallocationReceipt {
            caller: caller.clone(),
            from_asset: *from_asset,
            to_asset: *to_asset,
            from_vault: from_id,
            to_vault: to_id,
            shares_withdrawn: shares,
            expected_from_amount,
            from_amount: withdrawal.amount,
            to_amount: deposit.amount,
            shares_minted: deposit.shares_minted,
            timestamp: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
