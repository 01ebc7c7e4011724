//! # Vault -- Pooled-Asset Share Ledger
//!
//! A [`Vault`] pools a single asset and issues proportional ownership
//! shares against it. Depositors receive `floor(amount * total_shares /
//! total_assets)` shares (1:1 on the bootstrap deposit); redeemers receive
//! `floor(shares * total_assets / total_shares)` of the asset. Idle assets
//! may be delegated to a yield adapter, whose self-reported valuation
//! counts toward `total_assets()`.
//!
//! ## Operation ordering
//!
//! Every mutating operation runs the same phases, in order:
//!
//! 1. validate preconditions (zero amounts, null addresses, balances,
//!    capabilities) -- any failure here leaves zero observable effect;
//! 2. checkpoint the affected user's rewards, while their share balance
//!    still has its pre-operation value;
//! 3. measure, then move assets and mutate the share book;
//! 4. interact with the adapter / pay out;
//! 5. emit the notification and return a receipt.
//!
//! Share mutations settle before any asset leaves the vault, so a
//! misbehaving port implementation observes only already-consistent state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::error::EngineError;
use crate::ports::{AssetTransferPort, YieldAdapterPort};
use crate::rewards::{ClaimReceipt, RewardAccumulator};
use crate::vault::math::{assets_for_shares, shares_for_deposit};
use crate::vault::shares::ShareBook;

/// Identifies a single vault instance.
pub type VaultId = Uuid;

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Receipt returned by [`Vault::deposit`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// The vault that minted the shares.
    pub vault: VaultId,
    /// The account the deposit was pulled from.
    pub caller: AccountId,
    /// The account credited with the minted shares.
    pub receiver: AccountId,
    /// Asset amount deposited.
    pub amount: u64,
    /// Shares minted to `receiver`.
    pub shares_minted: u64,
    /// Total share supply after the mint.
    pub total_shares: u64,
    /// When the deposit settled (UTC).
    pub timestamp: DateTime<Utc>,
}

/// Receipt returned by [`Vault::withdraw`] and [`Vault::forced_withdraw`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    /// The vault that burned the shares.
    pub vault: VaultId,
    /// The account whose shares were debited.
    pub holder: AccountId,
    /// The account the asset was paid to.
    pub receiver: AccountId,
    /// Shares burned from `holder`.
    pub shares_burned: u64,
    /// Asset amount paid out.
    pub amount: u64,
    /// Total share supply after the burn.
    pub total_shares: u64,
    /// When the withdrawal settled (UTC).
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// Per-vault proportional share ledger over a single asset.
///
/// The vault owns its share book exclusively; external components reach it
/// only through the operations below. Collaborator wiring (adapter, reward
/// accumulator, allocator) is admin-set after construction.
pub struct Vault {
    id: VaultId,
    /// The pooled asset. Immutable for the vault's lifetime.
    asset: AssetId,
    /// The vault's own treasury account at the transfer port.
    account: AccountId,
    admin: AccountId,
    bank: Arc<dyn AssetTransferPort>,
    /// Optional yield source for idle assets.
    adapter: Option<Arc<dyn YieldAdapterPort>>,
    /// Optional reward accumulator, checkpointed before share changes.
    rewards: Option<Arc<RwLock<RewardAccumulator>>>,
    /// The one account allowed to execute forced withdrawals.
    allocator: Option<AccountId>,
    /// While paused, new deposits are rejected; exits stay open.
    paused: bool,
    shares: ShareBook,
    created_at: DateTime<Utc>,
}

impl Vault {
    /// Creates a vault pooling `asset`, holding funds under `account`,
    /// administered by `admin`.
    pub fn new(
        asset: AssetId,
        account: AccountId,
        admin: AccountId,
        bank: Arc<dyn AssetTransferPort>,
    ) -> Result<Self, EngineError> {
        if account.is_null() || admin.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            asset,
            account,
            admin,
            bank,
            adapter: None,
            rewards: None,
            allocator: None,
            paused: false,
            shares: ShareBook::new(),
            created_at: Utc::now(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// This vault's id.
    pub fn id(&self) -> VaultId {
        self.id
    }

    /// The pooled asset.
    pub fn asset(&self) -> AssetId {
        self.asset
    }

    /// The vault's treasury account at the transfer port.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// `holder`'s share balance.
    pub fn shares_of(&self, holder: &AccountId) -> u64 {
        self.shares.of(holder)
    }

    /// Total share supply.
    pub fn share_supply(&self) -> u64 {
        self.shares.total()
    }

    /// Returns `true` while deposits are suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The account currently authorized for forced withdrawals, if any.
    pub fn allocator(&self) -> Option<&AccountId> {
        self.allocator.as_ref()
    }

    /// When this vault was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Liquid balance plus the adapter's self-reported valuation.
    ///
    /// Recomputed on every call; the adapter's report is trusted as-is.
    pub fn total_assets(&self) -> u64 {
        let liquid = self.bank.balance_of(&self.asset, &self.account);
        let delegated = self
            .adapter
            .as_ref()
            .map(|a| a.total_assets())
            .unwrap_or(0);
        liquid.saturating_add(delegated)
    }

    /// The asset amount `shares` would redeem for right now.
    ///
    /// Pure read of the same floor math [`withdraw`](Self::withdraw) uses;
    /// the reallocation coordinator snapshots this before the withdrawal
    /// leg.
    pub fn preview_withdraw(&self, shares: u64) -> Result<u64, EngineError> {
        assets_for_shares(shares, self.shares.total(), self.total_assets())
    }

    // -----------------------------------------------------------------------
    // Admin surface
    // -----------------------------------------------------------------------

    fn require_admin(&self, caller: &AccountId) -> Result<(), EngineError> {
        if *caller != self.admin {
            return Err(EngineError::Unauthorized {
                caller: caller.clone(),
                role: "admin",
            });
        }
        Ok(())
    }

    /// Attaches (or replaces) the yield adapter.
    pub fn set_yield_adapter(
        &mut self,
        caller: &AccountId,
        adapter: Arc<dyn YieldAdapterPort>,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.adapter = Some(adapter);
        Ok(())
    }

    /// Links (or replaces) the reward accumulator. The vault checkpoints
    /// users against it before every share-balance change.
    pub fn set_reward_accumulator(
        &mut self,
        caller: &AccountId,
        rewards: Arc<RwLock<RewardAccumulator>>,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.rewards = Some(rewards);
        Ok(())
    }

    /// Authorizes `allocator` to execute forced withdrawals.
    pub fn set_allocator(
        &mut self,
        caller: &AccountId,
        allocator: AccountId,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if allocator.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        self.allocator = Some(allocator);
        Ok(())
    }

    /// Hands the admin capability to a new account.
    pub fn set_admin(&mut self, caller: &AccountId, admin: AccountId) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        if admin.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        self.admin = admin;
        Ok(())
    }

    /// Suspends or resumes deposits. Withdrawals are never suspended, so
    /// holders can always exit.
    pub fn set_paused(&mut self, caller: &AccountId, paused: bool) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.paused = paused;
        tracing::info!(vault = %self.id, paused, "vault pause state changed");
        Ok(())
    }

    /// Pulls up to `amount` directly from the yield adapter to the admin,
    /// bypassing share accounting. An escape hatch, not part of normal
    /// flow. Returns the amount actually recovered.
    pub fn emergency_withdraw(
        &mut self,
        caller: &AccountId,
        amount: u64,
    ) -> Result<u64, EngineError> {
        self.require_admin(caller)?;
        let Some(adapter) = &self.adapter else {
            tracing::warn!(vault = %self.id, "emergency withdraw with no adapter attached");
            return Ok(0);
        };
        let recovered = adapter.withdraw(amount)?;
        if recovered > 0 {
            self.bank
                .transfer(&self.asset, &self.account, &self.admin, recovered)?;
        }
        tracing::warn!(
            vault = %self.id,
            requested = amount,
            recovered,
            "emergency withdrawal executed"
        );
        Ok(recovered)
    }

    // -----------------------------------------------------------------------
    // Reward pass-throughs
    // -----------------------------------------------------------------------

    /// Folds any reward accrued before this instant into the user's
    /// unclaimed balance. Must run while the user's share balance still has
    /// its pre-operation value; checkpointing after the change would
    /// misattribute the accrued reward.
    fn checkpoint(&self, user: &AccountId) -> Result<(), EngineError> {
        if let Some(rewards) = &self.rewards {
            rewards.write().checkpoint_user(
                self.id,
                user,
                self.shares.of(user),
                self.shares.total(),
            )?;
        }
        Ok(())
    }

    /// `user`'s currently pending reward (zero when no accumulator is
    /// linked). Pure read.
    pub fn pending_rewards(&self, user: &AccountId) -> Result<u64, EngineError> {
        match &self.rewards {
            Some(rewards) => rewards.read().pending_reward(
                self.id,
                user,
                self.shares.of(user),
                self.shares.total(),
            ),
            None => Ok(0),
        }
    }

    /// Claims `caller`'s accrued reward. Returns `None` when nothing is
    /// claimable (including when no accumulator is linked).
    pub fn claim_rewards(
        &self,
        caller: &AccountId,
    ) -> Result<Option<ClaimReceipt>, EngineError> {
        match &self.rewards {
            Some(rewards) => rewards.write().claim(
                self.id,
                caller,
                self.shares.of(caller),
                self.shares.total(),
            ),
            None => Ok(None),
        }
    }

    /// Replaces the reward emission rate, settling the old rate up to this
    /// instant first. The caller must hold the accumulator's admin
    /// capability.
    pub fn set_reward_rate(
        &self,
        caller: &AccountId,
        rate_per_second: u64,
    ) -> Result<(), EngineError> {
        let rewards = self
            .rewards
            .as_ref()
            .ok_or(EngineError::UnknownVault(self.id))?;
        rewards
            .write()
            .set_rate(caller, self.id, rate_per_second, self.shares.total())
    }

    // -----------------------------------------------------------------------
    // Deposit
    // -----------------------------------------------------------------------

    /// Pulls `amount` of the pooled asset from `caller` and mints
    /// proportional shares to `receiver`.
    ///
    /// The caller must have approved the vault's treasury account as a
    /// spender at the transfer port. If a yield adapter is attached, the
    /// deposited amount is forwarded to it after the mint settles.
    ///
    /// # Errors
    ///
    /// [`EngineError::ZeroAmount`] for a zero deposit,
    /// [`EngineError::InvalidAddress`] for a null receiver,
    /// [`EngineError::VaultPaused`] while deposits are suspended, plus any
    /// transfer-port failure (which aborts before shares are minted).
    pub fn deposit(
        &mut self,
        caller: &AccountId,
        receiver: &AccountId,
        amount: u64,
    ) -> Result<DepositReceipt, EngineError> {
        if amount == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if caller.is_null() || receiver.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        if self.paused {
            return Err(EngineError::VaultPaused { vault: self.id });
        }

        self.checkpoint(receiver)?;

        // Measured before the pull so the incoming amount doesn't dilute
        // the mint. The share grant is computed (and its overflow checked)
        // on the same pre-pull figures, so nothing can fail between the
        // pull and the mint.
        let assets_before = self.total_assets();
        let minted = shares_for_deposit(amount, self.shares.total(), assets_before)?;
        if self.shares.total().checked_add(minted).is_none() {
            return Err(EngineError::Overflow);
        }

        self.bank
            .transfer_from(&self.asset, &self.account, caller, &self.account, amount)?;

        self.shares.mint(receiver, minted)?;
        let total_shares = self.shares.total();

        if let Some(adapter) = &self.adapter {
            adapter.deposit(amount)?;
        }

        tracing::info!(
            vault = %self.id,
            caller = %caller,
            receiver = %receiver,
            amount,
            shares = minted,
            "deposit"
        );

        Ok(DepositReceipt {
            vault: self.id,
            caller: caller.clone(),
            receiver: receiver.clone(),
            amount,
            shares_minted: minted,
            total_shares,
            timestamp: Utc::now(),
        })
    }

    // -----------------------------------------------------------------------
    // Withdrawals
    // -----------------------------------------------------------------------

    /// Burns `shares` from `caller` and pays the proportional asset amount
    /// to `receiver`, pulling any liquid shortfall back from the adapter.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        receiver: &AccountId,
        shares: u64,
    ) -> Result<WithdrawReceipt, EngineError> {
        self.redeem(caller, receiver, shares)
    }

    /// Burns `shares` from `user` on their behalf. Authorized only for the
    /// registered allocator -- the trusted orchestrator moving funds
    /// without a share transfer.
    pub fn forced_withdraw(
        &mut self,
        caller: &AccountId,
        user: &AccountId,
        receiver: &AccountId,
        shares: u64,
    ) -> Result<WithdrawReceipt, EngineError> {
        if self.allocator.as_ref() != Some(caller) {
            return Err(EngineError::Unauthorized {
                caller: caller.clone(),
                role: "allocator",
            });
        }
        self.redeem(user, receiver, shares)
    }

    /// Shared redemption flow: validate, checkpoint, price, burn, cover the
    /// liquid shortfall from the adapter, pay out.
    fn redeem(
        &mut self,
        holder: &AccountId,
        receiver: &AccountId,
        shares: u64,
    ) -> Result<WithdrawReceipt, EngineError> {
        if shares == 0 {
            return Err(EngineError::ZeroAmount);
        }
        if holder.is_null() || receiver.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let available = self.shares.of(holder);
        if available < shares {
            return Err(EngineError::InsufficientShares {
                holder: holder.clone(),
                available,
                requested: shares,
            });
        }

        self.checkpoint(holder)?;

        // Priced at pre-burn totals; floor rounds in the ledger's favor.
        let amount = assets_for_shares(shares, self.shares.total(), self.total_assets())?;

        self.shares.burn(holder, shares)?;
        let total_shares = self.shares.total();

        let liquid = self.bank.balance_of(&self.asset, &self.account);
        if liquid < amount {
            if let Some(adapter) = &self.adapter {
                adapter.withdraw(amount - liquid)?;
            }
        }

        self.bank
            .transfer(&self.asset, &self.account, receiver, amount)?;

        tracing::info!(
            vault = %self.id,
            holder = %holder,
            receiver = %receiver,
            shares,
            amount,
            "withdrawal"
        );

        Ok(WithdrawReceipt {
            vault: self.id,
            holder: holder.clone(),
            receiver: receiver.clone(),
            shares_burned: shares,
            amount,
            total_shares,
            timestamp: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
