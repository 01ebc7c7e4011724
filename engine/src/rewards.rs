//! # Reward Accumulator -- Time-Weighted Reward Per Share
//!
//! Distributes a reward asset to a vault's shareholders at an admin-set
//! rate per second, using the classic reward-per-share accumulator: a
//! monotonically non-decreasing fixed-point counter whose growth since a
//! user's last checkpoint, times the user's share count, equals their newly
//! accrued reward.
//!
//! ## The checkpoint contract
//!
//! The ledger MUST checkpoint a user **before** changing their share
//! balance. The accumulator prices the elapsed period with the shares the
//! user held during that period; checkpointing after the change would
//! misattribute the accrued reward. [`Vault`](crate::vault::Vault) upholds
//! this by checkpointing at the top of every share-mutating operation.
//!
//! ## Zero-share periods
//!
//! While a vault has zero total shares the accumulator is frozen: the
//! configured rate during such a period is lost, not banked. The update
//! still advances the timestamp, which is exactly what discards the
//! zero-share interval.
//!
//! Share figures are passed in by the ledger at every call, so the
//! accumulator holds no reference back into any vault -- the call graph
//! stays acyclic and lock-ordering trivial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::account::AccountId;
use crate::asset::AssetId;
use crate::config::REWARD_SCALE;
use crate::error::EngineError;
use crate::ports::AssetTransferPort;
use crate::vault::VaultId;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for reward accrual, in unix seconds.
///
/// A trait seam so the time-weighted properties are deterministic under
/// test: production wires [`SystemClock`], tests wire [`ManualClock`].
pub trait Clock: Send + Sync {
    /// Current time as unix seconds.
    fn now_unix(&self) -> u64;
}

/// Wall-clock time via chrono.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }
}

/// Manually advanced clock for tests and demos.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start` unix seconds.
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Advances the clock by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute unix timestamp.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Per-user reward sub-state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserRewardState {
    /// The accumulator value at the user's last checkpoint.
    pub checkpoint: u128,
    /// Reward accrued but not yet claimed, in reward-asset units.
    pub unclaimed: u64,
}

/// Per-vault reward state.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardState {
    /// Reward-per-share, fixed-point at [`REWARD_SCALE`]. Monotonically
    /// non-decreasing while the vault has shares.
    pub accumulator: u128,
    /// Emission rate in reward-asset units per second.
    pub rate_per_second: u64,
    /// Unix timestamp of the last accumulator update.
    pub last_update: u64,
    /// Per-user checkpoints and unclaimed balances.
    pub users: HashMap<AccountId, UserRewardState>,
}

/// Receipt returned by a successful (non-empty) claim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// The vault the reward accrued against.
    pub vault: VaultId,
    /// The claiming account.
    pub user: AccountId,
    /// Reward-asset amount paid out.
    pub amount: u64,
    /// When the claim settled (UTC).
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RewardAccumulator
// ---------------------------------------------------------------------------

/// Time-weighted reward tracker for any number of vaults.
///
/// Claims are paid by transferring the reward asset from a designated
/// funding account; keeping that account topped up is an operational
/// concern outside the engine.
pub struct RewardAccumulator {
    reward_asset: AssetId,
    /// Claims are paid from this account.
    funding_account: AccountId,
    admin: AccountId,
    bank: Arc<dyn AssetTransferPort>,
    clock: Arc<dyn Clock>,
    vaults: HashMap<VaultId, RewardState>,
}

impl RewardAccumulator {
    /// Creates an accumulator paying `reward_asset` out of
    /// `funding_account`.
    pub fn new(
        reward_asset: AssetId,
        funding_account: AccountId,
        admin: AccountId,
        bank: Arc<dyn AssetTransferPort>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        if funding_account.is_null() || admin.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        Ok(Self {
            reward_asset,
            funding_account,
            admin,
            bank,
            clock,
            vaults: HashMap::new(),
        })
    }

    /// The reward asset this accumulator pays out.
    pub fn reward_asset(&self) -> AssetId {
        self.reward_asset
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

    fn state(&self, vault: VaultId) -> Result<&RewardState, EngineError> {
        self.vaults
            .get(&vault)
            .ok_or(EngineError::UnknownVault(vault))
    }

    /// Registers a vault, initializing its accumulator, rate, and
    /// timestamp to zero. Re-registering an existing vault is a no-op;
    /// accrued state is never reset.
    pub fn register_vault(
        &mut self,
        caller: &AccountId,
        vault: VaultId,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.vaults.entry(vault).or_default();
        Ok(())
    }

    /// Current emission rate for `vault`.
    pub fn rate(&self, vault: VaultId) -> Result<u64, EngineError> {
        Ok(self.state(vault)?.rate_per_second)
    }

    /// The accumulator increment earned between `state.last_update` and
    /// `now`, given the share supply in force over that interval.
    fn accrued(state: &RewardState, now: u64, total_shares: u64) -> Result<u128, EngineError> {
        if total_shares == 0 || now <= state.last_update {
            return Ok(0);
        }
        let elapsed = (now - state.last_update) as u128;
        elapsed
            .checked_mul(state.rate_per_second as u128)
            .and_then(|x| x.checked_mul(REWARD_SCALE))
            .map(|x| x / total_shares as u128)
            .ok_or(EngineError::Overflow)
    }

    /// Settles the accumulator up to now and advances the timestamp.
    ///
    /// Runs before any read of "current accumulator" and before any user
    /// checkpoint. With zero shares the increment is skipped but the
    /// timestamp still advances, discarding the zero-share interval.
    pub fn update_global(
        &mut self,
        vault: VaultId,
        total_shares: u64,
    ) -> Result<(), EngineError> {
        let now = self.clock.now_unix();
        let state = self
            .vaults
            .get_mut(&vault)
            .ok_or(EngineError::UnknownVault(vault))?;
        let accrued = Self::accrued(state, now, total_shares)?;
        state.accumulator = state
            .accumulator
            .checked_add(accrued)
            .ok_or(EngineError::Overflow)?;
        state.last_update = now;
        Ok(())
    }

    /// The accumulator value as of this instant, computed on the fly
    /// without mutating anything.
    fn live_accumulator(
        &self,
        vault: VaultId,
        total_shares: u64,
    ) -> Result<u128, EngineError> {
        let state = self.state(vault)?;
        let accrued = Self::accrued(state, self.clock.now_unix(), total_shares)?;
        state
            .accumulator
            .checked_add(accrued)
            .ok_or(EngineError::Overflow)
    }

    /// `user`'s total pending reward: stored unclaimed balance plus what
    /// their current shares have earned since their last checkpoint. Pure
    /// read.
    pub fn pending_reward(
        &self,
        vault: VaultId,
        user: &AccountId,
        user_shares: u64,
        total_shares: u64,
    ) -> Result<u64, EngineError> {
        let live = self.live_accumulator(vault, total_shares)?;
        let state = self.state(vault)?;
        let (checkpoint, unclaimed) = state
            .users
            .get(user)
            .map(|u| (u.checkpoint, u.unclaimed))
            .unwrap_or((0, 0));
        let earned = (user_shares as u128)
            .checked_mul(live - checkpoint)
            .ok_or(EngineError::Overflow)?
            / REWARD_SCALE;
        let earned = u64::try_from(earned).map_err(|_| EngineError::Overflow)?;
        unclaimed.checked_add(earned).ok_or(EngineError::Overflow)
    }

    /// Folds `user`'s accrued reward into their unclaimed balance and
    /// stamps their checkpoint at the current accumulator.
    ///
    /// The ledger invokes this immediately before any share-balance change
    /// for `user`; `user_shares` and `total_shares` are the pre-change
    /// values.
    pub fn checkpoint_user(
        &mut self,
        vault: VaultId,
        user: &AccountId,
        user_shares: u64,
        total_shares: u64,
    ) -> Result<(), EngineError> {
        self.update_global(vault, total_shares)?;
        let state = self
            .vaults
            .get_mut(&vault)
            .ok_or(EngineError::UnknownVault(vault))?;
        let accumulator = state.accumulator;
        let entry = state.users.entry(user.clone()).or_default();
        let earned = (user_shares as u128)
            .checked_mul(accumulator - entry.checkpoint)
            .ok_or(EngineError::Overflow)?
            / REWARD_SCALE;
        let earned = u64::try_from(earned).map_err(|_| EngineError::Overflow)?;
        entry.unclaimed = entry
            .unclaimed
            .checked_add(earned)
            .ok_or(EngineError::Overflow)?;
        entry.checkpoint = accumulator;
        Ok(())
    }

    /// Pays out `user`'s entire pending reward and resets their unclaimed
    /// balance, stamping their checkpoint at the current accumulator.
    /// Returns `None` -- no transfer, no event -- when nothing is pending.
    ///
    /// The pending amount is quoted with the pure read first and the
    /// checkpoint committed only after the payout succeeds, so a failed
    /// transfer leaves the accumulator state byte-for-byte untouched. The
    /// transfer port has no path back into the engine, which is what makes
    /// paying before committing safe here.
    pub fn claim(
        &mut self,
        vault: VaultId,
        user: &AccountId,
        user_shares: u64,
        total_shares: u64,
    ) -> Result<Option<ClaimReceipt>, EngineError> {
        if user.is_null() {
            return Err(EngineError::InvalidAddress);
        }
        let amount = self.pending_reward(vault, user, user_shares, total_shares)?;
        if amount == 0 {
            return Ok(None);
        }

        self.bank
            .transfer(&self.reward_asset, &self.funding_account, user, amount)?;

        // Same clock instant as the quote above, so the fold settles to
        // exactly `amount` before it is zeroed.
        self.checkpoint_user(vault, user, user_shares, total_shares)?;
        if let Some(entry) = self
            .vaults
            .get_mut(&vault)
            .and_then(|s| s.users.get_mut(user))
        {
            entry.unclaimed = 0;
        }

        tracing::info!(vault = %vault, user = %user, amount, "reward claimed");

        Ok(Some(ClaimReceipt {
            vault,
            user: user.clone(),
            amount,
            timestamp: Utc::now(),
        }))
    }

    /// Replaces the emission rate, settling the accumulator first so the
    /// old rate applies up to the switch instant and the new rate from
    /// then on.
    pub fn set_rate(
        &mut self,
        caller: &AccountId,
        vault: VaultId,
        rate_per_second: u64,
        total_shares: u64,
    ) -> Result<(), EngineError> {
        self.require_admin(caller)?;
        self.update_global(vault, total_shares)?;
        let state = self
            .vaults
            .get_mut(&vault)
            .ok_or(EngineError::UnknownVault(vault))?;
        let old = state.rate_per_second;
        state.rate_per_second = rate_per_second;
        tracing::info!(vault = %vault, old, new = rate_per_second, "reward rate changed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InMemoryBank;

    struct Fixture {
        bank: Arc<InMemoryBank>,
        clock: Arc<ManualClock>,
        acc: RewardAccumulator,
        vault: VaultId,
        reward_asset: AssetId,
    }

    const FUNDING: u64 = 1_000_000_000;

    fn fixture() -> Fixture {
        let bank = Arc::new(InMemoryBank::new());
        let issuer = AccountId::new("cof:issuer");
        let funding = AccountId::new("cof:rewards-pool");
        let admin = AccountId::new("cof:admin");
        let reward_asset = bank.register_asset("Coffer Reward", "cRWD", &issuer).unwrap();
        bank.mint(&reward_asset, &issuer, &funding, FUNDING).unwrap();

        let clock = Arc::new(ManualClock::new(1_000));
        let mut acc = RewardAccumulator::new(
            reward_asset,
            funding,
            admin.clone(),
            bank.clone(),
            clock.clone(),
        )
        .unwrap();

        let vault = Uuid::new_v4();
        acc.register_vault(&admin, vault).unwrap();
        acc.set_rate(&admin, vault, 10, 0).unwrap();

        Fixture {
            bank,
            clock,
            acc,
            vault,
            reward_asset,
        }
    }

    use uuid::Uuid;

    #[test]
    fn pending_grows_linearly_for_static_holder() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        // Alice "deposits" 100 of 100 total shares.
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();

        fx.clock.advance(50);
        let at_50 = fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap();
        assert_eq!(at_50, 500); // 50s * 10/s, sole holder

        fx.clock.advance(50);
        let at_100 = fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap();
        assert_eq!(at_100, 1_000);
        assert!(at_100 >= at_50, "pending must be non-decreasing");
    }

    #[test]
    fn pending_is_a_pure_read() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 100).unwrap();
        fx.clock.advance(10);

        let first = fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap();
        let second = fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap();
        assert_eq!(first, second);
        // No update_global ran; the stored timestamp is untouched.
        assert_eq!(fx.acc.state(fx.vault).unwrap().last_update, 1_000);
    }

    #[test]
    fn zero_share_period_is_lost_not_banked() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");

        // Rate is configured but nobody holds shares for 100s.
        fx.clock.advance(100);
        fx.acc.update_global(fx.vault, 0).unwrap();
        assert_eq!(fx.acc.state(fx.vault).unwrap().accumulator, 0);

        // Alice enters; only time from here on accrues.
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();
        fx.clock.advance(10);
        assert_eq!(
            fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap(),
            100
        );
    }

    #[test]
    fn accumulator_is_monotonic_across_updates() {
        let mut fx = fixture();
        let mut last = 0u128;
        for step in [7u64, 0, 13, 1, 29] {
            fx.clock.advance(step);
            fx.acc.update_global(fx.vault, 50).unwrap();
            let acc = fx.acc.state(fx.vault).unwrap().accumulator;
            assert!(acc >= last);
            last = acc;
        }
    }

    #[test]
    fn reward_splits_by_share_weight() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        let bob = AccountId::new("cof:bob");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();
        fx.acc.checkpoint_user(fx.vault, &bob, 0, 0).unwrap();

        // Alice holds 75, bob 25, for 100 seconds at 10/s.
        fx.clock.advance(100);
        assert_eq!(
            fx.acc.pending_reward(fx.vault, &alice, 75, 100).unwrap(),
            750
        );
        assert_eq!(
            fx.acc.pending_reward(fx.vault, &bob, 25, 100).unwrap(),
            250
        );
    }

    #[test]
    fn checkpoint_preserves_accrued_reward_across_share_change() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();

        // 100 shares for 60 seconds.
        fx.clock.advance(60);
        fx.acc.checkpoint_user(fx.vault, &alice, 100, 100).unwrap();

        // Share balance doubles; the first hour's accrual must survive.
        fx.clock.advance(60);
        let pending = fx.acc.pending_reward(fx.vault, &alice, 200, 200).unwrap();
        assert_eq!(pending, 600 + 600);
    }

    #[test]
    fn claim_pays_and_zeroes_unclaimed() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();
        fx.clock.advance(100);

        let receipt = fx
            .acc
            .claim(fx.vault, &alice, 100, 100)
            .unwrap()
            .expect("non-zero claim");
        assert_eq!(receipt.amount, 1_000);
        assert_eq!(fx.bank.balance_of(&fx.reward_asset, &alice), 1_000);

        // Immediately claiming again yields nothing.
        assert!(fx.acc.claim(fx.vault, &alice, 100, 100).unwrap().is_none());
    }

    #[test]
    fn zero_claim_is_a_silent_noop() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        assert!(fx.acc.claim(fx.vault, &alice, 0, 0).unwrap().is_none());
        assert_eq!(fx.bank.balance_of(&fx.reward_asset, &alice), 0);
    }

    #[test]
    fn failed_payout_leaves_balance_claimable() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();

        // Accrue more than the funding account holds.
        fx.acc
            .set_rate(&AccountId::new("cof:admin"), fx.vault, FUNDING, 100)
            .unwrap();
        fx.clock.advance(2);

        let result = fx.acc.claim(fx.vault, &alice, 100, 100);
        assert!(matches!(
            result,
            Err(EngineError::InsufficientFunds { .. })
        ));
        // Nothing was paid, nothing was zeroed.
        assert_eq!(fx.bank.balance_of(&fx.reward_asset, &alice), 0);
        assert!(fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap() > 0);
    }

    #[test]
    fn set_rate_applies_old_rate_up_to_switch() {
        let mut fx = fixture();
        let admin = AccountId::new("cof:admin");
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();

        // 50s at 10/s, then the rate drops to 2/s for another 50s.
        fx.clock.advance(50);
        fx.acc.set_rate(&admin, fx.vault, 2, 100).unwrap();
        fx.clock.advance(50);

        assert_eq!(
            fx.acc.pending_reward(fx.vault, &alice, 100, 100).unwrap(),
            500 + 100
        );
    }

    #[test]
    fn set_rate_requires_admin() {
        let mut fx = fixture();
        let mallory = AccountId::new("cof:mallory");
        let result = fx.acc.set_rate(&mallory, fx.vault, 99, 100);
        assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
        assert_eq!(fx.acc.rate(fx.vault).unwrap(), 10);
    }

    #[test]
    fn unregistered_vault_rejected() {
        let mut fx = fixture();
        let ghost = Uuid::new_v4();
        assert!(matches!(
            fx.acc.update_global(ghost, 10),
            Err(EngineError::UnknownVault(_))
        ));
        assert!(matches!(
            fx.acc
                .pending_reward(ghost, &AccountId::new("cof:alice"), 1, 1),
            Err(EngineError::UnknownVault(_))
        ));
    }

    #[test]
    fn reregistration_does_not_reset_state() {
        let mut fx = fixture();
        let admin = AccountId::new("cof:admin");
        fx.clock.advance(10);
        fx.acc.update_global(fx.vault, 100).unwrap();
        let before = fx.acc.state(fx.vault).unwrap().accumulator;
        assert!(before > 0);

        fx.acc.register_vault(&admin, fx.vault).unwrap();
        assert_eq!(fx.acc.state(fx.vault).unwrap().accumulator, before);
        assert_eq!(fx.acc.rate(fx.vault).unwrap(), 10);
    }

    #[test]
    fn reward_state_serialization_roundtrip() {
        let mut fx = fixture();
        let alice = AccountId::new("cof:alice");
        fx.acc.checkpoint_user(fx.vault, &alice, 0, 0).unwrap();
        fx.clock.advance(10);
        fx.acc.checkpoint_user(fx.vault, &alice, 100, 100).unwrap();

        let state = fx.acc.state(fx.vault).unwrap();
        let json = serde_json::to_string(state).expect("serialize");
        let recovered: RewardState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.accumulator, state.accumulator);
        assert_eq!(recovered.users[&alice].unclaimed, 1_000);
    }
}
