//! # Scripted End-to-End Scenario
//!
//! Wires a complete engine -- in-memory bank, two vaults (one carrying a
//! simulated yield adapter), the reward accumulator on a manual clock, and
//! the reallocation coordinator -- then walks two users through the whole
//! lifecycle:
//!
//! 1. Alice bootstraps the USD vault; the adapter reports 5% yield.
//! 2. Bob deposits at the uplifted rate and mints fewer shares.
//! 3. Rewards stream for the configured window; Alice claims hers.
//! 4. Alice moves half her position into the EUR vault atomically.
//! 5. Both users exit and the final balances are reported.
//!
//! The report lands on stdout as JSON; everything narrative goes to the
//! log on stderr.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Serialize;

use coffer_engine::account::AccountId;
use coffer_engine::ports::{IdentityExchange, InMemoryBank, SimulatedYieldAdapter};
use coffer_engine::realloc::{ReallocationCoordinator, SharedVault};
use coffer_engine::rewards::{ManualClock, RewardAccumulator};
use coffer_engine::vault::Vault;

use crate::cli::DemoArgs;

/// Final state summary emitted on stdout.
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    /// Shares Bob minted against the uplifted pool (95 for the default
    /// walk-through).
    pub bob_shares: u64,
    /// Reward units Alice claimed after the accrual window.
    pub alice_reward_claimed: u64,
    /// Shares Alice holds in the EUR vault after the reallocation.
    pub alice_eur_shares: u64,
    /// Alice's final USD balance after exiting both positions.
    pub alice_final_usd: u64,
    /// Alice's final EUR balance after exiting both positions.
    pub alice_final_eur: u64,
    /// Bob's final USD balance.
    pub bob_final_usd: u64,
    /// Dust retained by the USD vault from floor rounding.
    pub usd_vault_residue: u64,
}

/// Runs the scenario and prints the JSON report.
pub fn run(args: &DemoArgs) -> Result<()> {
    let bank = Arc::new(InMemoryBank::new());
    let issuer = AccountId::new("cof:issuer");
    let admin = AccountId::new("cof:admin");
    let custodian = AccountId::new("cof:coordinator");
    let funding = AccountId::new("cof:rewards-pool");
    let alice = AccountId::new("cof:alice");
    let bob = AccountId::new("cof:bob");

    let usd = bank
        .register_asset("Coffer USD", "cUSD", &issuer)
        .context("registering cUSD")?;
    let eur = bank
        .register_asset("Coffer EUR", "cEUR", &issuer)
        .context("registering cEUR")?;
    let reward = bank
        .register_asset("Coffer Reward", "cRWD", &issuer)
        .context("registering cRWD")?;

    // Seed balances: users, the reward pool, and the coordinator's
    // exchange inventory.
    bank.mint(&usd, &issuer, &alice, 1_000)?;
    bank.mint(&usd, &issuer, &bob, 1_000)?;
    bank.mint(&reward, &issuer, &funding, 10_000_000)?;
    bank.mint(&eur, &issuer, &custodian, 10_000)?;

    // Vaults and collaborators.
    let vault_usd: SharedVault = Arc::new(RwLock::new(Vault::new(
        usd,
        AccountId::new("cof:vault-usd"),
        admin.clone(),
        bank.clone(),
    )?));
    let vault_eur: SharedVault = Arc::new(RwLock::new(Vault::new(
        eur,
        AccountId::new("cof:vault-eur"),
        admin.clone(),
        bank.clone(),
    )?));

    let adapter = Arc::new(SimulatedYieldAdapter::new(
        bank.clone(),
        usd,
        AccountId::new("cof:adapter-usd"),
        vault_usd.read().account().clone(),
    ));
    vault_usd
        .write()
        .set_yield_adapter(&admin, adapter.clone())?;

    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let mut accumulator = RewardAccumulator::new(
        reward,
        funding,
        admin.clone(),
        bank.clone(),
        clock.clone(),
    )?;
    accumulator.register_vault(&admin, vault_usd.read().id())?;
    accumulator.register_vault(&admin, vault_eur.read().id())?;
    let rewards = Arc::new(RwLock::new(accumulator));
    vault_usd
        .write()
        .set_reward_accumulator(&admin, rewards.clone())?;
    vault_eur.write().set_reward_accumulator(&admin, rewards)?;

    vault_usd.write().set_allocator(&admin, custodian.clone())?;
    vault_eur.write().set_allocator(&admin, custodian.clone())?;

    let exchange = Arc::new(IdentityExchange::new(bank.clone(), custodian.clone()));
    let mut coordinator =
        ReallocationCoordinator::new(admin.clone(), custodian.clone(), bank.clone(), exchange)?;
    coordinator.register_vault(&admin, vault_usd.clone())?;
    coordinator.register_vault(&admin, vault_eur.clone())?;

    // --- Act 1: deposits and yield -------------------------------------

    bank.approve(&usd, &alice, vault_usd.read().account(), 1_000)?;
    bank.approve(&usd, &bob, vault_usd.read().account(), 1_000)?;

    vault_usd.write().deposit(&alice, &alice, 100)?;
    tracing::info!("alice bootstrapped the USD vault with 100");

    bank.mint(&usd, &issuer, adapter.account(), 5)?;
    tracing::info!(total_assets = vault_usd.read().total_assets(), "adapter reported 5% yield");

    let bob_receipt = vault_usd.write().deposit(&bob, &bob, 100)?;
    tracing::info!(shares = bob_receipt.shares_minted, "bob deposited at the uplifted rate");

    // --- Act 2: rewards ------------------------------------------------

    vault_usd.read().set_reward_rate(&admin, args.reward_rate)?;
    clock.advance(args.accrual_secs);
    tracing::info!(
        pending = vault_usd.read().pending_rewards(&alice)?,
        window_secs = args.accrual_secs,
        "accrual window elapsed"
    );

    let claim = vault_usd.read().claim_rewards(&alice)?;
    let alice_reward_claimed = claim.map(|r| r.amount).unwrap_or(0);

    // --- Act 3: reallocation -------------------------------------------

    let realloc = coordinator.reallocate(&alice, &usd, &eur, 50)?;
    tracing::info!(
        from_amount = realloc.from_amount,
        to_amount = realloc.to_amount,
        "alice moved half her position into the EUR vault"
    );
    let alice_eur_shares = vault_eur.read().shares_of(&alice);

    // --- Act 4: exits --------------------------------------------------

    let alice_usd_shares = vault_usd.read().shares_of(&alice);
    if alice_usd_shares > 0 {
        vault_usd.write().withdraw(&alice, &alice, alice_usd_shares)?;
    }
    let bob_shares = vault_usd.read().shares_of(&bob);
    vault_usd.write().withdraw(&bob, &bob, bob_shares)?;
    vault_eur.write().withdraw(&alice, &alice, alice_eur_shares)?;

    let report = ScenarioReport {
        bob_shares: bob_receipt.shares_minted,
        alice_reward_claimed,
        alice_eur_shares,
        alice_final_usd: bank.balance_of(&usd, &alice),
        alice_final_eur: bank.balance_of(&eur, &alice),
        bob_final_usd: bank.balance_of(&usd, &bob),
        usd_vault_residue: vault_usd.read().total_assets(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
