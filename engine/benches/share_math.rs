// Share-math benchmarks for the COFFER engine.
//
// Covers the floor-division conversions on the deposit/withdraw hot path
// and a full deposit/withdraw cycle against an in-memory bank at various
// holder counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use coffer_engine::account::AccountId;
use coffer_engine::ports::InMemoryBank;
use coffer_engine::vault::{assets_for_shares, mul_div_floor, shares_for_deposit, Vault};

fn bench_mul_div_floor(c: &mut Criterion) {
    c.bench_function("math/mul_div_floor", |b| {
        b.iter(|| {
            mul_div_floor(
                black_box(123_456_789),
                black_box(987_654_321),
                black_box(1_000_003),
            )
            .unwrap()
        });
    });
}

fn bench_conversions(c: &mut Criterion) {
    c.bench_function("math/shares_for_deposit", |b| {
        b.iter(|| {
            shares_for_deposit(black_box(1_000_000), black_box(987_654_321), black_box(1_013_370_001))
                .unwrap()
        });
    });
    c.bench_function("math/assets_for_shares", |b| {
        b.iter(|| {
            assets_for_shares(black_box(999_999), black_box(987_654_321), black_box(1_013_370_001))
                .unwrap()
        });
    });
}

fn bench_deposit_withdraw_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/deposit_withdraw_cycle");

    for holders in [10u64, 100, 1_000] {
        let bank = Arc::new(InMemoryBank::new());
        let issuer = AccountId::new("cof:issuer");
        let asset = bank.register_asset("Coffer USD", "cUSD", &issuer).unwrap();
        let mut vault = Vault::new(
            asset,
            AccountId::new("cof:vault"),
            AccountId::new("cof:admin"),
            bank.clone(),
        )
        .unwrap();

        // Pre-populate the share book so the cycle runs at depth.
        for i in 0..holders {
            let user = AccountId::new(format!("cof:user{i}"));
            bank.mint(&asset, &issuer, &user, 1_000_000).unwrap();
            bank.approve(&asset, &user, vault.account(), u64::MAX).unwrap();
            vault.deposit(&user, &user, 10_000 + i).unwrap();
        }

        let cycler = AccountId::new("cof:cycler");
        bank.mint(&asset, &issuer, &cycler, u64::MAX / 4).unwrap();
        bank.approve(&asset, &cycler, vault.account(), u64::MAX).unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(holders),
            &holders,
            |b, _| {
                b.iter(|| {
                    let receipt = vault.deposit(&cycler, &cycler, 12_345).unwrap();
                    vault
                        .withdraw(&cycler, &cycler, receipt.shares_minted)
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_mul_div_floor,
    bench_conversions,
    bench_deposit_withdraw_cycle,
);
criterion_main!(benches);
