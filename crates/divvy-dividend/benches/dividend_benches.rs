//! Criterion benchmarks for divvy-dividend hot paths.
//!
//! Covers: distribution, balance-change correction, dividend queries, and withdrawal.

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use divvy_core::constants::COIN;
use divvy_core::error::TransferError;
use divvy_core::traits::{BalanceObserver, ShareRegistry, ValueTransfer};
use divvy_core::types::{Amount, HolderId, Shares};
use divvy_dividend::DividendEngine;

struct BenchRegistry {
    balances: HashMap<HolderId, Shares>,
    total: Shares,
}

impl ShareRegistry for BenchRegistry {
    fn total_shares(&self) -> Shares {
        self.total
    }

    fn balance_of(&self, holder: &HolderId) -> Shares {
        self.balances.get(holder).copied().unwrap_or(0)
    }
}

struct NullPayout;

impl ValueTransfer for NullPayout {
    fn transfer(&mut self, _to: &HolderId, _amount: Amount) -> Result<(), TransferError> {
        Ok(())
    }
}

/// 1,000 holders with 1..=1000 shares each, one distribution already applied.
fn populated() -> (DividendEngine, BenchRegistry) {
    let mut engine = DividendEngine::new();
    let mut balances = HashMap::new();
    let mut total = 0;
    for i in 0..1000u64 {
        let h = HolderId::from_label(&format!("holder-{i}"));
        balances.insert(h, i + 1);
        total += i + 1;
        engine.on_mint(&h, i + 1);
    }
    let reg = BenchRegistry { balances, total };
    engine.distribute_dividends(&HolderId::ZERO, 1_000 * COIN, &reg).unwrap();
    (engine, reg)
}

fn bench_distribute(c: &mut Criterion) {
    let (mut engine, reg) = populated();
    let payer = HolderId::from_label("payer");

    c.bench_function("distribute_dividends", |b| {
        b.iter(|| {
            let res = engine.distribute_dividends(black_box(&payer), black_box(COIN), &reg);
            engine.take_events();
            res
        })
    });
}

fn bench_balance_change(c: &mut Criterion) {
    let (mut engine, _reg) = populated();
    let from = HolderId::from_label("holder-1");
    let to = HolderId::from_label("holder-2");

    c.bench_function("transfer_correction", |b| {
        b.iter(|| engine.on_transfer(black_box(&from), black_box(&to), 1))
    });
}

fn bench_query(c: &mut Criterion) {
    let (engine, reg) = populated();
    let h = HolderId::from_label("holder-500");

    c.bench_function("withdrawable_dividend_of", |b| {
        b.iter(|| engine.withdrawable_dividend_of(black_box(&h), &reg))
    });
}

fn bench_withdraw(c: &mut Criterion) {
    let (mut engine, reg) = populated();
    let payer = HolderId::from_label("payer");
    let h = HolderId::from_label("holder-999");
    let mut payout = NullPayout;

    c.bench_function("distribute_then_withdraw", |b| {
        b.iter(|| {
            engine.distribute_dividends(&payer, COIN, &reg).unwrap();
            let res = engine.withdraw_dividend(black_box(&h), &reg, &mut payout);
            engine.take_events();
            res
        })
    });
}

criterion_group!(
    benches,
    bench_distribute,
    bench_balance_change,
    bench_query,
    bench_withdraw
);
criterion_main!(benches);
