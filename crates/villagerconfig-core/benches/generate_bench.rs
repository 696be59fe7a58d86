//! Criterion benchmarks for trade generation.
//!
//! Two benchmark groups:
//! - `librarian`: the three-tier fixture with tags and enchantments
//! - `wide_group`: one group of 500 trades drawing 50, container mixer

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use villagerconfig_core::context::RuntimeContext;
use villagerconfig_core::mixer::StackMixer;
use villagerconfig_core::test_utils::*;
use villagerconfig_core::trade::{generate_for_seeds, generate_trades};

fn bench_librarian(c: &mut Criterion) {
    let doc = librarian();
    let data = librarian_data();
    let mut group = c.benchmark_group("librarian");

    for exp in [0u32, 15, 80] {
        let ctx = RuntimeContext::new(7).with_data(&data).with_accumulated_exp(exp);
        group.bench_function(format!("exp_{exp}"), |b| {
            b.iter(|| generate_trades(black_box(&doc), black_box(&ctx)))
        });
    }

    let ctx = RuntimeContext::default().with_data(&data);
    let seeds: Vec<i64> = (0..256).collect();
    group.bench_function("256_seeds", |b| {
        b.iter(|| generate_for_seeds(black_box(&doc), &ctx, black_box(&seeds)))
    });
    group.finish();
}

fn bench_wide_group(c: &mut Criterion) {
    let trades = (0..500)
        .map(|i| {
            trade(
                item_between("emerald", 1, 64),
                item(&format!("item_{i}"), (i % 64 + 1) as u32),
            )
        })
        .collect();
    let doc = single_group(50.0, trades);
    let ctx = RuntimeContext::new(1).with_stack_mixer(StackMixer::Container);

    c.bench_function("wide_group/500_pick_50", |b| {
        b.iter(|| generate_trades(black_box(&doc), black_box(&ctx)))
    });
}

criterion_group!(benches, bench_librarian, bench_wide_group);
criterion_main!(benches);
