//! Integration tests for trade generation.
//!
//! These tests run whole documents through the resolver: tier selection,
//! group sampling, loot resolution, references, stack mixing and
//! determinism.

use std::collections::BTreeMap;

use villagerconfig_core::context::{RuntimeContext, Weather};
use villagerconfig_core::document::VillagerConfigDocument;
use villagerconfig_core::error::{ExpansionKind, GenerationError};
use villagerconfig_core::loot::LootTable;
use villagerconfig_core::mixer::StackMixer;
use villagerconfig_core::number::NumberProvider;
use villagerconfig_core::source::InMemoryDataSource;
use villagerconfig_core::test_utils::*;
use villagerconfig_core::trade::{SkipReason, generate_for_seeds, generate_report, generate_trades};

fn doc(value: serde_json::Value) -> VillagerConfigDocument {
    serde_json::from_value(value).unwrap()
}

// ===========================================================================
// Determinism
// ===========================================================================

#[test]
fn same_seed_same_trades() {
    let doc = librarian();
    let data = librarian_data();
    for seed in [0, 1, 42, -9_000_000_000] {
        let ctx = RuntimeContext::new(seed).with_data(&data).with_accumulated_exp(80);
        let first = generate_trades(&doc, &ctx).unwrap();
        let second = generate_trades(&doc, &ctx).unwrap();
        assert_eq!(first, second, "seed {seed}");
    }
}

#[test]
fn emerald_scenario_is_deterministic() {
    let doc = emerald_scenario();
    let mut results = BTreeMap::new();
    for seed in 0..64 {
        let ctx = RuntimeContext::new(seed);
        let trades = generate_trades(&doc, &ctx).unwrap();
        assert_eq!(trades.len(), 1);
        assert!(trades[0].cost_a.id.is("emerald"));
        let result = trades[0].result.id.path().to_string();
        assert!(result == "diamond" || result == "iron_ingot");
        assert_eq!(generate_trades(&doc, &ctx).unwrap(), trades);
        *results.entry(result).or_insert(0) += 1;
    }
    // Both offers show up across seeds.
    assert_eq!(results.len(), 2);
}

#[test]
fn batch_generation_matches_single_calls() {
    let doc = librarian();
    let data = librarian_data();
    let ctx = RuntimeContext::default().with_data(&data).with_accumulated_exp(15);
    let seeds: Vec<i64> = (0..16).collect();
    let batch = generate_for_seeds(&doc, &ctx, &seeds);
    assert_eq!(batch.len(), seeds.len());
    for (seed, result) in seeds.iter().zip(batch) {
        assert_eq!(result, generate_trades(&doc, &ctx.clone().with_seed(*seed)));
    }
}

// ===========================================================================
// Tiers and groups
// ===========================================================================

#[test]
fn experience_selects_tier() {
    let doc = doc(serde_json::json!({
        "tiers": [
            {"total_exp_required": 0, "groups": [{"num_to_select": 1, "trades": [
                {"cost_a": {"type": "item", "name": "emerald"}, "result": {"type": "item", "name": "stick"}}
            ]}]},
            {"total_exp_required": 10, "groups": [{"num_to_select": 1, "trades": [
                {"cost_a": {"type": "item", "name": "emerald"}, "result": {"type": "item", "name": "arrow"}}
            ]}]},
            {"total_exp_required": 50, "groups": [{"num_to_select": 1, "trades": [
                {"cost_a": {"type": "item", "name": "emerald"}, "result": {"type": "item", "name": "bow"}}
            ]}]}
        ]
    }));
    let result_at = |exp| {
        let report = generate_report(&doc, &RuntimeContext::default().with_accumulated_exp(exp)).unwrap();
        (report.tier, report.trades[0].result.id.path().to_string())
    };
    assert_eq!(result_at(7), (0, "stick".to_string()));
    assert_eq!(result_at(55), (2, "bow".to_string()));
}

#[test]
fn every_group_contributes() {
    let doc = librarian();
    let data = librarian_data();
    let ctx = RuntimeContext::new(3).with_data(&data);
    let report = generate_report(&doc, &ctx).unwrap();
    assert_eq!(report.tier, 0);
    assert_eq!(report.trades.len(), 2);
    assert!(report.skipped.is_empty());
}

#[test]
fn sampled_trades_keep_document_order() {
    let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let trades = names.iter().map(|n| trade(item("emerald", 1), item(n, 1))).collect();
    let doc = single_group(4.0, trades);
    for seed in 0..30 {
        let picked: Vec<String> = generate_trades(&doc, &RuntimeContext::new(seed))
            .unwrap()
            .into_iter()
            .map(|t| t.result.id.path().to_string())
            .collect();
        assert_eq!(picked.len(), 4);
        let mut sorted = picked.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(picked, sorted, "seed {seed}");
    }
}

// ===========================================================================
// Numbers and references
// ===========================================================================

#[test]
fn price_multiplier_halves_cost() {
    let mut t = trade(item("emerald", 10), item("diamond", 1));
    t.price_multiplier = Some(NumberProvider::constant(0.5));
    let doc = single_group(1.0, vec![t]);
    let trades = generate_trades(&doc, &RuntimeContext::default()).unwrap();
    assert_eq!(trades[0].cost_a.count, 5);
}

#[test]
fn trade_reference_sets_max_uses() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {"type": "item", "name": "emerald"},
            "result": {"type": "item", "name": "bread"},
            "reference_providers": {"x": 4},
            "max_uses": {"type": "villagerconfig:reference", "id": "x"}
        }]}]}]
    }));
    let trades = generate_trades(&doc, &RuntimeContext::default()).unwrap();
    assert_eq!(trades[0].max_uses, 4);
}

#[test]
fn unresolved_reference_drops_only_its_trade() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 2, "trades": [
            {
                "cost_a": {"type": "item", "name": "emerald"},
                "result": {"type": "item", "name": "bread"},
                "max_uses": {"type": "villagerconfig:reference", "id": "y"}
            },
            {
                "cost_a": {"type": "item", "name": "emerald"},
                "result": {"type": "item", "name": "cake"}
            }
        ]}]}]
    }));
    let report = generate_report(&doc, &RuntimeContext::default()).unwrap();
    assert_eq!(report.trades.len(), 1);
    assert!(report.trades[0].result.id.is("cake"));
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(
        report.skipped[0].reason,
        SkipReason::Failed(GenerationError::UnresolvedReference { id: "y".into() })
    );
}

#[test]
fn memoized_reference_is_shared_within_a_trade() {
    let doc = librarian();
    for seed in 0..20 {
        let ctx = RuntimeContext::new(seed).with_accumulated_exp(100);
        let trades = generate_trades(&doc, &ctx).unwrap();
        let t = &trades[0];
        assert_eq!(t.cost_a.count, t.max_uses, "seed {seed}");
        assert!((10..=15).contains(&t.max_uses));
        assert!(t.result.components.dyed_color.is_some());
    }
}

#[test]
fn number_provider_folds() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {"type": "item", "name": "emerald"},
            "result": {"type": "item", "name": "bread"},
            "max_uses": {"type": "villagerconfig:add", "addends": [2, 3]},
            "trader_exp": {"type": "villagerconfig:multiply", "factors": [2, 3]}
        }]}]}]
    }));
    let trades = generate_trades(&doc, &RuntimeContext::default()).unwrap();
    assert_eq!((trades[0].max_uses, trades[0].trader_exp), (5, 6));
}

// ===========================================================================
// Loot resolution inside trades
// ===========================================================================

#[test]
fn expanded_tag_picks_each_member_eventually() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {"type": "item", "name": "emerald"},
            "result": {"type": "tag", "name": "minecraft:lanterns", "expand": true}
        }]}]}]
    }));
    let data = librarian_data();
    let mut seen = BTreeMap::new();
    for seed in 0..200 {
        let ctx = RuntimeContext::new(seed).with_data(&data);
        let trades = generate_trades(&doc, &ctx).unwrap();
        assert_eq!(trades.len(), 1);
        *seen.entry(trades[0].result.id.path().to_string()).or_insert(0) += 1;
    }
    assert_eq!(seen.keys().collect::<Vec<_>>(), ["lantern", "soul_lantern"]);
}

#[test]
fn tag_without_data_source_drops_trade() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {"type": "item", "name": "emerald"},
            "result": {"type": "tag", "name": "minecraft:lanterns", "expand": true}
        }]}]}]
    }));
    let report = generate_report(&doc, &RuntimeContext::default()).unwrap();
    assert!(report.trades.is_empty());
    assert_eq!(report.skipped[0].reason, SkipReason::EmptyResult);
}

#[test]
fn branching_cycles_skip_the_trade_quickly() {
    let looping: LootTable = serde_json::from_value(serde_json::json!({
        "pools": [{"rolls": 2, "entries": [{"type": "loot_table", "name": "loop"}]}]
    }))
    .unwrap();
    let data = InMemoryDataSource::new()
        .with_loot_table("loop", looping)
        .with_item_tag("a", ["#a", "#b"])
        .with_item_tag("b", ["#a", "#b"]);
    let ctx = RuntimeContext::new(4).with_data(&data);

    for (cost, kind) in [
        (serde_json::json!({"type": "loot_table", "name": "loop"}), ExpansionKind::LootTable),
        (serde_json::json!({"type": "tag", "name": "a", "expand": true}), ExpansionKind::ItemTag),
    ] {
        let doc = doc(serde_json::json!({
            "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
                "cost_a": cost,
                "result": {"type": "item", "name": "emerald"}
            }]}]}]
        }));
        let report = generate_report(&doc, &ctx).unwrap();
        assert!(report.trades.is_empty());
        assert_eq!(report.skipped[0].reason, SkipReason::EmptyCost);
        assert!(!report.diagnostics.is_empty());
        assert!(report.diagnostics.iter().all(|e| matches!(
            e,
            GenerationError::RecursionLimitExceeded { kind: k, .. } if *k == kind
        )));
    }
}

#[test]
fn enchanted_book_uses_tag_options() {
    let doc = librarian();
    let data = librarian_data();
    let mut found = 0;
    for seed in 0..40 {
        let ctx = RuntimeContext::new(seed).with_data(&data);
        for t in generate_trades(&doc, &ctx).unwrap() {
            if t.result.id.is("enchanted_book") {
                found += 1;
                let stored = &t.result.components.stored_enchantments;
                assert_eq!(stored.len(), 1);
                let (id, level) = stored.iter().next().unwrap();
                assert!(["mending", "unbreaking", "efficiency"].contains(&id.path()));
                assert!(*level >= 1);
                assert!(t.cost_b.as_ref().is_some_and(|b| b.id.is("book")));
                // 0.2 multiplier on 5..=20 emeralds.
                assert!((1..=4).contains(&t.cost_a.count));
            }
        }
    }
    assert!(found > 0);
}

#[test]
fn weather_gates_entries() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {"type": "item", "name": "emerald"},
            "result": {
                "type": "alternatives",
                "children": [
                    {"type": "item", "name": "trident", "conditions": [{"condition": "weather_check", "thundering": true}]},
                    {"type": "item", "name": "fishing_rod"}
                ]
            }
        }]}]}]
    }));
    let clear = generate_trades(&doc, &RuntimeContext::default()).unwrap();
    let storm = generate_trades(&doc, &RuntimeContext::default().with_weather(Weather::Thunder)).unwrap();
    assert!(clear[0].result.id.is("fishing_rod"));
    assert!(storm[0].result.id.is("trident"));
}

#[test]
fn container_mixer_merges_before_taking_first_stack() {
    let doc = doc(serde_json::json!({
        "tiers": [{"groups": [{"num_to_select": 1, "trades": [{
            "cost_a": {
                "type": "group",
                "children": [
                    {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": 3}]},
                    {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": 4}]}
                ]
            },
            "result": {"type": "item", "name": "bread"}
        }]}]}]
    }));
    let default = generate_trades(&doc, &RuntimeContext::default()).unwrap();
    assert_eq!(default[0].cost_a.count, 3);

    let container =
        generate_trades(&doc, &RuntimeContext::default().with_stack_mixer(StackMixer::Container)).unwrap();
    assert_eq!(container[0].cost_a.count, 7);
}

#[test]
fn empty_document_is_an_error() {
    let doc = VillagerConfigDocument::default();
    assert_eq!(
        generate_trades(&doc, &RuntimeContext::default()),
        Err(GenerationError::EmptyDocument)
    );
}

#[test]
fn resolved_trade_serializes() {
    let doc = emerald_scenario();
    let trades = generate_trades(&doc, &RuntimeContext::new(1)).unwrap();
    let json = serde_json::to_value(&trades).unwrap();
    assert_eq!(json[0]["cost_a"]["id"], "minecraft:emerald");
    assert_eq!(json[0]["max_uses"], 12);
    assert!(json[0].get("cost_b").is_none());
}
