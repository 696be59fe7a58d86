//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use serde_json::{Value, json};

use crate::data_loader::load_document_json;
use crate::document::{Group, Tier, Trade, VillagerConfigDocument};
use crate::enchant::Enchantment;
use crate::function::{FunctionKind, LootFunction};
use crate::id::HolderSet;
use crate::loot::LootEntry;
use crate::number::NumberProvider;
use crate::source::InMemoryDataSource;

// ===========================================================================
// Entry constructors
// ===========================================================================

/// An item entry with a fixed count.
pub fn item(name: &str, count: u32) -> LootEntry {
    LootEntry::item(name).with_function(LootFunction::new(FunctionKind::SetCount {
        count: NumberProvider::constant(count as f64),
        add: false,
    }))
}

/// An item entry whose count is uniform in `[min, max]`.
pub fn item_between(name: &str, min: u32, max: u32) -> LootEntry {
    LootEntry::item(name).with_function(LootFunction::new(FunctionKind::SetCount {
        count: NumberProvider::uniform(min as f64, max as f64),
        add: false,
    }))
}

pub fn trade(cost: LootEntry, result: LootEntry) -> Trade {
    Trade::new(cost, result)
}

/// A single-tier document with one group.
pub fn single_group(num_to_select: f64, trades: Vec<Trade>) -> VillagerConfigDocument {
    let mut group = Group::new(NumberProvider::constant(num_to_select));
    group.trades = trades;
    VillagerConfigDocument {
        tiers: vec![Tier::new(0).with_group(group)],
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

/// Emerald for diamond or emerald for iron, one trade per generation.
pub fn emerald_scenario() -> VillagerConfigDocument {
    single_group(
        1.0,
        vec![
            trade(item("emerald", 1), item("diamond", 1)),
            trade(item("emerald", 1), item("iron_ingot", 1)),
        ],
    )
}

/// A three-tier librarian-style document exercising most entry and
/// function types.
pub fn librarian_json() -> Value {
    json!({
        "tiers": [
            {
                "total_exp_required": 0,
                "groups": [{
                    "num_to_select": 2,
                    "trades": [
                        {
                            "cost_a": {"type": "item", "name": "paper", "functions": [{"function": "set_count", "count": 24}]},
                            "result": {"type": "item", "name": "emerald"}
                        },
                        {
                            "cost_a": {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": {"min": 5, "max": 20}}]},
                            "cost_b": {"type": "item", "name": "book"},
                            "result": {
                                "type": "item",
                                "name": "book",
                                "functions": [{"function": "enchant_randomly", "options": "#minecraft:tradeable"}]
                            },
                            "max_uses": 12,
                            "trader_exp": 1,
                            "price_multiplier": 0.2
                        },
                        {
                            "cost_a": {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": 9}]},
                            "result": {"type": "item", "name": "bookshelf"}
                        }
                    ]
                }]
            },
            {
                "total_exp_required": 10,
                "groups": [{
                    "num_to_select": 2,
                    "trades": [
                        {
                            "cost_a": {"type": "item", "name": "book", "functions": [{"function": "set_count", "count": 4}]},
                            "result": {"type": "item", "name": "emerald"},
                            "trader_exp": 10
                        },
                        {
                            "cost_a": {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": 1}]},
                            "result": {"type": "tag", "name": "minecraft:lanterns", "expand": true}
                        }
                    ]
                }]
            },
            {
                "total_exp_required": 70,
                "groups": [{
                    "num_to_select": 1,
                    "trades": [{
                        "cost_a": {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": {"type": "villagerconfig:reference", "id": "price"}}]},
                        "result": {"type": "item", "name": "leather_chestplate", "functions": [{"function": "villagerconfig:set_dye"}]},
                        "reference_providers": {"price": {"type": "villagerconfig:add", "addends": [10, {"min": 0, "max": 5}]}},
                        "max_uses": {"type": "villagerconfig:reference", "id": "price"}
                    }]
                }]
            }
        ]
    })
}

pub fn librarian() -> VillagerConfigDocument {
    match load_document_json(&librarian_json().to_string()) {
        Ok(doc) => doc,
        Err(error) => panic!("librarian fixture does not parse: {error}"),
    }
}

/// Tags and enchantments the librarian fixture refers to.
pub fn librarian_data() -> InMemoryDataSource {
    InMemoryDataSource::new()
        .with_item_tag("lanterns", ["lantern", "soul_lantern"])
        .with_enchantment_tag("tradeable", ["mending", "unbreaking", "efficiency"])
        .with_enchantment(Enchantment::new("mending", 1).with_weight(2))
        .with_enchantment(Enchantment::new("unbreaking", 3).with_weight(5))
        .with_enchantment(
            Enchantment::new("efficiency", 5)
                .with_weight(10)
                .with_supported_items(HolderSet::Tag("minecraft:enchantable/mining".into())),
        )
        .with_item_tag("enchantable/mining", ["iron_pickaxe", "diamond_pickaxe"])
}
