//! The VillagerConfig document model: tiers of groups of trades.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::loot::LootEntry;
use crate::number::NumberProvider;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VillagerConfigDocument {
    #[serde(default)]
    pub tiers: Vec<Tier>,
}

/// An experience-gated set of trade groups.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Tier {
    #[serde(default)]
    pub total_exp_required: u32,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A pool of trades from which `num_to_select` are drawn without replacement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Group {
    #[serde(default = "default_num_to_select")]
    pub num_to_select: NumberProvider,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

fn default_num_to_select() -> NumberProvider {
    NumberProvider::constant(2.0)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Trade {
    pub cost_a: LootEntry,
    #[serde(default)]
    pub cost_b: Option<LootEntry>,
    pub result: LootEntry,
    #[serde(default)]
    pub price_multiplier: Option<NumberProvider>,
    #[serde(default)]
    pub trader_exp: Option<NumberProvider>,
    #[serde(default)]
    pub max_uses: Option<NumberProvider>,
    /// Trade-local bindings for `villagerconfig:reference` providers.
    #[serde(default)]
    pub reference_providers: BTreeMap<String, NumberProvider>,
    #[serde(default)]
    pub reward_experience: Option<bool>,
}

impl Tier {
    pub fn new(total_exp_required: u32) -> Self {
        Self {
            total_exp_required,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }
}

impl Group {
    pub fn new(num_to_select: NumberProvider) -> Self {
        Self {
            num_to_select,
            trades: Vec::new(),
        }
    }

    pub fn with_trade(mut self, trade: Trade) -> Self {
        self.trades.push(trade);
        self
    }
}

impl Trade {
    pub fn new(cost_a: LootEntry, result: LootEntry) -> Self {
        Self {
            cost_a,
            cost_b: None,
            result,
            price_multiplier: None,
            trader_exp: None,
            max_uses: None,
            reference_providers: BTreeMap::new(),
            reward_experience: None,
        }
    }

    pub fn with_cost_b(mut self, cost_b: LootEntry) -> Self {
        self.cost_b = Some(cost_b);
        self
    }

    pub fn with_price_multiplier(mut self, provider: NumberProvider) -> Self {
        self.price_multiplier = Some(provider);
        self
    }

    pub fn with_max_uses(mut self, provider: NumberProvider) -> Self {
        self.max_uses = Some(provider);
        self
    }

    pub fn with_trader_exp(mut self, provider: NumberProvider) -> Self {
        self.trader_exp = Some(provider);
        self
    }

    pub fn with_reference(mut self, id: impl Into<String>, provider: NumberProvider) -> Self {
        self.reference_providers.insert(id.into(), provider);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_trade() {
        let trade: Trade = serde_json::from_value(json!({
            "cost_a": {"type": "item", "name": "emerald", "functions": [{"function": "set_count", "count": 5}]},
            "cost_b": {"type": "item", "name": "book"},
            "result": {"type": "item", "name": "enchanted_book"},
            "price_multiplier": 0.2,
            "trader_exp": {"min": 1, "max": 3},
            "max_uses": {"type": "villagerconfig:reference", "id": "uses"},
            "reference_providers": {"uses": 4},
            "reward_experience": false
        }))
        .unwrap();
        assert!(trade.cost_b.is_some());
        assert_eq!(trade.price_multiplier, Some(NumberProvider::constant(0.2)));
        assert_eq!(trade.reference_providers["uses"], NumberProvider::constant(4.0));
        assert_eq!(trade.reward_experience, Some(false));
    }

    #[test]
    fn group_defaults_to_two() {
        let group: Group = serde_json::from_value(json!({"trades": []})).unwrap();
        assert_eq!(group.num_to_select, NumberProvider::constant(2.0));
    }

    #[test]
    fn tier_defaults() {
        let doc: VillagerConfigDocument =
            serde_json::from_value(json!({"tiers": [{"groups": []}]})).unwrap();
        assert_eq!(doc.tiers[0].total_exp_required, 0);
    }

    #[test]
    fn trade_requires_cost_and_result() {
        let missing: Result<Trade, _> =
            serde_json::from_value(json!({"result": {"type": "item", "name": "emerald"}}));
        assert!(missing.is_err());
    }
}
