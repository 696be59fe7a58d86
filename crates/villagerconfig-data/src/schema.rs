//! Serde structs for data-pack files.
//!
//! Loot tables and item components deserialize straight into core types;
//! the files here need a conversion step before they reach the data source.

use serde::Deserialize;
use villagerconfig_core::condition::LootCondition;
use villagerconfig_core::enchant::Enchantment;
use villagerconfig_core::id::{HolderSet, ResourceLocation, TagMember};

// ===========================================================================
// Tags
// ===========================================================================

/// A `tags/<registry>/*.json` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagFile {
    #[serde(default)]
    pub replace: bool,
    #[serde(default)]
    pub values: Vec<TagValue>,
}

/// One tag value: `"minecraft:stone"`, `"#minecraft:logs"`, or the object
/// form with an explicit `required` flag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Plain(String),
    Entry {
        id: String,
        #[serde(default = "default_true")]
        required: bool,
    },
}

fn default_true() -> bool {
    true
}

impl TagValue {
    pub fn id(&self) -> &str {
        match self {
            TagValue::Plain(id) | TagValue::Entry { id, .. } => id,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            TagValue::Plain(_) => true,
            TagValue::Entry { required, .. } => *required,
        }
    }

    pub fn member(&self) -> TagMember {
        TagMember::parse(self.id())
    }
}

impl TagFile {
    /// Tag members in file order. Optional values are kept; a preview has no
    /// registry to check them against.
    pub fn members(&self) -> Vec<TagMember> {
        self.values.iter().map(TagValue::member).collect()
    }
}

// ===========================================================================
// Enchantments
// ===========================================================================

/// The subset of an `enchantment/*.json` definition that trade previews use.
/// Unknown fields (costs, effects, slots) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EnchantmentFile {
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub supported_items: Option<HolderSet>,
    #[serde(default)]
    pub exclusive_set: Option<HolderSet>,
}

fn default_max_level() -> u32 {
    1
}

fn default_weight() -> u32 {
    1
}

impl EnchantmentFile {
    pub fn into_enchantment(self, id: ResourceLocation) -> Enchantment {
        let mut enchantment = Enchantment::new(id, self.max_level).with_weight(self.weight);
        enchantment.supported_items = self.supported_items;
        enchantment.exclusive_set = self.exclusive_set;
        enchantment
    }
}

// ===========================================================================
// Predicates
// ===========================================================================

/// A `predicate/*.json` file: one condition, or a list that must all pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredicateFile {
    Single(LootCondition),
    List(Vec<LootCondition>),
}

impl PredicateFile {
    pub fn into_condition(self) -> LootCondition {
        match self {
            PredicateFile::Single(condition) => condition,
            PredicateFile::List(terms) => LootCondition::AllOf { terms },
        }
    }
}
