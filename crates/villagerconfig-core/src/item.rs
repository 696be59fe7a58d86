use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{ResourceLocation, TagMember};

/// Raw item component data keyed by component id (e.g. `minecraft:max_stack_size`).
pub type ComponentMap = BTreeMap<String, Value>;

/// Stack size used when an item's components are unknown.
pub const DEFAULT_MAX_STACK_SIZE: u32 = 64;

/// Components a loot function can set on a stack.
///
/// The typed fields cover what the preview renders. Anything else set via
/// `set_components` lands in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemComponents {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enchantments: BTreeMap<ResourceLocation, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stored_enchantments: BTreeMap<ResourceLocation, u32>,
    /// Fraction of durability remaining, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dyed_color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potion: Option<ResourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_model_data: Option<f64>,
    /// A concrete instrument, or the tag it is drawn from in game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<TagMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_destination: Option<ResourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_decoration: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: ComponentMap,
}

impl ItemComponents {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A concrete item stack produced by loot resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ResourceLocation,
    pub count: u32,
    #[serde(default, skip_serializing_if = "ItemComponents::is_empty")]
    pub components: ItemComponents,
}

impl ItemStack {
    pub fn new(id: impl Into<ResourceLocation>, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
            components: ItemComponents::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_book(&self) -> bool {
        self.id.is("book") || self.id.is("enchanted_book")
    }

    /// Add or replace an enchantment.
    ///
    /// A plain book turns into an enchanted book; enchanted books keep their
    /// enchantments in `stored_enchantments`.
    pub fn enchant(&mut self, enchantment: ResourceLocation, level: u32) {
        if self.id.is("book") {
            self.id = ResourceLocation::new("enchanted_book");
        }
        if self.id.is("enchanted_book") {
            self.components.stored_enchantments.insert(enchantment, level);
        } else {
            self.components.enchantments.insert(enchantment, level);
        }
    }

    pub fn remove_enchantment(&mut self, enchantment: &ResourceLocation) {
        self.components.enchantments.remove(enchantment);
        self.components.stored_enchantments.remove(enchantment);
    }

    /// Every enchantment on the stack, applied or stored.
    pub fn enchantments(&self) -> impl Iterator<Item = (&ResourceLocation, u32)> {
        self.components
            .enchantments
            .iter()
            .chain(self.components.stored_enchantments.iter())
            .map(|(id, level)| (id, *level))
    }

    pub fn enchantment_level(&self, enchantment: &ResourceLocation) -> Option<u32> {
        self.components
            .enchantments
            .get(enchantment)
            .or_else(|| self.components.stored_enchantments.get(enchantment))
            .copied()
    }

    /// Same item with identical components; such stacks may be merged.
    pub fn stacks_with(&self, other: &ItemStack) -> bool {
        self.id == other.id && self.components == other.components
    }
}

/// Read an integer component such as `minecraft:max_stack_size`.
pub fn int_component(components: &ComponentMap, key: &str) -> Option<i64> {
    let key = ResourceLocation::new(key);
    components
        .get(key.as_str())
        .or_else(|| components.get(key.path()))
        .and_then(Value::as_i64)
}
