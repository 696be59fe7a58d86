//! Loot functions: in-order mutations applied to resolved stacks.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::condition::{IntRange, LootCondition, all_pass};
use crate::dye::{DyeColor, mix_colors, random_dyes};
use crate::enchant;
use crate::error::GenerationError;
use crate::id::{HolderSet, ResourceLocation, TagMember};
use crate::item::{ComponentMap, ItemStack, int_component};
use crate::number::{NumberProvider, evaluate, evaluate_int};
use crate::rng::TradeRng;
use crate::scope::Scope;

/// A function plus the conditions that gate it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootFunction {
    #[serde(flatten)]
    pub kind: FunctionKind,
    #[serde(default)]
    pub conditions: Vec<LootCondition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "function")]
pub enum FunctionKind {
    #[serde(rename = "minecraft:set_count", alias = "set_count")]
    SetCount {
        count: NumberProvider,
        #[serde(default)]
        add: bool,
    },

    #[serde(rename = "minecraft:limit_count", alias = "limit_count")]
    LimitCount { limit: IntRange },

    #[serde(rename = "minecraft:set_damage", alias = "set_damage")]
    SetDamage {
        damage: NumberProvider,
        #[serde(default)]
        add: bool,
    },

    #[serde(rename = "minecraft:set_enchantments", alias = "set_enchantments")]
    SetEnchantments {
        enchantments: BTreeMap<ResourceLocation, NumberProvider>,
        #[serde(default)]
        add: bool,
    },

    #[serde(rename = "minecraft:enchant_randomly", alias = "enchant_randomly")]
    EnchantRandomly {
        #[serde(default, alias = "enchantments")]
        options: Option<HolderSet>,
        #[serde(default = "default_true")]
        only_compatible: bool,
    },

    #[serde(rename = "minecraft:enchant_with_levels", alias = "enchant_with_levels")]
    EnchantWithLevels {
        levels: NumberProvider,
        #[serde(default)]
        options: Option<HolderSet>,
    },

    #[serde(rename = "villagerconfig:enchant_randomly")]
    EnchantRandomlyBounded {
        #[serde(default)]
        include: Option<HolderSet>,
        #[serde(default)]
        exclude: Option<HolderSet>,
        #[serde(default)]
        min_level: Option<i64>,
        #[serde(default)]
        max_level: Option<i64>,
    },

    #[serde(rename = "villagerconfig:set_dye")]
    SetDye {
        #[serde(default)]
        dye_colors: Vec<String>,
        #[serde(default)]
        add: bool,
    },

    #[serde(rename = "minecraft:set_name", alias = "set_name")]
    SetName {
        #[serde(default)]
        name: Option<Value>,
        #[serde(default)]
        target: NameTarget,
    },

    #[serde(rename = "minecraft:set_lore", alias = "set_lore")]
    SetLore {
        #[serde(default)]
        lore: Vec<Value>,
        #[serde(default)]
        mode: Option<ListOperation>,
        #[serde(default)]
        offset: Option<usize>,
        #[serde(default)]
        size: Option<usize>,
        /// Pre-1.21 form of `mode: replace_all`.
        #[serde(default)]
        replace: bool,
    },

    #[serde(rename = "minecraft:set_potion", alias = "set_potion")]
    SetPotion { id: ResourceLocation },

    #[serde(
        rename = "minecraft:set_custom_data",
        alias = "set_custom_data",
        alias = "minecraft:set_nbt",
        alias = "set_nbt"
    )]
    SetCustomData { tag: Value },

    #[serde(rename = "minecraft:set_components", alias = "set_components")]
    SetComponents { components: ComponentMap },

    #[serde(rename = "minecraft:set_custom_model_data", alias = "set_custom_model_data")]
    SetCustomModelData { value: NumberProvider },

    #[serde(rename = "minecraft:set_item", alias = "set_item")]
    SetItem { item: ResourceLocation },

    #[serde(rename = "minecraft:set_instrument", alias = "set_instrument")]
    SetInstrument { options: HolderSet },

    #[serde(rename = "minecraft:set_stew_effect", alias = "set_stew_effect")]
    SetStewEffect {
        #[serde(default)]
        effects: Vec<StewEffect>,
    },

    #[serde(rename = "minecraft:exploration_map", alias = "exploration_map")]
    ExplorationMap {
        #[serde(default)]
        destination: Option<ResourceLocation>,
        #[serde(default)]
        decoration: Option<String>,
    },

    /// Functions that need world state or only touch data the preview does
    /// not render.
    #[serde(other)]
    Unsupported,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameTarget {
    #[default]
    CustomName,
    ItemName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOperation {
    ReplaceAll,
    ReplaceSection,
    Insert,
    Append,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StewEffect {
    #[serde(rename = "type")]
    pub effect: ResourceLocation,
    pub duration: NumberProvider,
}

/// Structure searched for when an exploration map names none.
const DEFAULT_MAP_DESTINATION: &str = "minecraft:on_treasure_maps";

impl LootFunction {
    pub fn new(kind: FunctionKind) -> Self {
        Self {
            kind,
            conditions: Vec::new(),
        }
    }

    /// Apply the function if its conditions pass; otherwise leave the stack
    /// untouched.
    pub fn apply(
        &self,
        stack: &mut ItemStack,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<(), GenerationError> {
        if !all_pass(&self.conditions, rng, scope)? {
            return Ok(());
        }
        self.kind.apply(stack, rng, scope)
    }
}

/// Apply each function in order.
pub fn apply_all(
    functions: &[LootFunction],
    stack: &mut ItemStack,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<(), GenerationError> {
    for function in functions {
        function.apply(stack, rng, scope)?;
    }
    Ok(())
}

fn to_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

impl FunctionKind {
    fn apply(
        &self,
        stack: &mut ItemStack,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<(), GenerationError> {
        match self {
            FunctionKind::SetCount { count, add } => {
                let count = evaluate_int(count, rng, scope)?;
                let base = if *add { stack.count as i64 } else { 0 };
                stack.count = to_count(base.saturating_add(count));
            }
            FunctionKind::LimitCount { limit } => {
                stack.count = to_count(limit.clamp(stack.count as i64, rng, scope)?);
            }
            FunctionKind::SetDamage { damage, add } => {
                let damageable = scope
                    .data()
                    .and_then(|data| data.item_components(&stack.id))
                    .is_none_or(|components| int_component(&components, "max_damage").is_some());
                let damage = evaluate(damage, rng, scope)?;
                if damageable {
                    let base = if *add {
                        stack.components.damage.unwrap_or(1.0)
                    } else {
                        0.0
                    };
                    stack.components.damage = Some((base + damage).clamp(0.0, 1.0));
                }
            }
            FunctionKind::SetEnchantments { enchantments, add } => {
                for (id, level) in enchantments {
                    let mut level = evaluate_int(level, rng, scope)?;
                    if *add {
                        level += stack.enchantment_level(id).unwrap_or(0) as i64;
                    }
                    if level <= 0 {
                        stack.remove_enchantment(id);
                    } else {
                        stack.enchant(id.clone(), to_count(level));
                    }
                }
            }
            FunctionKind::EnchantRandomly {
                options,
                only_compatible,
            } => enchant::enchant_randomly(stack, options.as_ref(), *only_compatible, rng, scope),
            FunctionKind::EnchantWithLevels { levels, options } => {
                let levels = evaluate_int(levels, rng, scope)?;
                enchant::enchant_with_levels(stack, levels, options.as_ref(), rng, scope);
            }
            FunctionKind::EnchantRandomlyBounded {
                include,
                exclude,
                min_level,
                max_level,
            } => enchant::enchant_randomly_bounded(
                stack,
                include.as_ref(),
                exclude.as_ref(),
                *min_level,
                *max_level,
                rng,
                scope,
            ),
            FunctionKind::SetDye { dye_colors, add } => {
                let mut dyes = Vec::with_capacity(dye_colors.len());
                for name in dye_colors {
                    match name.parse::<DyeColor>() {
                        Ok(dye) => dyes.push(dye),
                        Err(error) => tracing::debug!(%error, "skipping dye"),
                    }
                }
                if dye_colors.is_empty() {
                    dyes = random_dyes(rng);
                } else if dyes.is_empty() {
                    return Ok(());
                }
                let base = if *add { stack.components.dyed_color } else { None };
                stack.components.dyed_color = mix_colors(base, &dyes);
            }
            FunctionKind::SetName { name, target } => {
                let slot = match target {
                    NameTarget::CustomName => &mut stack.components.custom_name,
                    NameTarget::ItemName => &mut stack.components.item_name,
                };
                *slot = name.clone();
            }
            FunctionKind::SetLore {
                lore,
                mode,
                offset,
                size,
                replace,
            } => {
                let mode = mode.unwrap_or(if *replace {
                    ListOperation::ReplaceAll
                } else {
                    ListOperation::Append
                });
                apply_list_operation(&mut stack.components.lore, lore, mode, *offset, *size);
            }
            FunctionKind::SetPotion { id } => {
                stack.components.potion = Some(id.clone());
            }
            FunctionKind::SetCustomData { tag } => {
                stack.components.custom_data = Some(tag.clone());
            }
            FunctionKind::SetComponents { components } => {
                for (key, value) in components {
                    set_component(stack, key, value);
                }
            }
            FunctionKind::SetCustomModelData { value } => {
                stack.components.custom_model_data = Some(evaluate(value, rng, scope)?);
            }
            FunctionKind::SetItem { item } => {
                stack.id = item.clone();
            }
            FunctionKind::SetInstrument { options } => {
                stack.components.instrument = match options {
                    HolderSet::Tag(tag) => Some(TagMember::Tag(tag.clone())),
                    HolderSet::List(ids) if ids.is_empty() => None,
                    HolderSet::List(ids) => {
                        let index = rng.next_below(ids.len() as u64) as usize;
                        Some(TagMember::Element(ids[index].clone()))
                    }
                };
            }
            FunctionKind::SetStewEffect { effects } => {
                if effects.is_empty() {
                    return Ok(());
                }
                let chosen = &effects[rng.next_below(effects.len() as u64) as usize];
                let duration = evaluate_int(&chosen.duration, rng, scope)?;
                stack.components.other.insert(
                    "minecraft:suspicious_stew_effects".to_string(),
                    serde_json::json!([{ "id": chosen.effect, "duration": duration }]),
                );
            }
            FunctionKind::ExplorationMap {
                destination,
                decoration,
            } => {
                if stack.id.is("map") {
                    stack.id = ResourceLocation::new("filled_map");
                    stack.components.map_destination = Some(
                        destination
                            .clone()
                            .unwrap_or_else(|| ResourceLocation::new(DEFAULT_MAP_DESTINATION)),
                    );
                    stack.components.map_decoration = decoration.clone();
                }
            }
            FunctionKind::Unsupported => {
                tracing::debug!(item = %stack.id, "loot function has no effect in preview");
            }
        }
        Ok(())
    }
}

fn apply_list_operation(
    current: &mut Vec<Value>,
    values: &[Value],
    mode: ListOperation,
    offset: Option<usize>,
    size: Option<usize>,
) {
    match mode {
        ListOperation::ReplaceAll => *current = values.to_vec(),
        ListOperation::Append => current.extend_from_slice(values),
        ListOperation::Insert => {
            let at = offset.unwrap_or(0).min(current.len());
            current.splice(at..at, values.iter().cloned());
        }
        ListOperation::ReplaceSection => {
            let start = offset.unwrap_or(0).min(current.len());
            let end = start
                .saturating_add(size.unwrap_or(values.len()))
                .min(current.len());
            current.splice(start..end, values.iter().cloned());
        }
    }
}

/// Write one entry of a `set_components` patch. A `!` prefix removes.
fn set_component(stack: &mut ItemStack, key: &str, value: &Value) {
    let (remove, raw) = match key.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, key),
    };
    let id = ResourceLocation::new(raw);
    let components = &mut stack.components;
    match id.as_str() {
        "minecraft:custom_name" => components.custom_name = (!remove).then(|| value.clone()),
        "minecraft:item_name" => components.item_name = (!remove).then(|| value.clone()),
        "minecraft:custom_data" => components.custom_data = (!remove).then(|| value.clone()),
        "minecraft:lore" => {
            components.lore = match value {
                Value::Array(lines) if !remove => lines.clone(),
                _ => Vec::new(),
            }
        }
        "minecraft:dyed_color" => {
            let rgb = value
                .as_u64()
                .or_else(|| value.get("rgb").and_then(Value::as_u64));
            components.dyed_color = if remove { None } else { rgb.map(|c| c as u32) };
        }
        _ => {
            if remove {
                components.other.remove(id.as_str());
            } else {
                components.other.insert(id.into(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuntimeContext;
    use crate::source::InMemoryDataSource;
    use serde_json::json;

    fn function(value: Value) -> LootFunction {
        serde_json::from_value(value).unwrap()
    }

    fn run(function: &LootFunction, stack: &mut ItemStack, ctx: &RuntimeContext<'_>) {
        let mut scope = Scope::new(ctx);
        function.apply(stack, &mut TradeRng::new(17), &mut scope).unwrap();
    }

    #[test]
    fn set_count_replaces_or_adds() {
        let ctx = RuntimeContext::default();
        let mut stack = ItemStack::new("emerald", 3);
        run(&function(json!({"function": "set_count", "count": 5})), &mut stack, &ctx);
        assert_eq!(stack.count, 5);
        run(&function(json!({"function": "set_count", "count": 2, "add": true})), &mut stack, &ctx);
        assert_eq!(stack.count, 7);
        run(&function(json!({"function": "set_count", "count": -4})), &mut stack, &ctx);
        assert_eq!(stack.count, 0);
    }

    #[test]
    fn limit_count_clamps() {
        let ctx = RuntimeContext::default();
        let mut stack = ItemStack::new("emerald", 40);
        run(&function(json!({"function": "limit_count", "limit": {"max": 16}})), &mut stack, &ctx);
        assert_eq!(stack.count, 16);
    }

    #[test]
    fn failing_condition_skips_function() {
        let ctx = RuntimeContext::default();
        let mut stack = ItemStack::new("emerald", 1);
        let f = function(json!({
            "function": "minecraft:set_count",
            "count": 9,
            "conditions": [{"condition": "minecraft:killed_by_player"}]
        }));
        run(&f, &mut stack, &ctx);
        assert_eq!(stack.count, 1);
    }

    #[test]
    fn set_damage_clamps_and_respects_components() {
        let mut sword_components = ComponentMap::new();
        sword_components.insert("minecraft:max_damage".into(), json!(250));
        let data = InMemoryDataSource::new()
            .with_item_components("iron_sword", sword_components)
            .with_item_components("emerald", ComponentMap::new());
        let ctx = RuntimeContext::default().with_data(&data);

        let f = function(json!({"function": "set_damage", "damage": 1.5}));
        let mut sword = ItemStack::new("iron_sword", 1);
        run(&f, &mut sword, &ctx);
        assert_eq!(sword.components.damage, Some(1.0));

        let mut gem = ItemStack::new("emerald", 1);
        run(&f, &mut gem, &ctx);
        assert_eq!(gem.components.damage, None);
    }

    #[test]
    fn set_enchantments_on_book() {
        let ctx = RuntimeContext::default();
        let mut book = ItemStack::new("book", 1);
        let f = function(json!({
            "function": "set_enchantments",
            "enchantments": {"mending": 1, "minecraft:unbreaking": 3}
        }));
        run(&f, &mut book, &ctx);
        assert!(book.id.is("enchanted_book"));
        assert_eq!(book.enchantment_level(&"unbreaking".into()), Some(3));

        let remove = function(json!({
            "function": "set_enchantments",
            "enchantments": {"mending": -1},
            "add": true
        }));
        run(&remove, &mut book, &ctx);
        assert_eq!(book.enchantment_level(&"mending".into()), None);
    }

    #[test]
    fn enchantments_alias_for_options() {
        let f = function(json!({"function": "enchant_randomly", "enchantments": ["mending"]}));
        assert!(matches!(
            f.kind,
            FunctionKind::EnchantRandomly { options: Some(_), only_compatible: true }
        ));
    }

    #[test]
    fn set_dye_mixes_listed_colours() {
        let ctx = RuntimeContext::default();
        let mut armour = ItemStack::new("leather_chestplate", 1);
        let f = function(json!({"function": "villagerconfig:set_dye", "dye_colors": ["red"]}));
        run(&f, &mut armour, &ctx);
        assert_eq!(armour.components.dyed_color, Some(DyeColor::Red.rgb()));
    }

    #[test]
    fn set_dye_without_colours_is_random() {
        let ctx = RuntimeContext::default();
        let mut armour = ItemStack::new("leather_boots", 1);
        run(&function(json!({"function": "villagerconfig:set_dye"})), &mut armour, &ctx);
        assert!(armour.components.dyed_color.is_some());
    }

    #[test]
    fn set_dye_with_only_unknown_colours_keeps_existing_dye() {
        let ctx = RuntimeContext::default();
        let mut armour = ItemStack::new("leather_helmet", 1);
        armour.components.dyed_color = Some(DyeColor::Blue.rgb());
        let f = function(json!({"function": "villagerconfig:set_dye", "dye_colors": ["mauve"]}));
        run(&f, &mut armour, &ctx);
        assert_eq!(armour.components.dyed_color, Some(DyeColor::Blue.rgb()));
    }

    #[test]
    fn set_name_targets() {
        let ctx = RuntimeContext::default();
        let mut stack = ItemStack::new("paper", 1);
        run(&function(json!({"function": "set_name", "name": "Deed"})), &mut stack, &ctx);
        run(
            &function(json!({"function": "set_name", "name": "Paper", "target": "item_name"})),
            &mut stack,
            &ctx,
        );
        assert_eq!(stack.components.custom_name, Some(json!("Deed")));
        assert_eq!(stack.components.item_name, Some(json!("Paper")));
    }

    #[test]
    fn lore_list_operations() {
        let mut lore = vec![json!("a"), json!("b"), json!("c")];
        apply_list_operation(&mut lore, &[json!("x")], ListOperation::Insert, Some(1), None);
        assert_eq!(lore, vec![json!("a"), json!("x"), json!("b"), json!("c")]);
        apply_list_operation(&mut lore, &[json!("y")], ListOperation::ReplaceSection, Some(1), Some(2));
        assert_eq!(lore, vec![json!("a"), json!("y"), json!("c")]);
        apply_list_operation(&mut lore, &[json!("z")], ListOperation::Append, None, None);
        assert_eq!(lore.len(), 4);
        apply_list_operation(&mut lore, &[json!("z")], ListOperation::ReplaceAll, None, None);
        assert_eq!(lore, vec![json!("z")]);
    }

    #[test]
    fn set_nbt_is_custom_data() {
        let f = function(json!({"function": "minecraft:set_nbt", "tag": "{Unbreakable:1b}"}));
        assert!(matches!(f.kind, FunctionKind::SetCustomData { .. }));
    }

    #[test]
    fn set_components_patch() {
        let ctx = RuntimeContext::default();
        let mut stack = ItemStack::new("stick", 1);
        stack.components.other.insert("minecraft:glider".into(), json!({}));
        let f = function(json!({
            "function": "set_components",
            "components": {
                "custom_name": "Wand",
                "minecraft:dyed_color": {"rgb": 255},
                "!minecraft:glider": {},
                "minecraft:rarity": "epic"
            }
        }));
        run(&f, &mut stack, &ctx);
        assert_eq!(stack.components.custom_name, Some(json!("Wand")));
        assert_eq!(stack.components.dyed_color, Some(255));
        assert!(!stack.components.other.contains_key("minecraft:glider"));
        assert_eq!(stack.components.other.get("minecraft:rarity"), Some(&json!("epic")));
    }

    #[test]
    fn exploration_map_fills_map() {
        let ctx = RuntimeContext::default();
        let mut map = ItemStack::new("map", 1);
        let f = function(json!({
            "function": "exploration_map",
            "destination": "minecraft:on_ocean_explorer_maps",
            "decoration": "monument"
        }));
        run(&f, &mut map, &ctx);
        assert!(map.id.is("filled_map"));
        assert_eq!(map.components.map_destination, Some("on_ocean_explorer_maps".into()));

        let mut compass = ItemStack::new("compass", 1);
        run(&f, &mut compass, &ctx);
        assert!(compass.id.is("compass"));
    }

    #[test]
    fn stew_effect_picks_one() {
        let ctx = RuntimeContext::default();
        let mut stew = ItemStack::new("suspicious_stew", 1);
        let f = function(json!({
            "function": "set_stew_effect",
            "effects": [
                {"type": "night_vision", "duration": 5},
                {"type": "minecraft:blindness", "duration": 5}
            ]
        }));
        run(&f, &mut stew, &ctx);
        let effects = stew.components.other.get("minecraft:suspicious_stew_effects").unwrap();
        assert_eq!(effects[0]["duration"], json!(5));
    }

    #[test]
    fn unknown_function_is_noop() {
        let ctx = RuntimeContext::default();
        let f = function(json!({"function": "minecraft:furnace_smelt"}));
        assert_eq!(f.kind, FunctionKind::Unsupported);
        let mut stack = ItemStack::new("beef", 2);
        run(&f, &mut stack, &ctx);
        assert_eq!(stack, ItemStack::new("beef", 2));
    }
}
