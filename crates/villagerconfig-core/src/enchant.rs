//! Enchantment definitions and the randomized enchanting used by loot
//! functions.

use crate::error::ExpansionKind;
use crate::id::{HolderSet, ResourceLocation};
use crate::item::ItemStack;
use crate::rng::TradeRng;
use crate::scope::Scope;

/// A registry enchantment as far as trade previews care about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Enchantment {
    pub id: ResourceLocation,
    pub max_level: u32,
    pub weight: u32,
    /// Items the enchantment can be applied to. `None` means any item.
    pub supported_items: Option<HolderSet>,
    /// Enchantments this one cannot be combined with.
    pub exclusive_set: Option<HolderSet>,
}

impl Enchantment {
    pub fn new(id: impl Into<ResourceLocation>, max_level: u32) -> Self {
        Self {
            id: id.into(),
            max_level: max_level.max(1),
            weight: 1,
            supported_items: None,
            exclusive_set: None,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_supported_items(mut self, items: HolderSet) -> Self {
        self.supported_items = Some(items);
        self
    }

    pub fn with_exclusive_set(mut self, set: HolderSet) -> Self {
        self.exclusive_set = Some(set);
        self
    }

    /// Whether this enchantment may go on `item`. Books accept everything,
    /// and an unknown item tag does not restrict.
    pub fn supports(&self, item: &ItemStack, scope: &mut Scope<'_>) -> bool {
        if item.is_book() {
            return true;
        }
        match &self.supported_items {
            None => true,
            Some(set) => holder_contains(set, ExpansionKind::ItemTag, &item.id, scope).unwrap_or(true),
        }
    }

    /// Two enchantments are compatible when they differ and neither lists
    /// the other in its exclusive set.
    pub fn compatible_with(&self, other: &ResourceLocation, scope: &mut Scope<'_>) -> bool {
        if self.id == *other {
            return false;
        }
        let excludes_other = self
            .exclusive_set
            .as_ref()
            .and_then(|set| holder_contains(set, ExpansionKind::EnchantmentTag, other, scope))
            .unwrap_or(false);
        if excludes_other {
            return false;
        }
        match known_enchantment(other, scope).and_then(|e| e.exclusive_set) {
            Some(set) => {
                !holder_contains(&set, ExpansionKind::EnchantmentTag, &self.id, scope).unwrap_or(false)
            }
            None => true,
        }
    }
}

/// `Some(contains)` if membership can be decided, `None` for an unknown tag.
fn holder_contains(
    set: &HolderSet,
    kind: ExpansionKind,
    id: &ResourceLocation,
    scope: &mut Scope<'_>,
) -> Option<bool> {
    match set {
        HolderSet::List(ids) => Some(ids.contains(id)),
        HolderSet::Tag(tag) => {
            let data = scope.data()?;
            let known = match kind {
                ExpansionKind::EnchantmentTag => data.enchantment_tag(tag).is_some(),
                _ => data.item_tag(tag).is_some(),
            };
            if !known {
                return None;
            }
            Some(scope.expand_tag(kind, tag).contains(id))
        }
    }
}

fn known_enchantment(id: &ResourceLocation, scope: &Scope<'_>) -> Option<Enchantment> {
    scope
        .data()?
        .enchantments()
        .into_iter()
        .find(|e| e.id == *id)
}

/// Enchantments named by `options`, or every known enchantment when absent.
/// Ids the data source does not describe get a single level.
pub(crate) fn candidates(options: Option<&HolderSet>, scope: &mut Scope<'_>) -> Vec<Enchantment> {
    let known = scope.data().map(|d| d.enchantments()).unwrap_or_default();
    let ids = match options {
        None => return known,
        Some(HolderSet::List(ids)) => ids.clone(),
        Some(HolderSet::Tag(tag)) => scope.expand_tag(ExpansionKind::EnchantmentTag, tag),
    };
    ids.into_iter()
        .map(|id| {
            known
                .iter()
                .find(|e| e.id == id)
                .cloned()
                .unwrap_or_else(|| Enchantment::new(id, 1))
        })
        .collect()
}

fn compatible_with_stack(enchantment: &Enchantment, stack: &ItemStack, scope: &mut Scope<'_>) -> bool {
    let present: Vec<ResourceLocation> = stack.enchantments().map(|(id, _)| id.clone()).collect();
    present
        .iter()
        .all(|id| enchantment.compatible_with(id, scope))
}

// ---------------------------------------------------------------------------
// Randomized enchanting
// ---------------------------------------------------------------------------

/// Apply one uniformly chosen enchantment at a uniform level.
pub(crate) fn enchant_randomly(
    stack: &mut ItemStack,
    options: Option<&HolderSet>,
    only_compatible: bool,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) {
    let mut pool = Vec::new();
    for enchantment in candidates(options, scope) {
        if !enchantment.supports(stack, scope) {
            continue;
        }
        if only_compatible && !compatible_with_stack(&enchantment, stack, scope) {
            continue;
        }
        pool.push(enchantment);
    }
    if pool.is_empty() {
        tracing::debug!(item = %stack.id, "no applicable enchantment");
        return;
    }
    let chosen = &pool[rng.next_below(pool.len() as u64) as usize];
    let level = rng.range_inclusive(1, chosen.max_level as i64) as u32;
    stack.enchant(chosen.id.clone(), level);
}

/// Approximate enchanting-table behaviour for `levels` experience levels.
///
/// The first enchantment is drawn by weight with a level proportional to
/// `levels / 30`. Further compatible enchantments are added while a d50 roll
/// stays at or below the remaining levels, halving them each time.
pub(crate) fn enchant_with_levels(
    stack: &mut ItemStack,
    levels: i64,
    options: Option<&HolderSet>,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) {
    let mut pool = Vec::new();
    for enchantment in candidates(options, scope) {
        if enchantment.supports(stack, scope) {
            pool.push(enchantment);
        }
    }

    let mut remaining = levels.max(0);
    let mut first = true;
    loop {
        if !first && rng.next_below(50) as i64 > remaining {
            break;
        }
        pool.retain(|e| stack.enchantment_level(&e.id).is_none());
        let mut compatible = Vec::with_capacity(pool.len());
        for enchantment in &pool {
            if compatible_with_stack(enchantment, stack, scope) {
                compatible.push(enchantment.clone());
            }
        }
        let weights: Vec<u64> = compatible.iter().map(|e| e.weight as u64).collect();
        let Some(index) = rng.weighted_index(&weights) else {
            break;
        };
        let chosen = &compatible[index];
        stack.enchant(chosen.id.clone(), level_for(levels, chosen.max_level));
        if !first {
            remaining /= 2;
        }
        first = false;
    }
}

fn level_for(levels: i64, max_level: u32) -> u32 {
    let scaled = (levels.max(0) as f64 * max_level as f64 / 30.0).round() as i64;
    scaled.clamp(1, max_level.max(1) as i64) as u32
}

/// The `villagerconfig:enchant_randomly` variant with include/exclude sets
/// and an explicit level range.
pub(crate) fn enchant_randomly_bounded(
    stack: &mut ItemStack,
    include: Option<&HolderSet>,
    exclude: Option<&HolderSet>,
    min_level: Option<i64>,
    max_level: Option<i64>,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) {
    let excluded: Vec<ResourceLocation> = match exclude {
        None => Vec::new(),
        Some(HolderSet::List(ids)) => ids.clone(),
        Some(HolderSet::Tag(tag)) => scope.expand_tag(ExpansionKind::EnchantmentTag, tag),
    };
    let mut pool = Vec::new();
    for enchantment in candidates(include, scope) {
        if excluded.contains(&enchantment.id) || !enchantment.supports(stack, scope) {
            continue;
        }
        pool.push(enchantment);
    }
    if pool.is_empty() {
        tracing::debug!(item = %stack.id, "no applicable enchantment");
        return;
    }
    let chosen = &pool[rng.next_below(pool.len() as u64) as usize];
    let min = min_level.unwrap_or(1).max(1);
    let max = max_level.unwrap_or(chosen.max_level as i64).max(min);
    let level = rng.range_inclusive(min, max);
    stack.enchant(chosen.id.clone(), level.clamp(1, u32::MAX as i64) as u32);
}
