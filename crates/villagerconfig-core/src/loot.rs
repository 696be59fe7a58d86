//! Loot entries, pools and tables, and their resolution into item stacks.

use serde::Deserialize;

use crate::condition::{LootCondition, all_pass};
use crate::error::{ExpansionKind, GenerationError};
use crate::function::{LootFunction, apply_all};
use crate::id::ResourceLocation;
use crate::item::ItemStack;
use crate::number::{NumberProvider, evaluate, evaluate_int};
use crate::rng::TradeRng;
use crate::context::MAX_POOL_ROLLS;
use crate::scope::{INLINE_NAME, Scope};

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootEntry {
    #[serde(flatten)]
    pub kind: EntryKind,
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default)]
    pub quality: i64,
    #[serde(default)]
    pub functions: Vec<LootFunction>,
    #[serde(default)]
    pub conditions: Vec<LootCondition>,
}

fn default_weight() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum EntryKind {
    #[serde(rename = "minecraft:item", alias = "item")]
    Item { name: ResourceLocation },

    #[serde(rename = "minecraft:tag", alias = "tag")]
    Tag {
        name: ResourceLocation,
        #[serde(default)]
        expand: bool,
    },

    #[serde(rename = "minecraft:loot_table", alias = "loot_table")]
    LootTable {
        #[serde(alias = "value")]
        name: TableRef,
    },

    #[serde(rename = "minecraft:dynamic", alias = "dynamic")]
    Dynamic { name: ResourceLocation },

    #[serde(rename = "minecraft:empty", alias = "empty")]
    Empty,

    #[serde(rename = "minecraft:alternatives", alias = "alternatives")]
    Alternatives { children: Vec<LootEntry> },

    #[serde(rename = "minecraft:group", alias = "group")]
    Group { children: Vec<LootEntry> },

    #[serde(rename = "minecraft:sequence", alias = "sequence")]
    Sequence { children: Vec<LootEntry> },
}

/// A loot table named by id, or written inline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TableRef {
    Named(ResourceLocation),
    Inline(Box<LootTable>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LootTable {
    #[serde(default, rename = "type")]
    pub table_type: Option<ResourceLocation>,
    #[serde(default)]
    pub pools: Vec<LootPool>,
    #[serde(default)]
    pub functions: Vec<LootFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LootPool {
    #[serde(default = "default_rolls")]
    pub rolls: NumberProvider,
    #[serde(default)]
    pub bonus_rolls: Option<NumberProvider>,
    #[serde(default)]
    pub entries: Vec<LootEntry>,
    #[serde(default)]
    pub functions: Vec<LootFunction>,
    #[serde(default)]
    pub conditions: Vec<LootCondition>,
}

fn default_rolls() -> NumberProvider {
    NumberProvider::constant(1.0)
}

impl LootEntry {
    pub fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            weight: 1,
            quality: 0,
            functions: Vec::new(),
            conditions: Vec::new(),
        }
    }

    pub fn item(name: impl Into<ResourceLocation>) -> Self {
        Self::new(EntryKind::Item { name: name.into() })
    }

    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_quality(mut self, quality: i64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_function(mut self, function: LootFunction) -> Self {
        self.functions.push(function);
        self
    }

    pub fn with_condition(mut self, condition: LootCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// `max(0, floor(weight + quality * luck))`.
    pub fn effective_weight(&self, luck: f64) -> u64 {
        (self.weight as f64 + self.quality as f64 * luck).floor().max(0.0) as u64
    }

    /// Resolve the entry into stacks.
    ///
    /// Soft misses (unknown tags, tables or predicates) and over-deep nesting
    /// resolve to empty; only reference failures are returned as errors.
    pub fn resolve(
        &self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<Vec<ItemStack>, GenerationError> {
        if !all_pass(&self.conditions, rng, scope)? {
            return Ok(Vec::new());
        }
        self.emit(rng, scope)
    }

    /// Produce this entry's stacks with its conditions already satisfied.
    fn emit(
        &self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<Vec<ItemStack>, GenerationError> {
        let mut stacks = match &self.kind {
            EntryKind::Item { name } => vec![ItemStack::new(name.clone(), 1)],
            EntryKind::Tag { name, expand } => {
                let members = scope.expand_tag(ExpansionKind::ItemTag, name);
                if *expand {
                    if members.is_empty() {
                        Vec::new()
                    } else {
                        let index = rng.next_below(members.len() as u64) as usize;
                        vec![ItemStack::new(members[index].clone(), 1)]
                    }
                } else {
                    members.into_iter().map(|id| ItemStack::new(id, 1)).collect()
                }
            }
            EntryKind::LootTable { name } => resolve_table_ref(name, rng, scope)?,
            EntryKind::Dynamic { name } => {
                tracing::debug!(%name, "dynamic entry has no content in preview");
                Vec::new()
            }
            EntryKind::Empty => Vec::new(),
            EntryKind::Alternatives { children } => {
                let mut out = Vec::new();
                for child in children {
                    if all_pass(&child.conditions, rng, scope)? {
                        out = child.emit(rng, scope)?;
                        break;
                    }
                }
                out
            }
            EntryKind::Group { children } => {
                let mut out = Vec::new();
                for child in children {
                    out.extend(child.resolve(rng, scope)?);
                }
                out
            }
            EntryKind::Sequence { children } => {
                let mut out = Vec::new();
                for child in children {
                    if !all_pass(&child.conditions, rng, scope)? {
                        break;
                    }
                    out.extend(child.emit(rng, scope)?);
                }
                out
            }
        };
        finish_stacks(&mut stacks, &self.functions, rng, scope)?;
        Ok(stacks)
    }

    /// Collect the leaf candidates this entry offers to a pool roll.
    /// Returns whether the entry's own conditions passed.
    fn expand_candidates<'e>(
        &'e self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
        out: &mut Vec<Candidate<'e>>,
    ) -> Result<bool, GenerationError> {
        if !all_pass(&self.conditions, rng, scope)? {
            return Ok(false);
        }
        match &self.kind {
            EntryKind::Alternatives { children } => {
                for child in children {
                    if child.expand_candidates(rng, scope, out)? {
                        break;
                    }
                }
            }
            EntryKind::Group { children } => {
                for child in children {
                    child.expand_candidates(rng, scope, out)?;
                }
            }
            EntryKind::Sequence { children } => {
                for child in children {
                    if !child.expand_candidates(rng, scope, out)? {
                        break;
                    }
                }
            }
            EntryKind::Tag { name, expand: true } => {
                for member in scope.expand_tag(ExpansionKind::ItemTag, name) {
                    out.push(Candidate::Member(self, member));
                }
            }
            _ => out.push(Candidate::Entry(self)),
        }
        Ok(true)
    }
}

/// Apply functions to every stack, then drop the empty ones.
fn finish_stacks(
    stacks: &mut Vec<ItemStack>,
    functions: &[LootFunction],
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<(), GenerationError> {
    for stack in stacks.iter_mut() {
        apply_all(functions, stack, rng, scope)?;
    }
    stacks.retain(|stack| !stack.is_empty());
    Ok(())
}

// ---------------------------------------------------------------------------
// Pools and tables
// ---------------------------------------------------------------------------

enum Candidate<'e> {
    Entry(&'e LootEntry),
    /// One member of an expanded tag entry.
    Member(&'e LootEntry, ResourceLocation),
}

impl Candidate<'_> {
    fn entry(&self) -> &LootEntry {
        match self {
            Candidate::Entry(entry) | Candidate::Member(entry, _) => entry,
        }
    }

    fn create(
        &self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<Vec<ItemStack>, GenerationError> {
        match self {
            Candidate::Entry(entry) => entry.emit(rng, scope),
            Candidate::Member(entry, id) => {
                let mut stacks = vec![ItemStack::new(id.clone(), 1)];
                finish_stacks(&mut stacks, &entry.functions, rng, scope)?;
                Ok(stacks)
            }
        }
    }
}

impl LootPool {
    /// Roll the pool `rolls + floor(bonus_rolls * luck)` times, at most
    /// [`MAX_POOL_ROLLS`], each roll drawing one weighted candidate.
    pub fn roll(
        &self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
        out: &mut Vec<ItemStack>,
    ) -> Result<(), GenerationError> {
        if !all_pass(&self.conditions, rng, scope)? {
            return Ok(());
        }
        let mut rolls = evaluate_int(&self.rolls, rng, scope)?;
        if let Some(bonus) = &self.bonus_rolls {
            rolls = rolls.saturating_add((evaluate(bonus, rng, scope)? * scope.luck()).floor() as i64);
        }
        if rolls > MAX_POOL_ROLLS {
            tracing::debug!(rolls, limit = MAX_POOL_ROLLS, "capping pool rolls");
            rolls = MAX_POOL_ROLLS;
        }

        for _ in 0..rolls.max(0) {
            let mut candidates = Vec::new();
            for entry in &self.entries {
                entry.expand_candidates(rng, scope, &mut candidates)?;
            }
            let luck = scope.luck();
            let weights: Vec<u64> = candidates
                .iter()
                .map(|c| c.entry().effective_weight(luck))
                .collect();
            let Some(index) = rng.weighted_index(&weights) else {
                continue;
            };
            let mut stacks = candidates[index].create(rng, scope)?;
            finish_stacks(&mut stacks, &self.functions, rng, scope)?;
            out.extend(stacks);
        }
        Ok(())
    }
}

impl LootTable {
    /// Roll every pool in order, then apply the table's functions.
    pub fn generate(
        &self,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<Vec<ItemStack>, GenerationError> {
        let mut stacks = Vec::new();
        for pool in &self.pools {
            pool.roll(rng, scope, &mut stacks)?;
        }
        finish_stacks(&mut stacks, &self.functions, rng, scope)?;
        Ok(stacks)
    }
}

fn resolve_table_ref(
    table: &TableRef,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<Vec<ItemStack>, GenerationError> {
    match table {
        TableRef::Named(id) => {
            let Some(found) = scope.data().and_then(|data| data.loot_table(id)) else {
                tracing::debug!(%id, "loot table not available");
                return Ok(Vec::new());
            };
            resolve_nested(&found, id.as_str(), rng, scope)
        }
        TableRef::Inline(inline) => resolve_nested(inline, INLINE_NAME, rng, scope),
    }
}

fn resolve_nested(
    table: &LootTable,
    name: &str,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<Vec<ItemStack>, GenerationError> {
    if let Err(error) = scope.enter(ExpansionKind::LootTable, name) {
        scope.record(error);
        return Ok(Vec::new());
    }
    let stacks = table.generate(rng, scope);
    scope.exit();
    stacks
}
