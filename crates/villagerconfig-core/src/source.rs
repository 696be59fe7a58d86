//! The data-source seam: tags, loot tables, enchantments and item components
//! served by whoever embeds the resolver.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::condition::LootCondition;
use crate::enchant::Enchantment;
use crate::id::{ResourceLocation, TagMember};
use crate::item::ComponentMap;
use crate::loot::LootTable;
use crate::number::ScoreTarget;

/// Synchronous lookups used during generation.
///
/// Every method has a "not available" default so implementors only provide
/// what they have. A `None` is a soft miss: the resolver treats it as empty
/// (or zero), never as an error.
pub trait DataSource: Send + Sync {
    fn item_tag(&self, _id: &ResourceLocation) -> Option<Vec<TagMember>> {
        None
    }

    fn enchantment_tag(&self, _id: &ResourceLocation) -> Option<Vec<TagMember>> {
        None
    }

    fn loot_table(&self, _id: &ResourceLocation) -> Option<Arc<LootTable>> {
        None
    }

    /// All known enchantments, in a stable order.
    fn enchantments(&self) -> Vec<Enchantment> {
        Vec::new()
    }

    fn item_components(&self, _id: &ResourceLocation) -> Option<ComponentMap> {
        None
    }

    fn score(&self, _target: &ScoreTarget, _objective: &str) -> Option<f64> {
        None
    }

    fn storage_value(&self, _storage: &ResourceLocation, _path: &str) -> Option<f64> {
        None
    }

    fn predicate(&self, _id: &ResourceLocation) -> Option<Arc<LootCondition>> {
        None
    }
}

/// Entry counts of an [`InMemoryDataSource`], for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub item_tags: usize,
    pub enchantment_tags: usize,
    pub loot_tables: usize,
    pub enchantments: usize,
    pub item_components: usize,
    pub predicates: usize,
}

/// A map-backed [`DataSource`].
///
/// Ordered maps keep enumeration (and so RNG consumption) stable across runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    item_tags: BTreeMap<ResourceLocation, Vec<TagMember>>,
    enchantment_tags: BTreeMap<ResourceLocation, Vec<TagMember>>,
    loot_tables: BTreeMap<ResourceLocation, Arc<LootTable>>,
    enchantments: BTreeMap<ResourceLocation, Enchantment>,
    item_components: BTreeMap<ResourceLocation, ComponentMap>,
    scores: BTreeMap<(String, String), f64>,
    storage: BTreeMap<(ResourceLocation, String), f64>,
    predicates: BTreeMap<ResourceLocation, Arc<LootCondition>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> SourceCounts {
        SourceCounts {
            item_tags: self.item_tags.len(),
            enchantment_tags: self.enchantment_tags.len(),
            loot_tables: self.loot_tables.len(),
            enchantments: self.enchantments.len(),
            item_components: self.item_components.len(),
            predicates: self.predicates.len(),
        }
    }

    // -- Insertion -----------------------------------------------------------

    /// Append members to an item tag, creating it if needed. With `replace`
    /// the previous members are discarded first.
    pub fn insert_item_tag(
        &mut self,
        id: ResourceLocation,
        members: Vec<TagMember>,
        replace: bool,
    ) {
        merge_tag(&mut self.item_tags, id, members, replace);
    }

    pub fn insert_enchantment_tag(
        &mut self,
        id: ResourceLocation,
        members: Vec<TagMember>,
        replace: bool,
    ) {
        merge_tag(&mut self.enchantment_tags, id, members, replace);
    }

    pub fn insert_loot_table(&mut self, id: ResourceLocation, table: LootTable) {
        self.loot_tables.insert(id, Arc::new(table));
    }

    pub fn insert_enchantment(&mut self, enchantment: Enchantment) {
        self.enchantments.insert(enchantment.id.clone(), enchantment);
    }

    pub fn insert_item_components(&mut self, id: ResourceLocation, components: ComponentMap) {
        self.item_components.entry(id).or_default().extend(components);
    }

    pub fn insert_score(&mut self, holder: &str, objective: &str, value: f64) {
        self.scores
            .insert((holder.to_string(), objective.to_string()), value);
    }

    pub fn insert_storage_value(&mut self, storage: ResourceLocation, path: &str, value: f64) {
        self.storage.insert((storage, path.to_string()), value);
    }

    pub fn insert_predicate(&mut self, id: ResourceLocation, condition: LootCondition) {
        self.predicates.insert(id, Arc::new(condition));
    }

    // -- Builder -------------------------------------------------------------

    pub fn with_item_tag<I, M>(mut self, id: impl Into<ResourceLocation>, members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<TagMember>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.insert_item_tag(id.into(), members, false);
        self
    }

    pub fn with_enchantment_tag<I, M>(mut self, id: impl Into<ResourceLocation>, members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<TagMember>,
    {
        let members = members.into_iter().map(Into::into).collect();
        self.insert_enchantment_tag(id.into(), members, false);
        self
    }

    pub fn with_loot_table(mut self, id: impl Into<ResourceLocation>, table: LootTable) -> Self {
        self.insert_loot_table(id.into(), table);
        self
    }

    pub fn with_enchantment(mut self, enchantment: Enchantment) -> Self {
        self.insert_enchantment(enchantment);
        self
    }

    pub fn with_item_components(
        mut self,
        id: impl Into<ResourceLocation>,
        components: ComponentMap,
    ) -> Self {
        self.insert_item_components(id.into(), components);
        self
    }

    pub fn with_score(mut self, holder: &str, objective: &str, value: f64) -> Self {
        self.insert_score(holder, objective, value);
        self
    }

    pub fn with_storage_value(
        mut self,
        storage: impl Into<ResourceLocation>,
        path: &str,
        value: f64,
    ) -> Self {
        self.insert_storage_value(storage.into(), path, value);
        self
    }

    pub fn with_predicate(mut self, id: impl Into<ResourceLocation>, condition: LootCondition) -> Self {
        self.insert_predicate(id.into(), condition);
        self
    }
}

fn merge_tag(
    tags: &mut BTreeMap<ResourceLocation, Vec<TagMember>>,
    id: ResourceLocation,
    members: Vec<TagMember>,
    replace: bool,
) {
    let existing = tags.entry(id).or_default();
    if replace {
        existing.clear();
    }
    for member in members {
        if !existing.contains(&member) {
            existing.push(member);
        }
    }
}

impl DataSource for InMemoryDataSource {
    fn item_tag(&self, id: &ResourceLocation) -> Option<Vec<TagMember>> {
        self.item_tags.get(id).cloned()
    }

    fn enchantment_tag(&self, id: &ResourceLocation) -> Option<Vec<TagMember>> {
        self.enchantment_tags.get(id).cloned()
    }

    fn loot_table(&self, id: &ResourceLocation) -> Option<Arc<LootTable>> {
        self.loot_tables.get(id).cloned()
    }

    fn enchantments(&self) -> Vec<Enchantment> {
        self.enchantments.values().cloned().collect()
    }

    fn item_components(&self, id: &ResourceLocation) -> Option<ComponentMap> {
        self.item_components.get(id).cloned()
    }

    fn score(&self, target: &ScoreTarget, objective: &str) -> Option<f64> {
        self.scores
            .get(&(target.name().to_string(), objective.to_string()))
            .copied()
    }

    fn storage_value(&self, storage: &ResourceLocation, path: &str) -> Option<f64> {
        self.storage.get(&(storage.clone(), path.to_string())).copied()
    }

    fn predicate(&self, id: &ResourceLocation) -> Option<Arc<LootCondition>> {
        self.predicates.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_soft_misses() {
        struct Nothing;
        impl DataSource for Nothing {}
        let id = ResourceLocation::new("x");
        assert!(Nothing.item_tag(&id).is_none());
        assert!(Nothing.loot_table(&id).is_none());
        assert!(Nothing.enchantments().is_empty());
        assert!(Nothing.score(&ScoreTarget::Fixed("a".into()), "b").is_none());
    }

    #[test]
    fn tags_merge_unless_replaced() {
        let mut data = InMemoryDataSource::new().with_item_tag("logs", ["oak_log"]);
        data.insert_item_tag("logs".into(), vec!["birch_log".into(), "oak_log".into()], false);
        assert_eq!(data.item_tag(&"logs".into()).unwrap().len(), 2);

        data.insert_item_tag("logs".into(), vec!["spruce_log".into()], true);
        assert_eq!(data.item_tag(&"logs".into()).unwrap(), vec![TagMember::from("spruce_log")]);
    }

    #[test]
    fn enchantments_enumerate_in_id_order() {
        let data = InMemoryDataSource::new()
            .with_enchantment(Enchantment::new("unbreaking", 3))
            .with_enchantment(Enchantment::new("efficiency", 5));
        let ids: Vec<_> = data.enchantments().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ResourceLocation::new("efficiency"), ResourceLocation::new("unbreaking")]);
    }

    #[test]
    fn counts_track_inserts() {
        let data = InMemoryDataSource::new()
            .with_item_tag("a", ["stone"])
            .with_enchantment(Enchantment::new("mending", 1));
        let counts = data.counts();
        assert_eq!(counts.item_tags, 1);
        assert_eq!(counts.enchantments, 1);
        assert_eq!(counts.loot_tables, 0);
    }
}
