//! Error types for document parsing and trade generation.

use std::fmt;

/// What was being expanded when a recursion limit was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionKind {
    LootTable,
    ItemTag,
    EnchantmentTag,
    Predicate,
    Reference,
}

impl fmt::Display for ExpansionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpansionKind::LootTable => "loot table",
            ExpansionKind::ItemTag => "item tag",
            ExpansionKind::EnchantmentTag => "enchantment tag",
            ExpansionKind::Predicate => "predicate",
            ExpansionKind::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// Errors raised while generating trades.
///
/// Only [`GenerationError::EmptyDocument`] aborts a whole generation call.
/// The other variants are isolated to a single trade or entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// The document has no tiers to select from.
    #[error("villager config has no tiers")]
    EmptyDocument,

    /// A `villagerconfig:reference` id is bound neither by the trade nor globally.
    #[error("unresolved number provider reference '{id}'")]
    UnresolvedReference { id: String },

    /// Nested loot tables, tags, predicates or references went too deep.
    #[error("recursion limit of {depth} exceeded while expanding {kind} '{name}'")]
    RecursionLimitExceeded {
        kind: ExpansionKind,
        name: String,
        depth: usize,
    },

    /// A single trade expanded more loot tables, tags or predicates than
    /// [`EXPANSION_LIMIT`](crate::context::EXPANSION_LIMIT) allows.
    #[error("expansion limit of {limit} exceeded while expanding {kind} '{name}'")]
    ExpansionLimitExceeded {
        kind: ExpansionKind,
        name: String,
        limit: usize,
    },
}

/// Errors raised while turning raw document values into typed providers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("unknown {kind} type '{type_name}'")]
    UnknownType {
        kind: &'static str,
        type_name: String,
    },

    #[error("invalid {kind}: {detail}")]
    Invalid { kind: &'static str, detail: String },
}
