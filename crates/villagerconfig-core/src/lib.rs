//! VillagerConfig Core -- the trade resolver for VillagerConfig documents.
//!
//! Given a villager trade document and a [`context::RuntimeContext`], this
//! crate deterministically derives the trades a villager would offer,
//! mirroring the game's own resolution: tier and group selection, number
//! provider evaluation, loot entry resolution, and randomized enchanting and
//! dyeing.
//!
//! # Pipeline
//!
//! Each call to [`trade::generate_trades`] runs:
//!
//! 1. **Tier** -- Pick the last tier whose experience threshold the villager
//!    has reached.
//! 2. **Groups** -- Draw `num_to_select` distinct trades from each group.
//! 3. **Assembly** -- Resolve `cost_a`, `cost_b` and `result` loot entries,
//!    mix the stacks, then evaluate the price multiplier, trader experience
//!    and max uses.
//!
//! A single [`rng::TradeRng`] seeded from the context is threaded through
//! every step, so the same document and seed always produce the same trades.
//!
//! ```rust,ignore
//! let doc = data_loader::load_document_json(json)?;
//! let ctx = RuntimeContext::new(42).with_data(&pack);
//! let trades = trade::generate_trades(&doc, &ctx)?;
//! ```
//!
//! # Key Types
//!
//! - [`document::VillagerConfigDocument`] -- Tiers, groups and trades.
//! - [`number::NumberProvider`] -- Recursive numeric expressions.
//! - [`loot::LootEntry`] -- Recursive item descriptions, including loot
//!   tables and tags.
//! - [`source::DataSource`] -- Injected lookups for tags, loot tables,
//!   enchantments, item components, scores and predicates.
//! - [`trade::ResolvedTrade`] -- The rendered output.

pub mod condition;
pub mod context;
pub mod data_loader;
pub mod document;
pub mod dye;
pub mod enchant;
pub mod error;
pub mod function;
pub mod id;
pub mod item;
pub mod loot;
pub mod mixer;
pub mod number;
pub mod rng;
pub mod scope;
pub mod source;
pub mod trade;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use context::{RuntimeContext, Weather};
pub use document::VillagerConfigDocument;
pub use error::GenerationError;
pub use trade::{ResolvedTrade, generate_report, generate_trades};
