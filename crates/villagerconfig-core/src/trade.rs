//! Tier selection, group sampling and trade assembly.
//!
//! A generation call is a pure function of the document and the runtime
//! context. One [`TradeRng`] seeded from `context.seed` is threaded through
//! every draw in document order, so equal inputs give equal trades.

use std::fmt;

use serde::Serialize;

use crate::context::RuntimeContext;
use crate::document::{Group, Tier, Trade, VillagerConfigDocument};
use crate::error::GenerationError;
use crate::item::ItemStack;
use crate::loot::LootEntry;
use crate::mixer::StackMixer;
use crate::number::{NumberProvider, evaluate, evaluate_int};
use crate::rng::TradeRng;
use crate::scope::Scope;

pub const DEFAULT_MAX_USES: i64 = 12;
pub const DEFAULT_TRADER_EXP: i64 = 1;
pub const DEFAULT_PRICE_MULTIPLIER: f64 = 1.0;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A fully evaluated trade, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTrade {
    pub cost_a: ItemStack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_b: Option<ItemStack>,
    pub result: ItemStack,
    pub price_multiplier: f64,
    pub max_uses: u32,
    pub trader_exp: u32,
    pub reward_experience: bool,
}

/// Why a selected trade produced no offer.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Failed(GenerationError),
    EmptyCost,
    EmptyResult,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Failed(error) => write!(f, "{error}"),
            SkipReason::EmptyCost => f.write_str("cost_a resolved to no items"),
            SkipReason::EmptyResult => f.write_str("result resolved to no items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTrade {
    /// Group index within the selected tier.
    pub group: usize,
    /// Trade index within the group.
    pub trade: usize,
    pub reason: SkipReason,
}

/// Trades plus everything that was dropped or degraded on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    /// Index of the selected tier in the document.
    pub tier: usize,
    pub trades: Vec<ResolvedTrade>,
    pub skipped: Vec<SkippedTrade>,
    /// Non-fatal errors from entries that resolved to empty.
    pub diagnostics: Vec<GenerationError>,
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Index of the active tier: the last one, by ascending threshold, whose
/// `total_exp_required` does not exceed `accumulated_exp`. Falls back to the
/// first tier in the document when none qualifies.
pub fn select_tier_index(
    document: &VillagerConfigDocument,
    accumulated_exp: u32,
) -> Result<usize, GenerationError> {
    if document.tiers.is_empty() {
        return Err(GenerationError::EmptyDocument);
    }
    let mut order: Vec<usize> = (0..document.tiers.len()).collect();
    order.sort_by_key(|&i| document.tiers[i].total_exp_required);
    Ok(order
        .into_iter()
        .rev()
        .find(|&i| document.tiers[i].total_exp_required <= accumulated_exp)
        .unwrap_or(0))
}

pub fn select_tier(
    document: &VillagerConfigDocument,
    accumulated_exp: u32,
) -> Result<&Tier, GenerationError> {
    let index = select_tier_index(document, accumulated_exp)?;
    Ok(&document.tiers[index])
}

/// Indices of the trades drawn from `group`, in document order.
///
/// `num_to_select` is clamped to `[0, trades.len()]`; the draw is a partial
/// Fisher-Yates shuffle, so no trade is picked twice.
pub fn select_group_indices(
    group: &Group,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<Vec<usize>, GenerationError> {
    let available = group.trades.len();
    let k = evaluate_int(&group.num_to_select, rng, scope)?.clamp(0, available as i64) as usize;

    let mut indices: Vec<usize> = (0..available).collect();
    for i in 0..k {
        let j = i + rng.next_below((available - i) as u64) as usize;
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices.sort_unstable();
    Ok(indices)
}

pub fn select_group_trades<'d>(
    group: &'d Group,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<Vec<&'d Trade>, GenerationError> {
    Ok(select_group_indices(group, rng, scope)?
        .into_iter()
        .map(|i| &group.trades[i])
        .collect())
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Resolve one trade in its own reference scope. Returns the outcome and the
/// diagnostics raised while resolving it.
pub fn assemble_trade(
    trade: &Trade,
    rng: &mut TradeRng,
    context: &RuntimeContext<'_>,
) -> (Result<ResolvedTrade, SkipReason>, Vec<GenerationError>) {
    let mut scope = Scope::with_references(context, &trade.reference_providers);
    let outcome = assemble_in_scope(trade, rng, &mut scope);
    (outcome, scope.take_diagnostics())
}

fn assemble_in_scope(
    trade: &Trade,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<ResolvedTrade, SkipReason> {
    let mixer = scope.context().stack_mixer;

    let cost_a = first_stack(&trade.cost_a, mixer, rng, scope)?;
    let cost_b = match &trade.cost_b {
        Some(entry) => first_stack(entry, mixer, rng, scope)?,
        None => None,
    };
    let result = first_stack(&trade.result, mixer, rng, scope)?;

    let price_multiplier = evaluate_or(&trade.price_multiplier, DEFAULT_PRICE_MULTIPLIER, rng, scope)?;
    let trader_exp = evaluate_int_or(&trade.trader_exp, DEFAULT_TRADER_EXP, rng, scope)?;
    let max_uses = evaluate_int_or(&trade.max_uses, DEFAULT_MAX_USES, rng, scope)?;

    let mut cost_a = cost_a.ok_or(SkipReason::EmptyCost)?;
    let result = result.ok_or(SkipReason::EmptyResult)?;
    let scaled = (cost_a.count as f64 * price_multiplier).round();
    cost_a.count = scaled.clamp(1.0, u32::MAX as f64) as u32;

    Ok(ResolvedTrade {
        cost_a,
        cost_b,
        result,
        price_multiplier,
        max_uses: non_negative(max_uses),
        trader_exp: non_negative(trader_exp),
        reward_experience: trade.reward_experience.unwrap_or(true),
    })
}

/// Resolve an entry, mix the stacks and keep the first one.
fn first_stack(
    entry: &LootEntry,
    mixer: StackMixer,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<Option<ItemStack>, SkipReason> {
    let stacks = entry.resolve(rng, scope).map_err(SkipReason::Failed)?;
    Ok(mixer.mix(stacks, rng, scope).into_iter().next())
}

fn evaluate_or(
    provider: &Option<NumberProvider>,
    default: f64,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<f64, SkipReason> {
    match provider {
        Some(provider) => evaluate(provider, rng, scope).map_err(SkipReason::Failed),
        None => Ok(default),
    }
}

fn evaluate_int_or(
    provider: &Option<NumberProvider>,
    default: i64,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<i64, SkipReason> {
    match provider {
        Some(provider) => evaluate_int(provider, rng, scope).map_err(SkipReason::Failed),
        None => Ok(default),
    }
}

fn non_negative(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate trades and report what was skipped along the way.
///
/// Only an empty document fails the call. Failing trades are skipped and
/// failing groups contribute nothing.
pub fn generate_report(
    document: &VillagerConfigDocument,
    context: &RuntimeContext<'_>,
) -> Result<GenerationReport, GenerationError> {
    let span = tracing::debug_span!("generate", seed = context.seed, version = %context.version);
    let _guard = span.enter();

    let tier_index = select_tier_index(document, context.accumulated_exp)?;
    let tier = &document.tiers[tier_index];
    tracing::debug!(
        tier = tier_index,
        threshold = tier.total_exp_required,
        exp = context.accumulated_exp,
        "selected tier"
    );

    let mut rng = TradeRng::from_seed(context.seed);
    let mut report = GenerationReport {
        tier: tier_index,
        ..GenerationReport::default()
    };

    for (group_index, group) in tier.groups.iter().enumerate() {
        let mut group_scope = Scope::new(context);
        let selected = select_group_indices(group, &mut rng, &mut group_scope);
        report.diagnostics.extend(group_scope.take_diagnostics());
        let selected = match selected {
            Ok(selected) => selected,
            Err(error) => {
                tracing::warn!(group = group_index, %error, "skipping group");
                report.diagnostics.push(error);
                continue;
            }
        };
        tracing::debug!(group = group_index, ?selected, "selected trades");

        for trade_index in selected {
            let (outcome, diagnostics) = assemble_trade(&group.trades[trade_index], &mut rng, context);
            report.diagnostics.extend(diagnostics);
            match outcome {
                Ok(trade) => report.trades.push(trade),
                Err(reason) => {
                    tracing::warn!(group = group_index, trade = trade_index, %reason, "skipping trade");
                    report.skipped.push(SkippedTrade {
                        group: group_index,
                        trade: trade_index,
                        reason,
                    });
                }
            }
        }
    }

    tracing::debug!(
        trades = report.trades.len(),
        skipped = report.skipped.len(),
        "generation finished"
    );
    Ok(report)
}

/// Generate the ordered list of trades for `context`.
pub fn generate_trades(
    document: &VillagerConfigDocument,
    context: &RuntimeContext<'_>,
) -> Result<Vec<ResolvedTrade>, GenerationError> {
    generate_report(document, context).map(|report| report.trades)
}

/// One independent generation per seed. With the `parallel` feature the
/// seeds run on the rayon pool; results are identical either way.
pub fn generate_for_seeds(
    document: &VillagerConfigDocument,
    context: &RuntimeContext<'_>,
    seeds: &[i64],
) -> Vec<Result<Vec<ResolvedTrade>, GenerationError>> {
    let run = |seed: i64| generate_trades(document, &context.clone().with_seed(seed));

    #[cfg(feature = "parallel")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        seeds.par_iter().map(|&seed| run(seed)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = seeds.iter().map(|&seed| run(seed)).collect();

    results
}
