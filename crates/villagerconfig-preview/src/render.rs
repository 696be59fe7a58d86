//! Plain-text and JSON rendering of generated trades.

use serde::Serialize;
use villagerconfig_core::item::ItemStack;
use villagerconfig_core::trade::{GenerationReport, ResolvedTrade};

/// One seed's trades, as written by `--json`.
#[derive(Debug, Serialize)]
pub struct SeedPreview<'a> {
    pub seed: i64,
    pub tier: usize,
    pub trades: &'a [ResolvedTrade],
}

/// `3x minecraft:emerald` plus a bracketed summary of notable components.
pub fn render_stack(stack: &ItemStack) -> String {
    let mut details = Vec::new();
    let enchantments: Vec<String> = stack
        .enchantments()
        .map(|(id, level)| format!("{} {level}", id.path()))
        .collect();
    if !enchantments.is_empty() {
        details.push(enchantments.join(", "));
    }
    let components = &stack.components;
    if let Some(color) = components.dyed_color {
        details.push(format!("dyed #{color:06x}"));
    }
    if let Some(damage) = components.damage {
        details.push(format!("{:.0}% durability", damage * 100.0));
    }
    if let Some(potion) = &components.potion {
        details.push(format!("potion {potion}"));
    }
    if let Some(name) = components.custom_name.as_ref().or(components.item_name.as_ref()) {
        details.push(format!("named {name}"));
    }
    if let Some(destination) = &components.map_destination {
        details.push(format!("map to {destination}"));
    }

    let base = format!("{}x {}", stack.count, stack.id);
    if details.is_empty() {
        base
    } else {
        format!("{base} [{}]", details.join("; "))
    }
}

pub fn render_trade(trade: &ResolvedTrade) -> String {
    let cost = match &trade.cost_b {
        Some(cost_b) => format!("{} + {}", render_stack(&trade.cost_a), render_stack(cost_b)),
        None => render_stack(&trade.cost_a),
    };
    format!(
        "{cost} -> {}  (uses {}, exp {}, price x{})",
        render_stack(&trade.result),
        trade.max_uses,
        trade.trader_exp,
        trade.price_multiplier
    )
}

pub fn render_report(seed: i64, report: &GenerationReport) -> String {
    let mut lines = vec![format!(
        "--- seed {seed} (tier {}, {} trades) ---",
        report.tier,
        report.trades.len()
    )];
    lines.extend(report.trades.iter().map(|t| format!("    {}", render_trade(t))));
    lines.extend(report.skipped.iter().map(|s| {
        format!("    skipped group {} trade {}: {}", s.group, s.trade, s.reason)
    }));
    lines.extend(report.diagnostics.iter().map(|d| format!("    note: {d}")));
    lines.join("\n")
}
