//! Loot conditions that gate entries, pools and functions.
//!
//! Conditions that need a live entity, block, tool or damage source can never
//! hold for a trade preview and deserialize to [`LootCondition::Unsupported`].

use serde::Deserialize;

use crate::error::{ExpansionKind, GenerationError};
use crate::id::ResourceLocation;
use crate::number::{NumberProvider, evaluate, evaluate_int};
use crate::rng::TradeRng;
use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "condition")]
pub enum LootCondition {
    #[serde(rename = "minecraft:all_of", alias = "all_of")]
    AllOf { terms: Vec<LootCondition> },

    #[serde(
        rename = "minecraft:any_of",
        alias = "any_of",
        alias = "minecraft:alternative",
        alias = "alternative"
    )]
    AnyOf { terms: Vec<LootCondition> },

    #[serde(rename = "minecraft:inverted", alias = "inverted")]
    Inverted { term: Box<LootCondition> },

    #[serde(rename = "minecraft:random_chance", alias = "random_chance")]
    RandomChance { chance: NumberProvider },

    /// No tool is involved in a trade, so only the unenchanted chance applies.
    #[serde(
        rename = "minecraft:random_chance_with_enchanted_bonus",
        alias = "random_chance_with_enchanted_bonus"
    )]
    RandomChanceWithEnchantedBonus {
        #[serde(default)]
        unenchanted_chance: f64,
    },

    /// Uses the zero-level chance for the same reason.
    #[serde(rename = "minecraft:table_bonus", alias = "table_bonus")]
    TableBonus { chances: Vec<f64> },

    #[serde(rename = "minecraft:value_check", alias = "value_check")]
    ValueCheck { value: NumberProvider, range: IntRange },

    #[serde(rename = "minecraft:time_check", alias = "time_check")]
    TimeCheck {
        value: IntRange,
        #[serde(default)]
        period: Option<i64>,
    },

    #[serde(rename = "minecraft:weather_check", alias = "weather_check")]
    WeatherCheck {
        #[serde(default)]
        raining: Option<bool>,
        #[serde(default)]
        thundering: Option<bool>,
    },

    #[serde(rename = "minecraft:killed_by_player", alias = "killed_by_player")]
    KilledByPlayer {
        #[serde(default)]
        inverse: bool,
    },

    #[serde(rename = "minecraft:reference", alias = "reference")]
    Reference { name: ResourceLocation },

    #[serde(other)]
    Unsupported,
}

/// An integer range: an exact number or optional provider bounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IntRange {
    Exact(f64),
    Bounds {
        #[serde(default)]
        min: Option<NumberProvider>,
        #[serde(default)]
        max: Option<NumberProvider>,
    },
}

impl IntRange {
    pub fn contains(
        &self,
        value: i64,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<bool, GenerationError> {
        match self {
            IntRange::Exact(exact) => Ok(value == exact.round() as i64),
            IntRange::Bounds { min, max } => {
                if let Some(min) = min {
                    if value < evaluate_int(min, rng, scope)? {
                        return Ok(false);
                    }
                }
                if let Some(max) = max {
                    if value > evaluate_int(max, rng, scope)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Clamp `value` into the range. An exact range forces its value.
    pub fn clamp(
        &self,
        value: i64,
        rng: &mut TradeRng,
        scope: &mut Scope<'_>,
    ) -> Result<i64, GenerationError> {
        match self {
            IntRange::Exact(exact) => Ok(exact.round() as i64),
            IntRange::Bounds { min, max } => {
                let mut value = value;
                if let Some(min) = min {
                    value = value.max(evaluate_int(min, rng, scope)?);
                }
                if let Some(max) = max {
                    value = value.min(evaluate_int(max, rng, scope)?);
                }
                Ok(value)
            }
        }
    }
}

impl LootCondition {
    pub fn test(&self, rng: &mut TradeRng, scope: &mut Scope<'_>) -> Result<bool, GenerationError> {
        match self {
            LootCondition::AllOf { terms } => all_pass(terms, rng, scope),
            LootCondition::AnyOf { terms } => {
                for term in terms {
                    if term.test(rng, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LootCondition::Inverted { term } => Ok(!term.test(rng, scope)?),
            LootCondition::RandomChance { chance } => {
                let chance = evaluate(chance, rng, scope)?;
                Ok(rng.chance(chance))
            }
            LootCondition::RandomChanceWithEnchantedBonus { unenchanted_chance } => {
                Ok(rng.chance(*unenchanted_chance))
            }
            LootCondition::TableBonus { chances } => {
                Ok(rng.chance(chances.first().copied().unwrap_or(0.0)))
            }
            LootCondition::ValueCheck { value, range } => {
                let value = evaluate_int(value, rng, scope)?;
                range.contains(value, rng, scope)
            }
            LootCondition::TimeCheck { value, period } => {
                let daytime = scope.context().daytime;
                let time = match period {
                    Some(period) if *period > 0 => daytime.rem_euclid(*period),
                    _ => daytime,
                };
                value.contains(time, rng, scope)
            }
            LootCondition::WeatherCheck {
                raining,
                thundering,
            } => {
                let weather = scope.context().weather;
                Ok(raining.is_none_or(|r| r == weather.is_raining())
                    && thundering.is_none_or(|t| t == weather.is_thundering()))
            }
            LootCondition::KilledByPlayer { inverse } => Ok(*inverse),
            LootCondition::Reference { name } => test_predicate(name, rng, scope),
            LootCondition::Unsupported => Ok(false),
        }
    }
}

fn test_predicate(
    name: &ResourceLocation,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<bool, GenerationError> {
    let Some(predicate) = scope.data().and_then(|data| data.predicate(name)) else {
        tracing::debug!(%name, "predicate not available");
        return Ok(false);
    };
    if let Err(error) = scope.enter(ExpansionKind::Predicate, name.as_str()) {
        scope.record(error);
        return Ok(false);
    }
    let result = predicate.test(rng, scope);
    scope.exit();
    result
}

/// True when every condition passes. Stops at the first failure, so later
/// conditions draw no randomness.
pub fn all_pass(
    conditions: &[LootCondition],
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<bool, GenerationError> {
    for condition in conditions {
        if !condition.test(rng, scope)? {
            return Ok(false);
        }
    }
    Ok(true)
}
