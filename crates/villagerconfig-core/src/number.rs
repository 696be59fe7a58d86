//! Number providers: recursive numeric expressions evaluated against the
//! shared RNG and the trade's reference scope.
//!
//! A provider is written either as a bare number (a constant) or as an
//! object keyed by `type`. Objects without a `type` are uniform ranges, the
//! same shorthand the game accepts.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{DocumentError, GenerationError};
use crate::id::ResourceLocation;
use crate::rng::TradeRng;
use crate::scope::Scope;

// ---------------------------------------------------------------------------
// Provider types
// ---------------------------------------------------------------------------

/// A numeric expression from a VillagerConfig document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum NumberProvider {
    Constant(f64),
    Uniform {
        min: Box<NumberProvider>,
        max: Box<NumberProvider>,
    },
    Binomial {
        n: Box<NumberProvider>,
        p: Box<NumberProvider>,
    },
    Score {
        target: ScoreTarget,
        score: String,
        scale: Option<f64>,
    },
    Storage {
        storage: ResourceLocation,
        path: String,
    },
    EnchantmentLevel(LevelBasedValue),
    Add(Vec<NumberProvider>),
    Multiply(Vec<NumberProvider>),
    Reference(String),
}

impl NumberProvider {
    pub fn constant(value: f64) -> Self {
        NumberProvider::Constant(value)
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        NumberProvider::Uniform {
            min: Box::new(NumberProvider::Constant(min)),
            max: Box::new(NumberProvider::Constant(max)),
        }
    }

    pub fn reference(id: &str) -> Self {
        NumberProvider::Reference(id.to_string())
    }
}

/// Whose score a `minecraft:score` provider reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawScoreTarget")]
pub enum ScoreTarget {
    /// A loot-context entity such as `this` or `killer`.
    Context(String),
    /// A fixed scoreholder name.
    Fixed(String),
}

impl ScoreTarget {
    /// The scoreholder name used for lookups.
    pub fn name(&self) -> &str {
        match self {
            ScoreTarget::Context(name) | ScoreTarget::Fixed(name) => name,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScoreTarget {
    Name(String),
    Object(ScoreTargetObject),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ScoreTargetObject {
    #[serde(rename = "minecraft:fixed", alias = "fixed")]
    Fixed { name: String },
    #[serde(rename = "minecraft:context", alias = "context")]
    Context { target: String },
}

impl From<RawScoreTarget> for ScoreTarget {
    fn from(raw: RawScoreTarget) -> Self {
        match raw {
            RawScoreTarget::Name(name) => ScoreTarget::Context(name),
            RawScoreTarget::Object(ScoreTargetObject::Fixed { name }) => ScoreTarget::Fixed(name),
            RawScoreTarget::Object(ScoreTargetObject::Context { target }) => {
                ScoreTarget::Context(target)
            }
        }
    }
}

/// A value that scales with an enchantment level.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLevelBased")]
pub enum LevelBasedValue {
    Constant(f64),
    Linear {
        base: f64,
        per_level_above_first: f64,
    },
    LevelsSquared {
        added: f64,
    },
    Clamped {
        value: Box<LevelBasedValue>,
        min: f64,
        max: f64,
    },
    Fraction {
        numerator: Box<LevelBasedValue>,
        denominator: Box<LevelBasedValue>,
    },
    Lookup {
        values: Vec<f64>,
        fallback: Box<LevelBasedValue>,
    },
}

impl LevelBasedValue {
    /// Evaluate at the given (1-based) enchantment level.
    pub fn at_level(&self, level: u32) -> f64 {
        let level_f = level as f64;
        match self {
            LevelBasedValue::Constant(v) => *v,
            LevelBasedValue::Linear {
                base,
                per_level_above_first,
            } => base + per_level_above_first * (level_f - 1.0),
            LevelBasedValue::LevelsSquared { added } => level_f * level_f + added,
            LevelBasedValue::Clamped { value, min, max } => {
                value.at_level(level).max(*min).min(*max)
            }
            LevelBasedValue::Fraction {
                numerator,
                denominator,
            } => {
                let d = denominator.at_level(level);
                if d == 0.0 {
                    0.0
                } else {
                    numerator.at_level(level) / d
                }
            }
            LevelBasedValue::Lookup { values, fallback } => values
                .get(level.saturating_sub(1) as usize)
                .copied()
                .unwrap_or_else(|| fallback.at_level(level)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevelBased {
    Constant(f64),
    Tagged(TaggedLevelBased),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TaggedLevelBased {
    #[serde(rename = "minecraft:linear", alias = "linear")]
    Linear {
        base: f64,
        per_level_above_first: f64,
    },
    #[serde(rename = "minecraft:levels_squared", alias = "levels_squared")]
    LevelsSquared { added: f64 },
    #[serde(rename = "minecraft:clamped", alias = "clamped")]
    Clamped {
        value: Box<LevelBasedValue>,
        min: f64,
        max: f64,
    },
    #[serde(rename = "minecraft:fraction", alias = "fraction")]
    Fraction {
        numerator: Box<LevelBasedValue>,
        denominator: Box<LevelBasedValue>,
    },
    #[serde(rename = "minecraft:lookup", alias = "lookup")]
    Lookup {
        values: Vec<f64>,
        fallback: Box<LevelBasedValue>,
    },
}

impl From<RawLevelBased> for LevelBasedValue {
    fn from(raw: RawLevelBased) -> Self {
        match raw {
            RawLevelBased::Constant(v) => LevelBasedValue::Constant(v),
            RawLevelBased::Tagged(tagged) => match tagged {
                TaggedLevelBased::Linear {
                    base,
                    per_level_above_first,
                } => LevelBasedValue::Linear {
                    base,
                    per_level_above_first,
                },
                TaggedLevelBased::LevelsSquared { added } => {
                    LevelBasedValue::LevelsSquared { added }
                }
                TaggedLevelBased::Clamped { value, min, max } => {
                    LevelBasedValue::Clamped { value, min, max }
                }
                TaggedLevelBased::Fraction {
                    numerator,
                    denominator,
                } => LevelBasedValue::Fraction {
                    numerator,
                    denominator,
                },
                TaggedLevelBased::Lookup { values, fallback } => {
                    LevelBasedValue::Lookup { values, fallback }
                }
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Above this many trials a binomial is drawn from its normal approximation
/// instead of trial by trial.
const EXACT_BINOMIAL_TRIALS: i64 = 1024;

const KNOWN_TYPES: &[&str] = &[
    "minecraft:constant",
    "minecraft:uniform",
    "minecraft:binomial",
    "minecraft:score",
    "minecraft:storage",
    "minecraft:enchantment_level",
    "villagerconfig:add",
    "villagerconfig:multiply",
    "villagerconfig:reference",
];

#[derive(Deserialize)]
#[serde(tag = "type")]
enum TaggedProvider {
    #[serde(rename = "minecraft:constant")]
    Constant { value: f64 },
    #[serde(rename = "minecraft:uniform")]
    Uniform {
        min: NumberProvider,
        max: NumberProvider,
    },
    #[serde(rename = "minecraft:binomial")]
    Binomial { n: NumberProvider, p: NumberProvider },
    #[serde(rename = "minecraft:score")]
    Score {
        target: ScoreTarget,
        score: String,
        #[serde(default)]
        scale: Option<f64>,
    },
    #[serde(rename = "minecraft:storage")]
    Storage {
        storage: ResourceLocation,
        path: String,
    },
    #[serde(rename = "minecraft:enchantment_level")]
    EnchantmentLevel { amount: LevelBasedValue },
    #[serde(rename = "villagerconfig:add")]
    Add {
        #[serde(default)]
        addends: Vec<NumberProvider>,
    },
    #[serde(rename = "villagerconfig:multiply")]
    Multiply {
        #[serde(default)]
        factors: Vec<NumberProvider>,
    },
    #[serde(rename = "villagerconfig:reference")]
    Reference { id: String },
}

impl From<TaggedProvider> for NumberProvider {
    fn from(tagged: TaggedProvider) -> Self {
        match tagged {
            TaggedProvider::Constant { value } => NumberProvider::Constant(value),
            TaggedProvider::Uniform { min, max } => NumberProvider::Uniform {
                min: Box::new(min),
                max: Box::new(max),
            },
            TaggedProvider::Binomial { n, p } => NumberProvider::Binomial {
                n: Box::new(n),
                p: Box::new(p),
            },
            TaggedProvider::Score {
                target,
                score,
                scale,
            } => NumberProvider::Score {
                target,
                score,
                scale,
            },
            TaggedProvider::Storage { storage, path } => NumberProvider::Storage { storage, path },
            TaggedProvider::EnchantmentLevel { amount } => NumberProvider::EnchantmentLevel(amount),
            TaggedProvider::Add { addends } => NumberProvider::Add(addends),
            TaggedProvider::Multiply { factors } => NumberProvider::Multiply(factors),
            TaggedProvider::Reference { id } => NumberProvider::Reference(id),
        }
    }
}

impl TryFrom<Value> for NumberProvider {
    type Error = DocumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(NumberProvider::Constant)
                .ok_or_else(|| DocumentError::Invalid {
                    kind: "number provider",
                    detail: format!("{n} is not representable as f64"),
                }),
            Value::Object(mut map) => {
                let type_name = match map.get("type") {
                    None => "minecraft:uniform".to_string(),
                    Some(Value::String(raw)) => ResourceLocation::new(raw).into(),
                    Some(other) => {
                        return Err(DocumentError::Invalid {
                            kind: "number provider",
                            detail: format!("'type' must be a string, found {other}"),
                        });
                    }
                };
                if !KNOWN_TYPES.contains(&type_name.as_str()) {
                    return Err(DocumentError::UnknownType {
                        kind: "number provider",
                        type_name,
                    });
                }
                map.insert("type".to_string(), Value::String(type_name));
                serde_json::from_value::<TaggedProvider>(Value::Object(map))
                    .map(NumberProvider::from)
                    .map_err(|e| DocumentError::Invalid {
                        kind: "number provider",
                        detail: e.to_string(),
                    })
            }
            other => Err(DocumentError::Invalid {
                kind: "number provider",
                detail: format!("expected a number or an object, found {other}"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a provider to a real number.
///
/// Draws happen in document order, depth-first, on the single `rng`.
pub fn evaluate(
    provider: &NumberProvider,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<f64, GenerationError> {
    match provider {
        NumberProvider::Constant(value) => Ok(*value),
        NumberProvider::Uniform { min, max } => {
            let min = evaluate(min, rng, scope)?;
            let max = evaluate(max, rng, scope)?;
            if max <= min {
                return Ok(min);
            }
            if min.fract() == 0.0 && max.fract() == 0.0 {
                Ok(rng.range_inclusive(min as i64, max as i64) as f64)
            } else {
                Ok(min + rng.next_f64() * (max - min))
            }
        }
        NumberProvider::Binomial { n, p } => {
            let trials = evaluate_int(n, rng, scope)?.max(0);
            let probability = evaluate(p, rng, scope)?;
            if probability <= 0.0 {
                return Ok(0.0);
            }
            if probability >= 1.0 {
                return Ok(trials as f64);
            }
            if trials > EXACT_BINOMIAL_TRIALS {
                tracing::debug!(trials, probability, "approximating binomial with a normal draw");
                let n = trials as f64;
                let mean = n * probability;
                let deviation = (mean * (1.0 - probability)).sqrt();
                return Ok((mean + rng.next_gaussian() * deviation).round().clamp(0.0, n));
            }
            let successes = (0..trials).filter(|_| rng.chance(probability)).count();
            Ok(successes as f64)
        }
        NumberProvider::Score {
            target,
            score,
            scale,
        } => {
            // Missing scoreboard values read as zero, matching the game.
            let value = scope
                .data()
                .and_then(|data| data.score(target, score))
                .unwrap_or(0.0);
            Ok(value * scale.unwrap_or(1.0))
        }
        NumberProvider::Storage { storage, path } => Ok(scope
            .data()
            .and_then(|data| data.storage_value(storage, path))
            .unwrap_or(0.0)),
        // No enchantment is in scope for a trade, so level 1 is used.
        NumberProvider::EnchantmentLevel(amount) => Ok(amount.at_level(1)),
        NumberProvider::Add(addends) => {
            let mut total = 0.0;
            for addend in addends {
                total += evaluate(addend, rng, scope)?;
            }
            Ok(total)
        }
        NumberProvider::Multiply(factors) => {
            let mut product = 1.0;
            for factor in factors {
                product *= evaluate(factor, rng, scope)?;
            }
            Ok(product)
        }
        NumberProvider::Reference(id) => resolve_reference(id, rng, scope),
    }
}

/// Evaluate a provider and round half away from zero.
pub fn evaluate_int(
    provider: &NumberProvider,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<i64, GenerationError> {
    Ok(evaluate(provider, rng, scope)?.round() as i64)
}

/// Look up a reference in the trade scope, then the global registry.
/// The first evaluation is memoized for the rest of the trade.
fn resolve_reference(
    id: &str,
    rng: &mut TradeRng,
    scope: &mut Scope<'_>,
) -> Result<f64, GenerationError> {
    if let Some(value) = scope.resolved_reference(id) {
        return Ok(value);
    }
    let provider = scope
        .lookup_reference(id)
        .ok_or_else(|| GenerationError::UnresolvedReference { id: id.to_string() })?;

    scope.begin_reference(id)?;
    let value = evaluate(provider, rng, scope);
    scope.end_reference(id, value.as_ref().ok().copied());
    value
}
