//! Per-call runtime context: seed, environment and injected collaborators.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mixer::StackMixer;
use crate::number::NumberProvider;
use crate::source::DataSource;

/// Maximum nesting depth for loot tables, tags, predicates and references.
pub const RECURSION_LIMIT: usize = 32;

/// Maximum number of loot-table, tag and predicate expansions per trade.
pub const EXPANSION_LIMIT: usize = 4096;

/// Maximum rolls of a single loot pool.
pub const MAX_POOL_ROLLS: i64 = 256;

/// Game version assumed when none is supplied.
pub const DEFAULT_VERSION: &str = "1.21";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    Thunder,
}

impl Weather {
    pub fn is_raining(self) -> bool {
        matches!(self, Weather::Rain | Weather::Thunder)
    }

    pub fn is_thundering(self) -> bool {
        self == Weather::Thunder
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown weather '{0}', expected clear, rain or thunder")]
pub struct ParseWeatherError(String);

impl FromStr for Weather {
    type Err = ParseWeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(Weather::Clear),
            "rain" => Ok(Weather::Rain),
            "thunder" => Ok(Weather::Thunder),
            other => Err(ParseWeatherError(other.to_string())),
        }
    }
}

/// Everything a generation call needs besides the document.
///
/// Built fresh per call and never persisted. The data source is borrowed, so
/// a single loaded data pack can serve many contexts.
#[derive(Clone)]
pub struct RuntimeContext<'a> {
    pub version: String,
    pub seed: i64,
    pub luck: f64,
    pub daytime: i64,
    pub weather: Weather,
    pub stack_mixer: StackMixer,
    pub accumulated_exp: u32,
    pub references: BTreeMap<String, NumberProvider>,
    pub data: Option<&'a dyn DataSource>,
}

impl Default for RuntimeContext<'_> {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            seed: 0,
            luck: 0.0,
            daytime: 0,
            weather: Weather::Clear,
            stack_mixer: StackMixer::Default,
            accumulated_exp: 0,
            references: BTreeMap::new(),
            data: None,
        }
    }
}

impl<'a> RuntimeContext<'a> {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_luck(mut self, luck: f64) -> Self {
        self.luck = luck;
        self
    }

    pub fn with_daytime(mut self, daytime: i64) -> Self {
        self.daytime = daytime;
        self
    }

    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_stack_mixer(mut self, mixer: StackMixer) -> Self {
        self.stack_mixer = mixer;
        self
    }

    pub fn with_accumulated_exp(mut self, exp: u32) -> Self {
        self.accumulated_exp = exp;
        self
    }

    /// Register a global reference provider, replacing any previous binding.
    pub fn with_reference(mut self, id: impl Into<String>, provider: NumberProvider) -> Self {
        self.references.insert(id.into(), provider);
        self
    }

    pub fn with_data(mut self, data: &'a dyn DataSource) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Debug for RuntimeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("version", &self.version)
            .field("seed", &self.seed)
            .field("luck", &self.luck)
            .field("daytime", &self.daytime)
            .field("weather", &self.weather)
            .field("stack_mixer", &self.stack_mixer)
            .field("accumulated_exp", &self.accumulated_exp)
            .field("references", &self.references.keys().collect::<Vec<_>>())
            .field("data", &self.data.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ctx = RuntimeContext::default();
        assert_eq!(ctx.version, DEFAULT_VERSION);
        assert_eq!(ctx.accumulated_exp, 0);
        assert_eq!(ctx.stack_mixer, StackMixer::Default);
        assert!(ctx.data.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let ctx = RuntimeContext::new(5)
            .with_luck(1.5)
            .with_weather(Weather::Thunder)
            .with_accumulated_exp(70)
            .with_reference("x", NumberProvider::constant(1.0));
        assert_eq!(ctx.seed, 5);
        assert_eq!(ctx.luck, 1.5);
        assert!(ctx.weather.is_raining());
        assert_eq!(ctx.accumulated_exp, 70);
        assert!(ctx.references.contains_key("x"));
    }

    #[test]
    fn weather_parses_case_insensitively() {
        assert_eq!("Rain".parse::<Weather>().unwrap(), Weather::Rain);
        assert!("snow".parse::<Weather>().is_err());
    }

    #[test]
    fn thunder_implies_rain() {
        assert!(Weather::Thunder.is_raining());
        assert!(!Weather::Rain.is_thundering());
        assert!(!Weather::Clear.is_raining());
    }
}
