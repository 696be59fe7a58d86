//! Preview settings files.
//!
//! A settings file fills in the [`RuntimeContext`] a preview runs with, and
//! can seed the data source with scoreboard and storage values. Every field
//! is optional; unset fields keep the context defaults.
//!
//! ```text
//! (
//!     seed: Some(42),
//!     accumulated_exp: Some(70),
//!     weather: Some(rain),
//!     references: {"price": 12},
//!     scores: [(holder: "@s", objective: "reputation", value: 5)],
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use villagerconfig_core::context::{RuntimeContext, Weather};
use villagerconfig_core::id::ResourceLocation;
use villagerconfig_core::mixer::StackMixer;
use villagerconfig_core::number::NumberProvider;
use villagerconfig_core::source::InMemoryDataSource;

use crate::loader::{DataLoadError, deserialize_file};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewSettings {
    pub version: Option<String>,
    pub seed: Option<i64>,
    pub luck: Option<f64>,
    pub daytime: Option<i64>,
    pub weather: Option<Weather>,
    pub stack_mixer: Option<StackMixer>,
    pub accumulated_exp: Option<u32>,
    /// Global bindings for `villagerconfig:reference` providers.
    pub references: BTreeMap<String, NumberProvider>,
    pub scores: Vec<ScoreSetting>,
    pub storage: Vec<StorageSetting>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreSetting {
    pub holder: String,
    pub objective: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageSetting {
    pub storage: ResourceLocation,
    pub path: String,
    pub value: f64,
}

impl PreviewSettings {
    /// Read settings from a `.ron`, `.json` or `.toml` file.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        deserialize_file(path)
    }

    /// Overlay the set fields onto `context`.
    pub fn apply<'a>(&self, mut context: RuntimeContext<'a>) -> RuntimeContext<'a> {
        if let Some(version) = &self.version {
            context.version = version.clone();
        }
        if let Some(seed) = self.seed {
            context.seed = seed;
        }
        if let Some(luck) = self.luck {
            context.luck = luck;
        }
        if let Some(daytime) = self.daytime {
            context.daytime = daytime;
        }
        if let Some(weather) = self.weather {
            context.weather = weather;
        }
        if let Some(mixer) = self.stack_mixer {
            context.stack_mixer = mixer;
        }
        if let Some(exp) = self.accumulated_exp {
            context.accumulated_exp = exp;
        }
        context.references.extend(
            self.references
                .iter()
                .map(|(id, provider)| (id.clone(), provider.clone())),
        );
        context
    }

    /// Add the configured scores and storage values to `source`.
    pub fn apply_to_source(&self, source: &mut InMemoryDataSource) {
        for score in &self.scores {
            source.insert_score(&score.holder, &score.objective, score.value);
        }
        for entry in &self.storage {
            source.insert_storage_value(entry.storage.clone(), &entry.path, entry.value);
        }
    }
}
