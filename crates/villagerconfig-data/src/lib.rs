//! File loading for VillagerConfig previews.
//!
//! Reads trade documents and preview settings from RON, JSON or TOML files,
//! and walks data-pack directories into an
//! [`InMemoryDataSource`](villagerconfig_core::source::InMemoryDataSource).

pub mod loader;
pub mod pack;
pub mod schema;
pub mod settings;

pub use loader::{DataLoadError, load_document, resolve_document};
pub use pack::load_data_pack;
pub use settings::PreviewSettings;
