//! Data-pack directory loading.
//!
//! A pack is read as `<root>/[data/]<namespace>/<category>/**/*.json`. Each
//! file's id is its namespace plus its path below the category folder, minus
//! the extension: `minecraft/tags/item/enchantable/mining.json` becomes the
//! item tag `minecraft:enchantable/mining`. Both the current singular folder
//! names and the pre-1.21 plural ones are recognized.

use std::fs;
use std::path::{Path, PathBuf};

use villagerconfig_core::id::ResourceLocation;
use villagerconfig_core::item::ComponentMap;
use villagerconfig_core::loot::LootTable;
use villagerconfig_core::source::InMemoryDataSource;

use crate::loader::{DataLoadError, deserialize_file, detect_format};
use crate::schema::{EnchantmentFile, PredicateFile, TagFile};

// ===========================================================================
// Categories
// ===========================================================================

/// The kinds of pack content a trade preview reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ItemTag,
    EnchantmentTag,
    Enchantment,
    LootTable,
    Predicate,
    ItemComponents,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::ItemTag,
        Category::EnchantmentTag,
        Category::Enchantment,
        Category::LootTable,
        Category::Predicate,
        Category::ItemComponents,
    ];

    /// Folder names below a namespace, newest layout first.
    pub fn folders(self) -> &'static [&'static str] {
        match self {
            Category::ItemTag => &["tags/item", "tags/items"],
            Category::EnchantmentTag => &["tags/enchantment", "tags/enchantments"],
            Category::Enchantment => &["enchantment", "enchantments"],
            Category::LootTable => &["loot_table", "loot_tables"],
            Category::Predicate => &["predicate", "predicates"],
            Category::ItemComponents => &["item_components"],
        }
    }
}

// ===========================================================================
// Loading
// ===========================================================================

/// Load every recognized file under `dir` into a fresh data source.
pub fn load_data_pack(dir: &Path) -> Result<InMemoryDataSource, DataLoadError> {
    let mut source = InMemoryDataSource::new();
    load_data_pack_into(dir, &mut source)?;
    Ok(source)
}

/// Load a pack on top of an existing source. Tags merge (or replace when
/// the file says so); other entries overwrite by id.
pub fn load_data_pack_into(dir: &Path, source: &mut InMemoryDataSource) -> Result<(), DataLoadError> {
    if !dir.is_dir() {
        return Err(DataLoadError::NotADirectory {
            dir: dir.to_path_buf(),
        });
    }
    let root = if dir.join("data").is_dir() {
        dir.join("data")
    } else {
        dir.to_path_buf()
    };

    for namespace_dir in sorted_entries(&root)? {
        if !namespace_dir.is_dir() {
            continue;
        }
        let Some(namespace) = namespace_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let mut files = 0;
        for category in Category::ALL {
            for folder in category.folders() {
                let base = namespace_dir.join(folder);
                if !base.is_dir() {
                    continue;
                }
                let mut paths = Vec::new();
                collect_files(&base, &mut paths)?;
                for path in &paths {
                    let id = resource_id(namespace, &base, path);
                    load_file(category, id, path, source)?;
                }
                files += paths.len();
            }
        }
        tracing::debug!(namespace, files, "loaded data-pack namespace");
    }

    let counts = source.counts();
    tracing::info!(
        pack = %dir.display(),
        item_tags = counts.item_tags,
        enchantment_tags = counts.enchantment_tags,
        enchantments = counts.enchantments,
        loot_tables = counts.loot_tables,
        predicates = counts.predicates,
        item_components = counts.item_components,
        "loaded data pack"
    );
    Ok(())
}

fn load_file(
    category: Category,
    id: ResourceLocation,
    path: &Path,
    source: &mut InMemoryDataSource,
) -> Result<(), DataLoadError> {
    match category {
        Category::ItemTag => {
            let file: TagFile = deserialize_file(path)?;
            source.insert_item_tag(id, file.members(), file.replace);
        }
        Category::EnchantmentTag => {
            let file: TagFile = deserialize_file(path)?;
            source.insert_enchantment_tag(id, file.members(), file.replace);
        }
        Category::Enchantment => {
            let file: EnchantmentFile = deserialize_file(path)?;
            source.insert_enchantment(file.into_enchantment(id));
        }
        Category::LootTable => {
            let table: LootTable = deserialize_file(path)?;
            source.insert_loot_table(id, table);
        }
        Category::Predicate => {
            let file: PredicateFile = deserialize_file(path)?;
            source.insert_predicate(id, file.into_condition());
        }
        Category::ItemComponents => {
            let components: ComponentMap = deserialize_file(path)?;
            source.insert_item_components(id, components);
        }
    }
    Ok(())
}

// ===========================================================================
// Directory walking
// ===========================================================================

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DataLoadError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

/// Recursively gather loadable files in a stable order. Files with other
/// extensions are skipped.
fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DataLoadError> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if detect_format(&path).is_ok() {
            out.push(path);
        }
    }
    Ok(())
}

fn resource_id(namespace: &str, base: &Path, file: &Path) -> ResourceLocation {
    let relative = file.strip_prefix(base).unwrap_or(file).with_extension("");
    let path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    ResourceLocation::new(&format!("{namespace}:{path}"))
}
