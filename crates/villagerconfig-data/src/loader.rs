//! Format detection (RON/JSON/TOML), file discovery, and deserialization
//! helpers shared by document, settings and data-pack loading.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use villagerconfig_core::document::VillagerConfigDocument;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while reading documents, settings or data packs.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A document directory was given without naming which document to load.
    #[error("{dir} is a directory; name the profession to load from it")]
    MissingProfession { dir: PathBuf },

    /// The path given as a data pack is not a directory.
    #[error("not a data pack directory: {dir}")]
    NotADirectory { dir: PathBuf },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Deserialize already-read content in the given format. The error is the
/// parser's message.
pub fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}

/// Load a trade document from a `.json`, `.ron` or `.toml` file.
pub fn load_document(path: &Path) -> Result<VillagerConfigDocument, DataLoadError> {
    let document: VillagerConfigDocument = deserialize_file(path)?;
    tracing::debug!(
        file = %path.display(),
        tiers = document.tiers.len(),
        "loaded trade document"
    );
    Ok(document)
}

/// Load the document named `base_name` from `dir`, whatever its format.
pub fn load_document_named(dir: &Path, base_name: &str) -> Result<VillagerConfigDocument, DataLoadError> {
    load_document(&require_data_file(dir, base_name)?)
}

/// Load a document from a file, or from a directory of per-profession
/// documents (`librarian.json`, `farmer.ron`, ...) when `path` is one.
pub fn resolve_document(
    path: &Path,
    profession: Option<&str>,
) -> Result<VillagerConfigDocument, DataLoadError> {
    if !path.is_dir() {
        return load_document(path);
    }
    match profession {
        Some(name) => load_document_named(path, name),
        None => Err(DataLoadError::MissingProfession {
            dir: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "villagerconfig_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const JSON_DOC: &str = r#"{
        "tiers": [{
            "total_exp_required": 0,
            "groups": [{
                "num_to_select": 1,
                "trades": [{
                    "cost_a": {"type": "item", "name": "emerald"},
                    "result": {"type": "item", "name": "diamond"}
                }]
            }]
        }]
    }"#;

    const RON_DOC: &str = r#"(
        tiers: [(
            total_exp_required: 0,
            groups: [(
                num_to_select: 1,
                trades: [(
                    cost_a: {"type": "item", "name": "emerald"},
                    result: {"type": "item", "name": "diamond"},
                )],
            )],
        )],
    )"#;

    const TOML_DOC: &str = r#"
        [[tiers]]
        total_exp_required = 0

        [[tiers.groups]]
        num_to_select = 1

        [[tiers.groups.trades]]
        cost_a = { type = "item", name = "emerald" }
        result = { type = "item", name = "diamond" }
    "#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("trades.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("trades.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("trades.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        assert!(matches!(
            detect_format(Path::new("trades.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("pack.mcmeta")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("trades")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_none_when_absent() {
        let dir = make_test_dir("find_absent");
        assert!(find_data_file(&dir, "librarian").unwrap().is_none());
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_single_match() {
        let dir = make_test_dir("find_single");
        fs::write(dir.join("librarian.ron"), RON_DOC).unwrap();
        let found = find_data_file(&dir, "librarian").unwrap().unwrap();
        assert_eq!(found, dir.join("librarian.ron"));
        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflicting_formats() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("librarian.ron"), RON_DOC).unwrap();
        fs::write(dir.join("librarian.json"), JSON_DOC).unwrap();
        assert!(matches!(
            find_data_file(&dir, "librarian"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");
        let err = require_data_file(&dir, "cleric").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { ref file, .. } if file == "cleric"));
        assert!(err.to_string().contains("cleric"));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_document
    // -----------------------------------------------------------------------

    #[test]
    fn load_document_in_every_format() {
        let dir = make_test_dir("load_formats");
        for (name, content) in [
            ("doc.json", JSON_DOC),
            ("doc.ron", RON_DOC),
            ("doc.toml", TOML_DOC),
        ] {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            let doc = load_document(&path).unwrap();
            assert_eq!(doc.tiers.len(), 1, "{name}");
            assert_eq!(doc.tiers[0].groups[0].trades.len(), 1, "{name}");
        }
        cleanup(&dir);
    }

    #[test]
    fn load_document_formats_agree() {
        let json: VillagerConfigDocument = deserialize_str(JSON_DOC, Format::Json).unwrap();
        let ron: VillagerConfigDocument = deserialize_str(RON_DOC, Format::Ron).unwrap();
        let toml: VillagerConfigDocument = deserialize_str(TOML_DOC, Format::Toml).unwrap();
        assert_eq!(json, ron);
        assert_eq!(json, toml);
    }

    #[test]
    fn load_document_named_finds_extension() {
        let dir = make_test_dir("load_named");
        fs::write(dir.join("farmer.toml"), TOML_DOC).unwrap();
        let doc = load_document_named(&dir, "farmer").unwrap();
        assert_eq!(doc.tiers.len(), 1);
        cleanup(&dir);
    }

    #[test]
    fn resolve_document_accepts_file_or_directory() {
        let dir = make_test_dir("resolve");
        fs::write(dir.join("cleric.ron"), RON_DOC).unwrap();

        let from_file = resolve_document(&dir.join("cleric.ron"), None).unwrap();
        let from_dir = resolve_document(&dir, Some("cleric")).unwrap();
        assert_eq!(from_file, from_dir);

        // The profession is ignored for a plain file.
        assert!(resolve_document(&dir.join("cleric.ron"), Some("farmer")).is_ok());

        assert!(matches!(
            resolve_document(&dir, None),
            Err(DataLoadError::MissingProfession { .. })
        ));
        assert!(matches!(
            resolve_document(&dir, Some("farmer")),
            Err(DataLoadError::MissingRequired { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn load_document_parse_error_names_file() {
        let dir = make_test_dir("load_parse_error");
        let path = dir.join("broken.json");
        fs::write(&path, r#"{"tiers": [{"groups": "nope"}]}"#).unwrap();
        let err = load_document(&path).unwrap_err();
        match err {
            DataLoadError::Parse { file, .. } => assert_eq!(file, path),
            other => panic!("expected parse error, got {other:?}"),
        }
        cleanup(&dir);
    }

    #[test]
    fn load_document_missing_file_is_io() {
        let err = load_document(Path::new("/nonexistent/villagerconfig/doc.json")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io(_)));
    }
}
