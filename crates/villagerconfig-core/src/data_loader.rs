//! Loading VillagerConfig documents from JSON.

use crate::document::VillagerConfigDocument;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a document.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("document root must be an object, found {0}")]
    NotAnObject(&'static str),
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a document from a JSON string.
pub fn load_document_json(json: &str) -> Result<VillagerConfigDocument, DataLoadError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    from_value(value)
}

/// Load a document from JSON bytes.
pub fn load_document_json_bytes(bytes: &[u8]) -> Result<VillagerConfigDocument, DataLoadError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    from_value(value)
}

fn from_value(value: serde_json::Value) -> Result<VillagerConfigDocument, DataLoadError> {
    if value.is_object() {
        return Ok(serde_json::from_value(value)?);
    }
    let kind = match &value {
        serde_json::Value::Object(_) => "an object",
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
    };
    Err(DataLoadError::NotAnObject(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::EntryKind;

    const MINIMAL: &str = r#"{
        "tiers": [{
            "total_exp_required": 0,
            "groups": [{
                "num_to_select": 1,
                "trades": [{
                    "cost_a": {"type": "minecraft:item", "name": "minecraft:emerald"},
                    "result": {"type": "minecraft:item", "name": "minecraft:bread"}
                }]
            }]
        }]
    }"#;

    #[test]
    fn load_minimal_document() {
        let doc = load_document_json(MINIMAL).unwrap();
        assert_eq!(doc.tiers.len(), 1);
        let trade = &doc.tiers[0].groups[0].trades[0];
        assert!(matches!(trade.result.kind, EntryKind::Item { ref name } if name.is("bread")));
    }

    #[test]
    fn load_from_bytes() {
        let doc = load_document_json_bytes(MINIMAL.as_bytes()).unwrap();
        assert_eq!(doc.tiers[0].groups[0].trades.len(), 1);
    }

    #[test]
    fn empty_object_has_no_tiers() {
        let doc = load_document_json("{}").unwrap();
        assert!(doc.tiers.is_empty());
    }

    #[test]
    fn invalid_json_returns_error() {
        let result = load_document_json("{ not json }");
        assert!(matches!(result, Err(DataLoadError::JsonParse(_))));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let result = load_document_json("[1, 2]");
        assert!(matches!(result, Err(DataLoadError::NotAnObject("an array"))));
    }

    #[test]
    fn unknown_number_provider_type_is_reported() {
        let json = r#"{"tiers": [{"groups": [{"num_to_select": {"type": "minecraft:gaussian"}}]}]}"#;
        let err = load_document_json(json).unwrap_err();
        assert!(err.to_string().contains("minecraft:gaussian"), "{err}");
    }
}
