//! Asset write model and the validation gate in front of persistence.
//!
//! An asset is identified by its natural key (`type`, `source`,
//! `identifiers`). Writes sharing a key overwrite each other, so the checks
//! here make the key well-formed and reject anything PostgreSQL would refuse
//! to store: NUL characters in any text, and keys too large for the
//! natural-key index.
//!
//! Single records and batches go through separate entry points
//! ([`validate_asset`] and [`validate_batch`]) so handlers never have to
//! inspect the payload shape at runtime.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

/// Maximum number of assets accepted in a single bulk upsert.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Maximum length of `type` and `source`, in characters.
pub const MAX_KEY_FIELD_LENGTH: usize = 256;

/// Maximum number of identifiers per asset.
pub const MAX_IDENTIFIERS: usize = 32;

/// Maximum length of a single identifier, in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Maximum combined UTF-8 size of the natural key fields.
///
/// PostgreSQL refuses btree index rows above 2704 bytes; this leaves room for
/// the tuple and array headers of `uq_assets_natural_key`.
pub const MAX_KEY_BYTES: usize = 2048;

// ---------------------------------------------------------------------------
// Write model
// ---------------------------------------------------------------------------

/// One catalog entry as submitted by a client.
///
/// Missing or `null` fields deserialize to their empty defaults so that
/// required-field violations surface as validation errors rather than
/// body-parsing errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_key_size"))]
pub struct Asset {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    #[validate(
        length(max = 256, message = "must be at most 256 characters"),
        custom(function = "validate_key_text")
    )]
    pub asset_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(
        length(max = 256, message = "must be at most 256 characters"),
        custom(function = "validate_key_text")
    )]
    pub source: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(
        length(max = 32, message = "must contain at most 32 identifiers"),
        custom(function = "validate_identifiers")
    )]
    pub identifiers: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_text"))]
    pub doc: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_components"))]
    pub components: Vec<Map<String, Value>>,

    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(custom(function = "validate_properties"))]
    pub properties: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn nul_error() -> ValidationError {
    ValidationError::new("nul").with_message(Cow::Borrowed("must not contain NUL characters"))
}

fn validate_text(value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(nul_error());
    }
    Ok(())
}

fn validate_key_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be blank")));
    }
    validate_text(value)
}

fn validate_identifiers(identifiers: &[String]) -> Result<(), ValidationError> {
    if identifiers.is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("must contain at least one identifier")));
    }
    for (index, id) in identifiers.iter().enumerate() {
        if id.trim().is_empty() {
            return Err(ValidationError::new("blank")
                .with_message(Cow::Owned(format!("identifier at index {index} must not be blank"))));
        }
        if id.chars().count() > MAX_IDENTIFIER_LENGTH {
            return Err(ValidationError::new("length").with_message(Cow::Owned(format!(
                "identifier at index {index} must be at most {MAX_IDENTIFIER_LENGTH} characters"
            ))));
        }
        if id.contains('\0') {
            return Err(ValidationError::new("nul").with_message(Cow::Owned(format!(
                "identifier at index {index} must not contain NUL characters"
            ))));
        }
    }
    Ok(())
}

/// True if any key or string value anywhere in `value` holds a NUL.
fn json_contains_nul(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains('\0'),
        Value::Array(items) => items.iter().any(json_contains_nul),
        Value::Object(map) => map_contains_nul(map),
        _ => false,
    }
}

fn map_contains_nul(map: &Map<String, Value>) -> bool {
    map.iter()
        .any(|(key, value)| key.contains('\0') || json_contains_nul(value))
}

fn validate_properties(properties: &Map<String, Value>) -> Result<(), ValidationError> {
    if map_contains_nul(properties) {
        return Err(nul_error());
    }
    Ok(())
}

fn validate_components(components: &[Map<String, Value>]) -> Result<(), ValidationError> {
    if let Some(index) = components.iter().position(map_contains_nul) {
        return Err(ValidationError::new("nul").with_message(Cow::Owned(format!(
            "component at index {index} must not contain NUL characters"
        ))));
    }
    Ok(())
}

fn validate_key_size(asset: &Asset) -> Result<(), ValidationError> {
    let bytes = asset.asset_type.len()
        + asset.source.len()
        + asset.identifiers.iter().map(String::len).sum::<usize>();
    if bytes > MAX_KEY_BYTES {
        return Err(ValidationError::new("key_size").with_message(Cow::Owned(format!(
            "type, source and identifiers together must be at most {MAX_KEY_BYTES} bytes, got {bytes}"
        ))));
    }
    Ok(())
}

/// Flatten `validator` output into a single stable, human-readable message.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            // Struct-level rules report under `__all__`.
            let field: &str = if *field == "__all__" { "key" } else { &**field };
            errs.iter().map(move |e| {
                let message = e.message.as_deref().unwrap_or(&*e.code);
                format!("{field}: {message}")
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate a single asset before it is upserted.
pub fn validate_asset(asset: &Asset) -> Result<(), CoreError> {
    asset
        .validate()
        .map_err(|e| CoreError::Validation(describe(&e)))
}

/// Validate a bulk payload before it is upserted.
///
/// The batch must be non-empty and at most [`MAX_BATCH_SIZE`] records. The
/// first invalid record is reported by its zero-based position.
pub fn validate_batch(assets: &[Asset]) -> Result<(), CoreError> {
    if assets.is_empty() {
        return Err(CoreError::Validation(
            "batch must contain at least one asset".to_string(),
        ));
    }
    if assets.len() > MAX_BATCH_SIZE {
        return Err(CoreError::Validation(format!(
            "batch must contain at most {MAX_BATCH_SIZE} assets, got {}",
            assets.len()
        )));
    }
    for (position, asset) in assets.iter().enumerate() {
        asset
            .validate()
            .map_err(|e| CoreError::Validation(format!("assets[{position}]: {}", describe(&e))))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn table(identifier: &str) -> Asset {
        Asset {
            asset_type: "table".to_string(),
            source: "warehouse".to_string(),
            identifiers: vec![identifier.to_string()],
            doc: "orders table".to_string(),
            ..Asset::default()
        }
    }

    // -- deserialization -----------------------------------------------------

    #[test]
    fn deserializes_full_payload() {
        let asset: Asset = serde_json::from_value(json!({
            "type": "table",
            "source": "warehouse",
            "identifiers": ["db.schema.tbl"],
            "doc": "orders table",
            "components": [{"name": "id", "kind": "bigint"}],
            "properties": {"owner": "data-eng", "rows": 42}
        }))
        .unwrap();

        assert_eq!(asset.asset_type, "table");
        assert_eq!(asset.identifiers, vec!["db.schema.tbl"]);
        assert_eq!(asset.components.len(), 1);
        assert_eq!(asset.components[0]["kind"], "bigint");
        assert_eq!(asset.properties["rows"], 42);
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let asset: Asset = serde_json::from_value(json!({
            "type": "table",
            "source": "warehouse",
            "identifiers": ["a"]
        }))
        .unwrap();

        assert_eq!(asset.doc, "");
        assert!(asset.components.is_empty());
        assert!(asset.properties.is_empty());
    }

    #[test]
    fn null_fields_default_to_empty() {
        let asset: Asset = serde_json::from_value(json!({
            "type": "table",
            "source": "warehouse",
            "identifiers": ["a"],
            "doc": null,
            "components": null,
            "properties": null
        }))
        .unwrap();

        assert_eq!(asset.doc, "");
        assert!(asset.components.is_empty());
        assert!(asset.properties.is_empty());
    }

    #[test]
    fn missing_identifiers_deserialize_then_fail_validation() {
        let asset: Asset =
            serde_json::from_value(json!({"type": "table", "source": "warehouse"})).unwrap();

        assert!(asset.identifiers.is_empty());
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("identifiers")
        );
    }

    #[test]
    fn serializes_type_field_name() {
        let value = serde_json::to_value(table("a")).unwrap();
        assert_eq!(value["type"], "table");
        assert!(value.get("asset_type").is_none());
    }

    // -- validate_asset ------------------------------------------------------

    #[test]
    fn accepts_minimal_asset() {
        assert!(validate_asset(&table("db.schema.tbl")).is_ok());
    }

    #[test]
    fn rejects_blank_type() {
        let asset = Asset {
            asset_type: "   ".to_string(),
            ..table("a")
        };
        assert_matches!(validate_asset(&asset), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_empty_source() {
        let asset = Asset {
            source: String::new(),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("source")
        );
    }

    #[test]
    fn rejects_empty_identifiers() {
        let asset = Asset {
            identifiers: Vec::new(),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("at least one identifier")
        );
    }

    #[test]
    fn rejects_blank_identifier_element() {
        let asset = Asset {
            identifiers: vec!["ok".to_string(), "".to_string()],
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("index 1")
        );
    }

    #[test]
    fn reports_every_failing_field() {
        let err = validate_asset(&Asset::default()).unwrap_err();
        let CoreError::Validation(msg) = err;
        assert!(msg.contains("source"), "got: {msg}");
        assert!(msg.contains("identifiers"), "got: {msg}");
    }

    // -- store compatibility -------------------------------------------------

    #[test]
    fn rejects_nul_in_doc() {
        let asset = Asset {
            doc: "orders\0table".to_string(),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("doc") && msg.contains("NUL")
        );
    }

    #[test]
    fn rejects_nul_in_key_fields() {
        let bad_type = Asset {
            asset_type: "ta\0ble".to_string(),
            ..table("a")
        };
        let bad_identifier = table("db\0tbl");

        assert_matches!(validate_asset(&bad_type), Err(CoreError::Validation(_)));
        assert_matches!(
            validate_asset(&bad_identifier),
            Err(CoreError::Validation(msg)) if msg.contains("index 0")
        );
    }

    #[test]
    fn rejects_nul_nested_in_json() {
        let mut in_property = table("a");
        in_property.properties = json!({"owner": {"team": "data\0eng"}})
            .as_object()
            .unwrap()
            .clone();

        let mut in_component_key = table("a");
        in_component_key.components = vec![
            json!({"name": "id"}).as_object().unwrap().clone(),
            json!({"co\0l": "x"}).as_object().unwrap().clone(),
        ];

        assert_matches!(
            validate_asset(&in_property),
            Err(CoreError::Validation(msg)) if msg.contains("properties")
        );
        assert_matches!(
            validate_asset(&in_component_key),
            Err(CoreError::Validation(msg)) if msg.contains("component at index 1")
        );
    }

    #[test]
    fn accepts_key_fields_at_length_limits() {
        let asset = Asset {
            asset_type: "t".repeat(MAX_KEY_FIELD_LENGTH),
            source: "s".repeat(MAX_KEY_FIELD_LENGTH),
            identifiers: vec!["i".repeat(MAX_IDENTIFIER_LENGTH)],
            ..Asset::default()
        };
        assert!(validate_asset(&asset).is_ok());
    }

    #[test]
    fn rejects_overlong_source() {
        let asset = Asset {
            source: "s".repeat(MAX_KEY_FIELD_LENGTH + 1),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("source")
        );
    }

    #[test]
    fn rejects_overlong_identifier() {
        let asset = table(&"x".repeat(4000));
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("identifier at index 0")
        );
    }

    #[test]
    fn rejects_too_many_identifiers() {
        let asset = Asset {
            identifiers: (0..=MAX_IDENTIFIERS).map(|i| format!("id{i}")).collect(),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.contains("identifiers")
        );
    }

    #[test]
    fn rejects_key_over_byte_budget() {
        // Each field is within its own limit; the tuple as a whole is not.
        let asset = Asset {
            identifiers: (0..10).map(|_| "i".repeat(MAX_IDENTIFIER_LENGTH)).collect(),
            ..table("a")
        };
        assert_matches!(
            validate_asset(&asset),
            Err(CoreError::Validation(msg)) if msg.starts_with("key:") && msg.contains("bytes")
        );
    }

    #[test]
    fn key_byte_budget_counts_utf8_bytes() {
        // 256 characters, 1024 bytes each.
        let wide = "\u{1F600}".repeat(MAX_IDENTIFIER_LENGTH);
        let asset = Asset {
            identifiers: vec![wide.clone(), wide],
            ..table("a")
        };
        assert_matches!(validate_asset(&asset), Err(CoreError::Validation(_)));
    }

    // -- validate_batch ------------------------------------------------------

    #[test]
    fn accepts_valid_batch() {
        assert!(validate_batch(&[table("a"), table("b")]).is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        assert_matches!(validate_batch(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_oversized_batch() {
        let batch = vec![table("a"); MAX_BATCH_SIZE + 1];
        assert_matches!(validate_batch(&batch), Err(CoreError::Validation(_)));
    }

    #[test]
    fn accepts_batch_at_max_size() {
        let batch = vec![table("a"); MAX_BATCH_SIZE];
        assert!(validate_batch(&batch).is_ok());
    }

    #[test]
    fn batch_error_names_first_invalid_position() {
        let bad = Asset {
            identifiers: Vec::new(),
            ..table("x")
        };
        let batch = [table("a"), table("b"), bad.clone(), bad];
        assert_matches!(
            validate_batch(&batch),
            Err(CoreError::Validation(msg)) if msg.starts_with("assets[2]:")
        );
    }
}
