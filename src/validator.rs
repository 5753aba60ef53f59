//! Structural validation of package schema documents.
//!
//! Upstream documents are large and loosely typed; checking their top-level
//! shape before deserializing gives a JSON Pointer to the first bad section
//! instead of a bare serde message.

use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{json, Value};

/// A single shape violation with path context.
#[derive(Debug, Clone, Serialize)]
pub struct ShapeError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    pub message: String,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// The minimal shape every package document must have.
fn document_shape() -> &'static Value {
    static SHAPE: OnceLock<Value> = OnceLock::new();
    SHAPE.get_or_init(|| {
        let entry_map = json!({
            "type": "object",
            "additionalProperties": { "type": "object" }
        });
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "version": { "type": "string" },
                "resources": entry_map,
                "types": entry_map,
                "functions": entry_map,
                "language": { "type": "object" }
            }
        })
    })
}

/// Check a raw document against the package document shape.
///
/// Returns every violation found, not just the first.
pub fn validate_document_shape(document: &Value) -> Result<(), Vec<ShapeError>> {
    let validator = jsonschema::validator_for(document_shape()).map_err(|e| {
        vec![ShapeError {
            path: String::new(),
            message: e.to_string(),
        }]
    })?;

    let errors: Vec<ShapeError> = validator
        .iter_errors(document)
        .map(|e| ShapeError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_document() {
        let doc = json!({
            "name": "aws",
            "resources": { "aws:s3/bucket:Bucket": { "inputProperties": {} } },
            "types": {},
            "functions": {}
        });
        assert!(validate_document_shape(&doc).is_ok());
    }

    #[test]
    fn accepts_document_without_sections() {
        assert!(validate_document_shape(&json!({ "name": "docker" })).is_ok());
    }

    #[test]
    fn rejects_non_object_root() {
        let errors = validate_document_shape(&json!(["not", "a", "schema"])).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn reports_path_of_bad_entry() {
        let doc = json!({
            "name": "aws",
            "resources": { "aws:s3/bucket:Bucket": "oops" }
        });
        let errors = validate_document_shape(&doc).unwrap_err();
        assert!(errors[0].path.starts_with("/resources/aws:s3"));
    }

    #[test]
    fn collects_multiple_errors() {
        let doc = json!({ "name": 7, "types": [] });
        let errors = validate_document_shape(&doc).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn shape_error_display() {
        let err = ShapeError {
            path: "/types".into(),
            message: "[] is not of type \"object\"".into(),
        };
        assert_eq!(err.to_string(), "/types: [] is not of type \"object\"");
    }
}
