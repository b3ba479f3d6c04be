//! JSON Schema validation utilities
//!
//! Streamed output is checked twice: every partial snapshot against a relaxed
//! copy of the schema (no `required` constraints, since fields arrive one at a
//! time), and the finished document against the schema as declared.
//!
//! ## Example
//!
//! ```rust
//! use hn_stream::schema::JsonSchemaValidator;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": { "kind": { "enum": ["show", "ask"] } },
//!     "required": ["kind"]
//! });
//! let validator = JsonSchemaValidator::new(&schema).unwrap();
//! assert!(validator.validate(&json!({ "kind": "ask" })).is_ok());
//! assert!(validator.validate(&json!({ "kind": "blog" })).is_err());
//!
//! let partial = JsonSchemaValidator::relaxed(&schema).unwrap();
//! assert!(partial.validate(&json!({})).is_ok());
//! ```

use serde_json::Value;

use crate::error::LlmError;

/// At most this many individual errors are reported per failure.
const MAX_REPORTED_ERRORS: usize = 3;

/// A compiled JSON Schema
pub struct JsonSchemaValidator {
    validator: jsonschema::Validator,
}

impl std::fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// Compile a schema as declared.
    pub fn new(schema: &Value) -> Result<Self, LlmError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|e| LlmError::InvalidInput(format!("Invalid JSON Schema: {e}")))?;

        Ok(Self { validator })
    }

    /// Compile a copy of the schema with every `required` list removed.
    pub fn relaxed(schema: &Value) -> Result<Self, LlmError> {
        Self::new(&relax_required(schema))
    }

    /// Validate an instance, reporting the first few errors with their paths.
    pub fn validate(&self, instance: &Value) -> Result<(), LlmError> {
        if self.validator.is_valid(instance) {
            return Ok(());
        }

        let msgs: Vec<String> = self
            .validator
            .iter_errors(instance)
            .take(MAX_REPORTED_ERRORS)
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect();

        Err(LlmError::SchemaValidationFailure(msgs.join("; ")))
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }
}

/// Return a copy of `schema` with all `required` keyword arrays stripped, at
/// any depth.
///
/// Only array-valued `required` entries are removed, so a property that is
/// itself named `required` survives.
pub fn relax_required(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, value)| !(key.as_str() == "required" && value.is_array()))
                .map(|(key, value)| (key.clone(), relax_required(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(relax_required).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn story_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "stories": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "type": { "type": "string", "enum": ["show", "jobs", "ask", "story"] },
                            "points": { "type": "integer" }
                        },
                        "required": ["title", "type", "points"]
                    }
                }
            },
            "required": ["stories"]
        })
    }

    #[test]
    fn test_full_schema_requires_fields() {
        let validator = JsonSchemaValidator::new(&story_schema()).unwrap();
        let partial = json!({ "stories": [{ "title": "Rust 2.0" }] });
        assert!(matches!(
            validator.validate(&partial),
            Err(LlmError::SchemaValidationFailure(_))
        ));
    }

    #[test]
    fn test_relaxed_schema_accepts_missing_fields() {
        let validator = JsonSchemaValidator::relaxed(&story_schema()).unwrap();
        assert!(validator.is_valid(&json!({})));
        assert!(validator.is_valid(&json!({ "stories": [{ "title": "Rust 2.0" }] })));
    }

    #[test]
    fn test_relaxed_schema_still_checks_enums_and_types() {
        let validator = JsonSchemaValidator::relaxed(&story_schema()).unwrap();
        let bad_enum = json!({ "stories": [{ "type": "blog" }] });
        let err = validator.validate(&bad_enum).unwrap_err();
        assert!(err.to_string().contains("/stories/0/type"), "{err}");
        assert!(!validator.is_valid(&json!({ "stories": [{ "points": "many" }] })));
    }

    #[test]
    fn test_relax_keeps_property_named_required() {
        let schema = json!({
            "type": "object",
            "properties": { "required": { "type": "boolean" } },
            "required": ["required"]
        });
        let relaxed = relax_required(&schema);
        assert!(relaxed.get("required").is_none());
        assert_eq!(relaxed["properties"]["required"]["type"], "boolean");
    }

    #[test]
    fn test_invalid_schema_is_rejected() {
        let err = JsonSchemaValidator::new(&json!({ "type": 12 })).unwrap_err();
        assert!(matches!(err, LlmError::InvalidInput(_)));
    }
}
