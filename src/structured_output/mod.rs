//! Structured output decoding
//!
//! Turns the raw text a model streams back (tool-call arguments or message
//! content) into JSON values that conform to an [`OutputSchema`].
//!
//! - `decode_partial`: close the prefix seen so far and check it against the
//!   relaxed schema. Returns `Ok(None)` while there is nothing usable yet.
//! - `decode_final`: parse the complete text (with light repair) and check it
//!   against the schema as declared.

pub mod partial;

pub use partial::close_partial_json;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LlmError;
use crate::schema::JsonSchemaValidator;
use crate::types::OutputSchema;

/// User-provided text repair hook, tried on the final text when it fails to parse.
pub type RepairFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

const DEFAULT_MAX_REPAIR_ROUNDS: usize = 1;

/// Decoder bound to one output schema.
pub struct StructuredDecoder {
    full: JsonSchemaValidator,
    partial: JsonSchemaValidator,
    repair_text: Option<RepairFn>,
    max_repair_rounds: usize,
}

impl std::fmt::Debug for StructuredDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredDecoder")
            .field("custom_repair", &self.repair_text.is_some())
            .field("max_repair_rounds", &self.max_repair_rounds)
            .finish_non_exhaustive()
    }
}

impl StructuredDecoder {
    /// Compile both validators for `output`.
    pub fn new(output: &OutputSchema) -> Result<Self, LlmError> {
        Ok(Self {
            full: JsonSchemaValidator::new(&output.schema)?,
            partial: JsonSchemaValidator::relaxed(&output.schema)?,
            repair_text: None,
            max_repair_rounds: DEFAULT_MAX_REPAIR_ROUNDS,
        })
    }

    pub fn with_repair(mut self, repair: RepairFn) -> Self {
        self.repair_text = Some(repair);
        self
    }

    pub const fn with_max_repair_rounds(mut self, rounds: usize) -> Self {
        self.max_repair_rounds = rounds;
        self
    }

    /// Best-effort decode of an incomplete buffer.
    ///
    /// A buffer that cannot be closed into valid JSON yet yields `Ok(None)`.
    /// A closed value that breaks the relaxed schema (wrong type, value outside
    /// an enum) is a `SchemaValidationFailure`: more text can only add to it.
    pub fn decode_partial(&self, text: &str) -> Result<Option<Value>, LlmError> {
        let Some(closed) = close_partial_json(text) else {
            return Ok(None);
        };
        let Ok(value) = serde_json::from_str::<Value>(&strip_trailing_commas(&closed)) else {
            return Ok(None);
        };
        self.partial.validate(&value)?;
        Ok(Some(value))
    }

    /// Decode the complete output text and validate it against the full schema.
    pub fn decode_final(&self, text: &str) -> Result<Value, LlmError> {
        let mut current = text.to_string();
        let mut rounds = 0usize;

        loop {
            match self.parse_once(&current) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if rounds >= self.max_repair_rounds {
                        return Err(e);
                    }
                    let repaired = match &self.repair_text {
                        Some(repair) => repair(&current),
                        None => default_repair_text(&current),
                    };
                    match repaired {
                        Some(next) if next != current => {
                            current = next;
                            rounds += 1;
                        }
                        _ => return Err(e),
                    }
                }
            }
        }
    }

    fn parse_once(&self, text: &str) -> Result<Value, LlmError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            LlmError::SchemaValidationFailure(format!("Output is not valid JSON: {e}"))
        })?;
        self.full.validate(&value)?;
        Ok(value)
    }
}

/// Convert a validated value into the caller's type.
pub fn decode_typed<T: DeserializeOwned>(value: Value) -> Result<T, LlmError> {
    serde_json::from_value::<T>(value).map_err(|e| {
        LlmError::SchemaValidationFailure(format!("Failed to deserialize object: {e}"))
    })
}

/// Strip markdown fences, trim to the first balanced JSON block and drop
/// trailing commas.
pub(crate) fn default_repair_text(text: &str) -> Option<String> {
    let mut s = text.trim();
    if s.starts_with("```") {
        s = s.split_once('\n').map_or("", |(_, rest)| rest);
    }
    if let Some(idx) = s.rfind("```") {
        s = &s[..idx];
    }
    extract_balanced_json_slice(s).map(strip_trailing_commas)
}

/// First balanced `{...}` or `[...]` block in `text`, ignoring brackets
/// inside string literals.
pub(crate) fn extract_balanced_json_slice(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escape = false;

    for (i, c) in text[start..].char_indices() {
        if in_str {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return text.get(start..=start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove commas that directly precede `}` or `]`, outside string literals.
pub(crate) fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_str = false;
    let mut escape = false;

    while let Some(c) = chars.next() {
        if in_str {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                in_str = true;
                out.push(c);
            }
            ',' => {
                let rest = chars.clone().find(|n| !n.is_whitespace());
                if !matches!(rest, Some('}' | ']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}
