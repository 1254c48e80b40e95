//! Decodes the model's raw reply into typed field values.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ParseError;

use super::model::FieldValue;
use super::schema::{FieldDescriptor, FieldKind, PreferenceSchema};

/// A fenced code block, optionally tagged `json`.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"));

/// The model's reply decoded against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutput {
    response: String,
    fields: Vec<(String, FieldValue)>,
}

impl ParsedOutput {
    pub fn new(response: impl Into<String>, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            response: response.into(),
            fields,
        }
    }

    /// The bot's conversational reply.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Required field values, in schema order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// Parse raw model text against `schema`.
///
/// Every declared field must be present in the structured block. A field the
/// model could not fill is expected as `""`, `false` or `null`.
pub fn parse(schema: &PreferenceSchema, raw: &str) -> Result<ParsedOutput, ParseError> {
    let block = extract_json_object(raw).ok_or(ParseError::NoStructuredBlock)?;

    let object: Map<String, Value> =
        serde_json::from_str(block).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let mut response = String::new();
    let mut fields = Vec::new();
    for descriptor in schema.fields() {
        let decoded = decode_field(descriptor, &object)?;
        if descriptor.name == schema.response_field().name {
            response = decoded.to_string();
        } else {
            fields.push((descriptor.name.clone(), decoded));
        }
    }

    Ok(ParsedOutput { response, fields })
}

fn decode_field(
    descriptor: &FieldDescriptor,
    object: &Map<String, Value>,
) -> Result<FieldValue, ParseError> {
    let raw = object
        .get(&descriptor.name)
        .ok_or_else(|| ParseError::MissingField(descriptor.name.clone()))?;

    let wrong_type = || ParseError::WrongType {
        field: descriptor.name.clone(),
        expected: descriptor.kind.to_string(),
    };

    match descriptor.kind {
        FieldKind::String => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.trim().to_string())),
            Value::Null => Ok(FieldValue::Text(String::new())),
            _ => Err(wrong_type()),
        },
        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Flag(*b)),
            Value::Null => Ok(FieldValue::Flag(false)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Ok(FieldValue::Flag(true)),
                "false" | "no" | "" => Ok(FieldValue::Flag(false)),
                _ => Err(wrong_type()),
            },
            _ => Err(wrong_type()),
        },
    }
}

/// Locate the JSON object in model output that may wrap it in markdown or prose.
fn extract_json_object(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(captures) = FENCED_BLOCK.captures(trimmed) {
        let inner = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if inner.starts_with('{') {
            return Some(inner);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (end > start).then(|| &trimmed[start..=end])
}
