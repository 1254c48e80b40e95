//! Preference values and the accumulated preference record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::parser::ParsedOutput;
use super::schema::{FieldKind, PreferenceSchema};

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// The empty value for a field kind.
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::String => Self::Text(String::new()),
            FieldKind::Boolean => Self::Flag(false),
        }
    }

    /// Non-empty text or `true`.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Flag(b) => *b,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Flag(true) => write!(f, "yes"),
            Self::Flag(false) => write!(f, "no"),
        }
    }
}

/// Current value of every required field. Keys are never removed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceRecord {
    values: BTreeMap<String, FieldValue>,
}

impl PreferenceRecord {
    /// A record holding the empty value for each required field.
    pub fn new(schema: &PreferenceSchema) -> Self {
        let values = schema
            .required_fields()
            .map(|f| (f.name.clone(), FieldValue::empty(f.kind)))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge parsed output, taking only non-empty values for known fields.
    ///
    /// Returns the names of the fields whose value changed.
    pub fn merge(&mut self, parsed: &ParsedOutput) -> Vec<String> {
        let mut updated = Vec::new();
        for (name, value) in parsed.fields() {
            if !value.is_filled() {
                continue;
            }
            if let Some(slot) = self.values.get_mut(name) {
                if slot != value {
                    *slot = value.clone();
                    updated.push(name.clone());
                }
            }
        }
        updated
    }

    /// Required fields still empty, in schema order.
    pub fn missing_fields(&self, schema: &PreferenceSchema) -> Vec<String> {
        schema
            .required_fields()
            .filter(|f| !self.values.get(&f.name).is_some_and(FieldValue::is_filled))
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.values.values().filter(|v| v.is_filled()).count()
    }

    pub fn is_complete(&self, schema: &PreferenceSchema) -> bool {
        self.missing_fields(schema).is_empty()
    }
}
