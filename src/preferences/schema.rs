//! Field descriptors for the preferences the model is asked to extract.

use std::collections::HashSet;

use crate::error::SchemaError;

/// Primitive type the model must produce for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// Whether a field is the bot's free-text reply or a preference to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Response,
    Required,
}

/// A named, typed, described unit of information to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub description: String,
    pub kind: FieldKind,
    pub role: FieldRole,
}

impl FieldDescriptor {
    pub fn response(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: FieldKind::String,
            role: FieldRole::Response,
        }
    }

    pub fn required(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            role: FieldRole::Required,
        }
    }
}

/// Ordered list of field descriptors with exactly one response field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceSchema {
    fields: Vec<FieldDescriptor>,
}

impl PreferenceSchema {
    /// Build a schema, rejecting duplicate names and anything other than a
    /// single string-typed response field.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        let responses: Vec<&FieldDescriptor> = fields
            .iter()
            .filter(|f| f.role == FieldRole::Response)
            .collect();
        if responses.len() != 1 {
            return Err(SchemaError::ResponseFieldCount(responses.len()));
        }
        if responses[0].kind != FieldKind::String {
            return Err(SchemaError::ResponseNotText(responses[0].name.clone()));
        }

        Ok(Self { fields })
    }

    /// The musician job-search schema.
    pub fn orchestra() -> Self {
        Self {
            fields: vec![
                FieldDescriptor::response(
                    "response",
                    "bot's response to the user's input. Call out if any information is missing.",
                ),
                FieldDescriptor::required(
                    "instrument",
                    "instrument the user plays",
                    FieldKind::String,
                ),
                FieldDescriptor::required("position", "desired position", FieldKind::String),
                FieldDescriptor::required("location", "user's location", FieldKind::String),
                FieldDescriptor::required(
                    "side_gigs",
                    "whether the user is looking for side gigs",
                    FieldKind::Boolean,
                ),
            ],
        }
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The free-text reply field.
    pub fn response_field(&self) -> &FieldDescriptor {
        self.fields
            .iter()
            .find(|f| f.role == FieldRole::Response)
            .unwrap_or(&self.fields[0])
    }

    /// Fields that must be non-empty before collection is complete.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.role == FieldRole::Required)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Natural-language instructions describing the expected reply format.
    pub fn format_instructions(&self) -> String {
        let lines = self
            .fields
            .iter()
            .map(|f| format!("\t\"{}\": {}  // {}", f.name, f.kind, f.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "The output should be a markdown code snippet formatted in the following schema, \
             including the leading and trailing \"```json\" and \"```\":\n\n\
             ```json\n{{\n{lines}\n}}\n```"
        )
    }
}

impl Default for PreferenceSchema {
    fn default() -> Self {
        Self::orchestra()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orchestra_schema_order_and_roles() {
        let schema = PreferenceSchema::orchestra();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["response", "instrument", "position", "location", "side_gigs"]
        );
        assert_eq!(schema.response_field().name, "response");

        let required: Vec<&str> = schema.required_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(required, ["instrument", "position", "location", "side_gigs"]);
        assert_eq!(schema.field("side_gigs").unwrap().kind, FieldKind::Boolean);
    }

    #[test]
    fn orchestra_schema_passes_validation() {
        let schema = PreferenceSchema::orchestra();
        assert_eq!(PreferenceSchema::new(schema.fields().to_vec()), Ok(schema));
    }

    #[test]
    fn format_instructions_list_every_field() {
        let text = PreferenceSchema::orchestra().format_instructions();
        assert!(text.contains("```json"));
        assert!(text.contains("\"instrument\": string  // instrument the user plays"));
        assert!(text.contains("\"side_gigs\": boolean"));
        let response_at = text.find("\"response\"").unwrap();
        let location_at = text.find("\"location\"").unwrap();
        assert!(response_at < location_at);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = PreferenceSchema::new(vec![
            FieldDescriptor::response("response", "reply"),
            FieldDescriptor::required("city", "city", FieldKind::String),
            FieldDescriptor::required("city", "again", FieldKind::String),
        ])
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateField("city".into()));
    }

    #[test]
    fn requires_exactly_one_response_field() {
        let none = PreferenceSchema::new(vec![FieldDescriptor::required(
            "city",
            "city",
            FieldKind::String,
        )]);
        assert_eq!(none, Err(SchemaError::ResponseFieldCount(0)));

        let two = PreferenceSchema::new(vec![
            FieldDescriptor::response("a", "a"),
            FieldDescriptor::response("b", "b"),
        ]);
        assert_eq!(two, Err(SchemaError::ResponseFieldCount(2)));
    }

    #[test]
    fn response_field_must_be_text() {
        let mut reply = FieldDescriptor::response("reply", "reply");
        reply.kind = FieldKind::Boolean;
        assert_eq!(
            PreferenceSchema::new(vec![reply]),
            Err(SchemaError::ResponseNotText("reply".into()))
        );
    }
}
