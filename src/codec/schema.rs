//! Structural contracts for wire data.
//!
//! A `MementoSchema` lists the fields a memento expects and their JSON shape. Validation
//! walks the whole payload and reports every violation with a dotted path instead of
//! stopping at the first one, so a caller can fix a request in one round trip.

use chrono::DateTime;
use serde_json::Value;
use std::collections::HashSet;

/// Expected shape of a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Boolean,
    Integer,
    Number,
    Text,
    /// RFC 3339 timestamp carried as text.
    Timestamp,
    /// Text restricted to a closed set of names.
    Enum(Vec<&'static str>),
    ArrayOf(Box<FieldType>),
    Object(Box<MementoSchema>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldContract {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MementoSchema {
    pub fields: Vec<FieldContract>,
    pub allow_extra_fields: bool,
}

impl MementoSchema {
    pub fn object() -> Self {
        Self {
            fields: Vec::new(),
            allow_extra_fields: true,
        }
    }

    pub fn require(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.push(FieldContract {
            name,
            field_type,
            required: true,
            nullable: false,
        });
        self
    }

    pub fn optional(mut self, name: &'static str, field_type: FieldType) -> Self {
        self.fields.push(FieldContract {
            name,
            field_type,
            required: false,
            nullable: true,
        });
        self
    }

    pub fn allow_extra_fields(mut self, allow: bool) -> Self {
        self.allow_extra_fields = allow;
        self
    }

    pub fn validate(&self, payload: &Value) -> Vec<String> {
        let mut violations = Vec::new();
        self.validate_at("", payload, &mut violations);
        violations
    }

    fn validate_at(&self, path: &str, payload: &Value, violations: &mut Vec<String>) {
        let Some(object) = payload.as_object() else {
            violations.push(format!(
                "{}: expected object, got {}",
                display_path(path),
                json_type_name(payload)
            ));
            return;
        };

        let mut declared = HashSet::new();
        for field in &self.fields {
            declared.insert(field.name);
            let field_path = join_path(path, field.name);

            match object.get(field.name) {
                None if field.required => {
                    violations.push(format!("{field_path}: missing required field"));
                }
                None => {}
                Some(Value::Null) if field.nullable => {}
                Some(Value::Null) => {
                    violations.push(format!("{field_path}: must not be null"));
                }
                Some(value) => check_type(&field_path, &field.field_type, value, violations),
            }
        }

        if !self.allow_extra_fields {
            for key in object.keys() {
                if !declared.contains(key.as_str()) {
                    violations.push(format!("{}: unexpected field", join_path(path, key)));
                }
            }
        }
    }
}

fn check_type(path: &str, field_type: &FieldType, value: &Value, violations: &mut Vec<String>) {
    let mismatch = |expected: &str, violations: &mut Vec<String>| {
        violations.push(format!(
            "{path}: expected {expected}, got {}",
            json_type_name(value)
        ));
    };

    match field_type {
        FieldType::Boolean => {
            if !value.is_boolean() {
                mismatch("boolean", violations);
            }
        }
        FieldType::Integer => {
            if value.as_u64().is_none() && value.as_i64().is_none() {
                mismatch("integer", violations);
            }
        }
        FieldType::Number => {
            if !value.is_number() {
                mismatch("number", violations);
            }
        }
        FieldType::Text => {
            if !value.is_string() {
                mismatch("text", violations);
            }
        }
        FieldType::Timestamp => match value.as_str() {
            Some(text) => {
                if DateTime::parse_from_rfc3339(text).is_err() {
                    violations.push(format!("{path}: '{text}' is not an RFC 3339 timestamp"));
                }
            }
            None => mismatch("timestamp text", violations),
        },
        FieldType::Enum(names) => match value.as_str() {
            Some(text) => {
                if !names.contains(&text) {
                    violations.push(format!(
                        "{path}: '{text}' is not one of [{}]",
                        names.join(", ")
                    ));
                }
            }
            None => mismatch("text", violations),
        },
        FieldType::ArrayOf(item_type) => match value.as_array() {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    check_type(&format!("{path}[{index}]"), item_type, item, violations);
                }
            }
            None => mismatch("array", violations),
        },
        FieldType::Object(schema) => schema.validate_at(path, value, violations),
    }
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

/// Returns a human-readable name for the JSON value's type.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quantity_schema() -> MementoSchema {
        MementoSchema::object()
            .require("amount", FieldType::Number)
            .require("unit", FieldType::Enum(vec!["kg", "lb"]))
    }

    #[test]
    fn collects_all_violations_with_paths() {
        let schema = MementoSchema::object()
            .require("name", FieldType::Text)
            .require("quantity", FieldType::Object(Box::new(quantity_schema())))
            .require("tags", FieldType::ArrayOf(Box::new(FieldType::Text)))
            .optional("bio", FieldType::Text);

        let violations = schema.validate(&json!({
            "quantity": {"amount": "heavy", "unit": "stone"},
            "tags": ["ok", 3],
            "bio": null
        }));

        assert_eq!(
            violations,
            vec![
                "name: missing required field".to_string(),
                "quantity.amount: expected number, got text".to_string(),
                "quantity.unit: 'stone' is not one of [kg, lb]".to_string(),
                "tags[1]: expected text, got integer".to_string(),
            ]
        );
    }

    #[test]
    fn required_fields_reject_null() {
        let schema = MementoSchema::object().require("name", FieldType::Text);
        assert_eq!(
            schema.validate(&json!({"name": null})),
            vec!["name: must not be null".to_string()]
        );
    }

    #[test]
    fn extra_fields_can_be_forbidden() {
        let schema = MementoSchema::object()
            .require("name", FieldType::Text)
            .allow_extra_fields(false);
        assert_eq!(
            schema.validate(&json!({"name": "a", "nmae": "b"})),
            vec!["nmae: unexpected field".to_string()]
        );
    }

    #[test]
    fn timestamps_must_parse() {
        let schema = MementoSchema::object().require("at", FieldType::Timestamp);
        assert!(schema.validate(&json!({"at": "2024-05-01T10:00:00Z"})).is_empty());
        assert_eq!(schema.validate(&json!({"at": "yesterday"})).len(), 1);
    }

    #[test]
    fn root_must_be_an_object() {
        let schema = MementoSchema::object();
        assert_eq!(
            schema.validate(&json!([1, 2])),
            vec!["<root>: expected object, got array".to_string()]
        );
    }
}
