//! Dynamic log-book templates.
//!
//! A template schema is a JSON document made of named groups, each holding an
//! ordered list of typed field definitions. The schema drives two checks:
//!
//! * [`TemplateSchema::validate`] - structural validation when a template is
//!   written (shape, unique names, select options, compilable patterns);
//! * [`TemplateSchema::validate_entry`] - validation of a log-book entry
//!   payload at creation time. Payloads are flat objects keyed by field name;
//!   every key must be declared and every value must match its field type.
//!
//! Presence of `required` fields is deliberately not enforced on entries, and
//! editing a template never rewrites entries that were stored against it.

use crate::{
    errors::{Error, Result},
    validation::{self, FieldErrors},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;

/// Type tag of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line text
    Text,
    /// Integer or decimal number
    Number,
    /// Calendar date
    Date,
    /// One value out of `options`
    Select,
    /// Multi-line text
    Textarea,
}

/// One field of a template group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Key used in entry payloads
    pub name: String,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Field type tag
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the form marks the field as required
    #[serde(default)]
    pub required: bool,
    /// Allowed values for `select` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Regular expression text values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Value pre-filled in new entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// A named group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroup {
    /// Group name, unique within the template
    pub name: String,
    /// Optional display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Ordered field definitions
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// The schema document stored on a log-book template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSchema {
    /// Field groups in display order
    #[serde(default)]
    pub groups: Vec<FieldGroup>,
}

impl TemplateSchema {
    /// Parses a stored or submitted schema document.
    pub fn from_json(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| Error::Validation {
            message: "Invalid template schema".to_string(),
            details: json!({ "schema": e.to_string() }),
        })
    }

    /// Serializes the schema back into a JSON document.
    pub fn to_json(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Into::into)
    }

    /// Iterates over every field of every group, in order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().find(|f| f.name == name)
    }

    /// Declared field names, in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields().map(|f| f.name.as_str()).collect()
    }

    /// Structural validation of the schema itself.
    pub fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        if self.groups.is_empty() {
            errors.add("schema.groups", "at least one group is required");
        }

        let mut group_names = HashSet::new();
        let mut field_names = HashSet::new();
        for (gi, group) in self.groups.iter().enumerate() {
            let gpath = format!("schema.groups[{gi}]");
            if group.name.trim().is_empty() {
                errors.add(&format!("{gpath}.name"), "is required");
            } else if !group_names.insert(group.name.trim().to_string()) {
                errors.add(&format!("{gpath}.name"), "duplicate group name");
            }
            if group.fields.is_empty() {
                errors.add(&format!("{gpath}.fields"), "at least one field is required");
            }

            for (fi, field) in group.fields.iter().enumerate() {
                let fpath = format!("{gpath}.fields[{fi}]");
                if field.name.trim().is_empty() {
                    errors.add(&format!("{fpath}.name"), "is required");
                } else if !field_names.insert(field.name.clone()) {
                    errors.add(&format!("{fpath}.name"), "duplicate field name");
                }

                if field.field_type == FieldType::Select
                    && field.options.as_ref().is_none_or(Vec::is_empty)
                {
                    errors.add(
                        &format!("{fpath}.options"),
                        "select fields need at least one option",
                    );
                }

                let pattern_ok = match field.pattern.as_deref() {
                    Some(p) => match Regex::new(p) {
                        Ok(_) => true,
                        Err(e) => {
                            errors.add(&format!("{fpath}.pattern"), format!("invalid pattern: {e}"));
                            false
                        }
                    },
                    None => true,
                };

                if let (Some(default), true) = (&field.default, pattern_ok) {
                    if let Err(msg) = check_value(field, default) {
                        errors.add(&format!("{fpath}.default"), msg);
                    }
                }
            }
        }
        errors.into_result()
    }

    /// Validates an entry payload against the declared fields.
    ///
    /// Unknown keys are rejected; values are type-checked. Missing fields,
    /// including `required` ones, are accepted.
    pub fn validate_entry(&self, data: &Value) -> Result<()> {
        let Some(object) = data.as_object() else {
            return Err(Error::Validation {
                message: "Entry data must be a JSON object".to_string(),
                details: json!({ "data": "expected an object" }),
            });
        };

        let mut unknown: Vec<&str> = object
            .keys()
            .filter(|k| self.field(k).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(Error::Validation {
                message: "Entry data contains fields not declared by the template".to_string(),
                details: json!({ "unknownFields": unknown }),
            });
        }

        let mut errors = FieldErrors::new();
        for (key, value) in object {
            if let Some(field) = self.field(key) {
                if let Err(msg) = check_value(field, value) {
                    errors.add(&format!("data.{key}"), msg);
                }
            }
        }
        errors.into_result()
    }

    /// Builds a payload holding every declared default value.
    #[must_use]
    pub fn default_entry(&self) -> Value {
        let map = self
            .fields()
            .filter_map(|f| f.default.clone().map(|v| (f.name.clone(), v)))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }
}

fn check_value(field: &FieldDefinition, value: &Value) -> std::result::Result<(), String> {
    if value.is_null() {
        return Ok(());
    }
    match field.field_type {
        FieldType::Text | FieldType::Textarea => {
            let Some(text) = value.as_str() else {
                return Err("expected a string".to_string());
            };
            check_pattern(field, text)
        }
        FieldType::Number => match value {
            Value::Number(_) => Ok(()),
            Value::String(s) if s.trim().parse::<f64>().is_ok_and(f64::is_finite) => Ok(()),
            _ => Err("expected a number".to_string()),
        },
        FieldType::Date => match value.as_str() {
            Some(s) if validation::parse_date(s).is_some() => Ok(()),
            _ => Err("expected a date (YYYY-MM-DD)".to_string()),
        },
        FieldType::Select => {
            let Some(choice) = value.as_str() else {
                return Err("expected one of the options".to_string());
            };
            let allowed = field.options.as_deref().unwrap_or_default();
            if allowed.iter().any(|o| o == choice) {
                Ok(())
            } else {
                Err(format!("`{choice}` is not one of the options"))
            }
        }
    }
}

fn check_pattern(field: &FieldDefinition, text: &str) -> std::result::Result<(), String> {
    let Some(pattern) = field.pattern.as_deref() else {
        return Ok(());
    };
    // Patterns are checked on template write; a stored bad pattern is skipped.
    match Regex::new(pattern) {
        Ok(re) if !re.is_match(text) => Err(format!("does not match pattern `{pattern}`")),
        _ => Ok(()),
    }
}
