//! A small declarative validator for raw JSON payloads.
//!
//! Entities declare a static table of `FieldRules`; `validate` walks that table
//! against an untyped payload and collects human-readable messages per field.
//! Only once a payload passes is it parsed into domain types (see
//! `MemberFields`), so the rules themselves never live inside the entity's
//! parsing logic.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use validator::ValidateEmail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Must be present, non-null and not blank
    Required,
    /// Must be a JSON string (when present)
    String,
    /// Must be a valid email address (when present)
    Email,
    /// Must be one of the listed values (when present)
    In(&'static [&'static str]),
}

/// The rules applying to a single field. Fields without `Rule::Required` are
/// nullable: absent, `null` and blank values skip every other rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// Violations keyed by field name. Serializes as a JSON object of
/// `field -> [messages]`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(
        &mut self,
        field: &str,
        message: String,
    ) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    /// Shortcut for a single violation on a single field
    pub fn single(
        field: &str,
        message: String,
    ) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn field(
        &self,
        field: &str,
    ) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// `email_address` -> `email address`
pub fn label(field: &str) -> String { field.replace('_', " ") }

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Check a single field; the first violation of a "shape" rule (`required`,
/// `string`) stops evaluation for that field, since the remaining rules would
/// only produce noise.
fn check_field(
    value: Option<&Value>,
    field: &FieldRules,
    errors: &mut ValidationErrors,
) {
    let name = label(field.field);

    if is_empty(value) {
        if field.rules.contains(&Rule::Required) {
            errors.add(field.field, format!("The {name} field is required."));
        }
        return;
    }

    // not empty, so present
    let Some(value) = value else { return };

    for rule in field.rules {
        match rule {
            Rule::Required => {}
            Rule::String => {
                if !value.is_string() {
                    errors.add(field.field, format!("The {name} must be a string."));
                    return;
                }
            }
            Rule::Email => {
                let ok = value.as_str().is_some_and(|s| s.validate_email());
                if !ok {
                    errors.add(
                        field.field,
                        format!("The {name} must be a valid email address."),
                    );
                }
            }
            Rule::In(allowed) => {
                let ok = value.as_str().is_some_and(|s| allowed.contains(&s));
                if !ok {
                    errors.add(field.field, format!("The selected {name} is invalid."));
                }
            }
        }
    }
}

/// Apply `rules` to `input`. Keys of `input` not mentioned in `rules` are
/// ignored.
pub fn validate(
    input: &Map<String, Value>,
    rules: &[FieldRules],
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for field in rules {
        check_field(input.get(field.field), field, &mut errors);
    }
    match errors.is_empty() {
        true => Ok(()),
        false => Err(errors),
    }
}
