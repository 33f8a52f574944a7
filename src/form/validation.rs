use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::FormPayload;

pub const TITLE_MAX_CHARS: usize = 100;

const MISSING: &str = "Missing data for required field.";
const NOT_A_STRING: &str = "Not a valid string.";
const NOT_AN_INTEGER: &str = "Not a valid integer.";
const NOT_A_LIST: &str = "Not a valid list.";
const NEGATIVE: &str = "Must be greater than or equal to 0.";
const INVALID_INPUT: &str = "Invalid input type.";

/// Key used for errors that concern the payload as a whole
pub const SCHEMA_KEY: &str = "_schema";

/// Field name -> human readable messages, e.g. `{"title": ["Not a valid string."]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single whole-payload error, used when the body is not a JSON object
    pub fn invalid_input() -> Self {
        let mut errors = Self::new();
        errors.add(SCHEMA_KEY, INVALID_INPUT);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        let messages = self.0.entry(field.to_string()).or_default();
        if !messages.iter().any(|m| m == message) {
            messages.push(message.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// Validate a create/update body and lift it into a typed payload.
///
/// Only `title`, `description`, `owner` and `fields` are read; any other key
/// (including `form_id`) is ignored. All problems are collected before
/// returning so the client sees every bad field at once.
pub fn validate_payload(body: &Value) -> Result<FormPayload, ValidationErrors> {
    let Value::Object(map) = body else {
        return Err(ValidationErrors::invalid_input());
    };

    let mut errors = ValidationErrors::new();

    let title = required(map, "title", &mut errors).and_then(|v| string_field(v, "title", &mut errors));
    if let Some(title) = &title {
        let len = title.chars().count();
        if len == 0 || len > TITLE_MAX_CHARS {
            errors.add("title", &format!("Length must be between 1 and {}.", TITLE_MAX_CHARS));
        }
    }

    let description = required(map, "description", &mut errors)
        .and_then(|v| string_field(v, "description", &mut errors));
    if let Some(description) = &description {
        if description.is_empty() {
            errors.add("description", "Shorter than minimum length 1.");
        }
    }

    let owner = required(map, "owner", &mut errors).and_then(|v| owner_field(v, &mut errors));

    let fields = required(map, "fields", &mut errors).and_then(|v| fields_field(v, &mut errors));

    match (title, description, owner, fields) {
        (Some(title), Some(description), Some(owner), Some(fields)) if errors.is_empty() => Ok(FormPayload {
            title,
            description,
            owner,
            fields,
        }),
        _ => Err(errors),
    }
}

fn required<'a>(map: &'a Map<String, Value>, field: &str, errors: &mut ValidationErrors) -> Option<&'a Value> {
    match map.get(field) {
        // An explicit null counts as missing
        None | Some(Value::Null) => {
            errors.add(field, MISSING);
            None
        }
        Some(value) => Some(value),
    }
}

fn string_field(value: &Value, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match value.as_str() {
        Some(s) => Some(s.to_string()),
        None => {
            errors.add(field, NOT_A_STRING);
            None
        }
    }
}

fn owner_field(value: &Value, errors: &mut ValidationErrors) -> Option<i32> {
    match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
        Some(owner) => Some(owner),
        None => {
            errors.add("owner", NOT_AN_INTEGER);
            None
        }
    }
}

fn fields_field(value: &Value, errors: &mut ValidationErrors) -> Option<Vec<u32>> {
    let Some(items) = value.as_array() else {
        errors.add("fields", NOT_A_LIST);
        return None;
    };

    let mut fields = Vec::with_capacity(items.len());
    let mut ok = true;
    for item in items {
        match item.as_i64() {
            Some(n) if n < 0 => {
                errors.add("fields", NEGATIVE);
                ok = false;
            }
            Some(n) => match u32::try_from(n) {
                Ok(n) => fields.push(n),
                Err(_) => {
                    errors.add("fields", NOT_AN_INTEGER);
                    ok = false;
                }
            },
            None => {
                // u64 values above i64::MAX land here too
                errors.add("fields", NOT_AN_INTEGER);
                ok = false;
            }
        }
    }

    ok.then_some(fields)
}
