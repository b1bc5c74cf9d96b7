//! Shape checking for request bodies. Every rule is checked and all of the
//! failures are reported together, so a client can fix a form in one pass.
use libecoleta::location::NewLocation;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // dot separated atoms on both sides of the `@`
    Regex::new(r"^[^\s@.]+(\.[^\s@.]+)*@[^\s@.]+(\.[^\s@.]+)+$")
        .expect("email pattern is a valid regex")
});

const STATE_MAX_LEN: usize = 2;

const LOCATION_KEYS: &[&str] = &[
    "name",
    "email",
    "whatsapp",
    "latitude",
    "longitude",
    "city",
    "uf",
    "items",
];

/// A validation failure for a single field of the request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct FieldError {
    /// path of the offending value, e.g. `uf` or `items.1`
    pub(crate) key: String,
    pub(crate) message: String,
}

impl FieldError {
    fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// All of the validation failures for a request body
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", self.message())]
pub(crate) struct ValidationErrors(pub(crate) Vec<FieldError>);

impl ValidationErrors {
    pub(crate) fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.key.as_str()).collect()
    }

    pub(crate) fn message(&self) -> String {
        self.0
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(". ")
    }
}

fn required_string(obj: &Map<String, Value>, key: &str, label: &str) -> Result<String, FieldError> {
    match obj.get(key) {
        None => Err(FieldError::new(key, format!("\"{label}\" is required"))),
        Some(Value::String(s)) if s.is_empty() => Err(FieldError::new(
            key,
            format!("\"{label}\" is not allowed to be empty"),
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::new(key, format!("\"{label}\" must be a string"))),
    }
}

fn required_email(obj: &Map<String, Value>, key: &str, label: &str) -> Result<String, FieldError> {
    let email = required_string(obj, key, label)?;
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(FieldError::new(
            key,
            format!("\"{label}\" must be a valid email"),
        ))
    }
}

/// numbers may also be sent as numeric strings, e.g. `"-19.91"`
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn required_number(obj: &Map<String, Value>, key: &str) -> Result<f64, FieldError> {
    match obj.get(key) {
        None => Err(FieldError::new(key, format!("\"{key}\" is required"))),
        Some(v) => {
            as_number(v).ok_or_else(|| FieldError::new(key, format!("\"{key}\" must be a number")))
        }
    }
}

fn required_state(obj: &Map<String, Value>, key: &str) -> Result<String, FieldError> {
    match obj.get(key) {
        None => Err(FieldError::new(key, format!("\"{key}\" is a required field"))),
        Some(Value::String(s)) if s.is_empty() => Err(FieldError::new(
            key,
            format!("\"{key}\" cannot be an empty field"),
        )),
        Some(Value::String(s)) if s.chars().count() > STATE_MAX_LEN => Err(FieldError::new(
            key,
            format!("\"{key}\" should have a maximum length of {STATE_MAX_LEN}"),
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(FieldError::new(
            key,
            format!("\"{key}\" should be a type of 'text'"),
        )),
    }
}

fn required_item_ids(obj: &Map<String, Value>, key: &str) -> Result<Vec<i64>, Vec<FieldError>> {
    let values = match obj.get(key) {
        None => return Err(vec![FieldError::new(key, format!("\"{key}\" is required"))]),
        Some(Value::Array(values)) => values,
        Some(_) => {
            return Err(vec![FieldError::new(
                key,
                format!("\"{key}\" must be an array"),
            )]);
        }
    };
    if values.is_empty() {
        return Err(vec![FieldError::new(
            key,
            format!("\"{key}\" must contain at least 1 items"),
        )]);
    }

    let mut ids = Vec::with_capacity(values.len());
    let mut errors = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let path = format!("{key}.{i}");
        match as_number(value) {
            None => errors.push(FieldError::new(
                path,
                format!("\"{key}[{i}]\" must be a number"),
            )),
            Some(n) if n.fract() != 0.0 || n < i64::MIN as f64 || n > i64::MAX as f64 => errors
                .push(FieldError::new(
                    path,
                    format!("\"{key}[{i}]\" must be an integer"),
                )),
            Some(n) => ids.push(n as i64),
        }
    }
    if errors.is_empty() {
        Ok(ids)
    } else {
        Err(errors)
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, res: Result<T, FieldError>) -> Option<T> {
    res.map_err(|e| errors.push(e)).ok()
}

/// Check the body of a create-location request and turn it into a
/// [NewLocation]. Unknown keys are rejected.
pub(crate) fn validate_new_location(body: &Value) -> Result<NewLocation, ValidationErrors> {
    let Value::Object(obj) = body else {
        return Err(ValidationErrors(vec![FieldError::new(
            "value",
            "\"value\" must be of type object",
        )]));
    };

    let mut errors = Vec::new();
    let name = collect(&mut errors, required_string(obj, "name", "name"));
    let email = collect(&mut errors, required_email(obj, "email", "e-mail"));
    let whatsapp = collect(&mut errors, required_string(obj, "whatsapp", "whatsapp"));
    let latitude = collect(&mut errors, required_number(obj, "latitude"));
    let longitude = collect(&mut errors, required_number(obj, "longitude"));
    let city = collect(&mut errors, required_string(obj, "city", "city"));
    let state = collect(&mut errors, required_state(obj, "uf"));
    let items = match required_item_ids(obj, "items") {
        Ok(ids) => Some(ids),
        Err(mut errs) => {
            errors.append(&mut errs);
            None
        }
    };
    for key in obj.keys() {
        if !LOCATION_KEYS.contains(&key.as_str()) {
            errors.push(FieldError::new(
                key.clone(),
                format!("\"{key}\" is not allowed"),
            ));
        }
    }

    match (name, email, whatsapp, latitude, longitude, city, state, items) {
        (
            Some(name),
            Some(email),
            Some(whatsapp),
            Some(latitude),
            Some(longitude),
            Some(city),
            Some(state),
            Some(items),
        ) if errors.is_empty() => Ok(NewLocation {
            name,
            email,
            whatsapp,
            latitude,
            longitude,
            city,
            state,
            items,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}
