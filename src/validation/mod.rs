use dashmap::DashMap;
use regex::Regex;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::warn;
use crate::schema::{FieldDescriptor, FieldType, FormData};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Compiled `pattern` rules, keyed by source. Patterns that fail to compile
/// are cached as `None` so the warning is logged once.
static PATTERNS: LazyLock<DashMap<String, Option<Regex>>> = LazyLock::new(DashMap::new);

/// Whether `pattern` has been compiled (or rejected) by an earlier validation.
pub fn is_pattern_cached(pattern: &str) -> bool {
    PATTERNS.contains_key(pattern)
}

fn compiled_pattern(field: &str, pattern: &str) -> Option<Regex> {
    if let Some(cached) = PATTERNS.get(pattern) {
        return cached.value().clone();
    }
    let compiled = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(field = %field, pattern = %pattern, error = %e, "Invalid validation pattern");
            None
        }
    };
    PATTERNS.insert(pattern.to_string(), compiled.clone());
    compiled
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// `null` and `""` count as "no value".
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Validates one value against its descriptor. Returns the message of the
/// first failing rule.
pub fn validate(field: &FieldDescriptor, value: Option<&Value>) -> Option<String> {
    if is_empty(value) {
        if field.is_required {
            let message = match &field.validation {
                Some(v) => v.message.clone(),
                None => format!("{} is required", field.label()),
            };
            return Some(message);
        }
        return None;
    }
    let value = value?;

    match field.field_type {
        FieldType::Email => validate_email(value),
        FieldType::Url => validate_url(value),
        FieldType::Number => validate_number(field, value),
        FieldType::Text | FieldType::Textarea => validate_text(field, value),
        _ => None,
    }
}

/// Runs [`validate`] over every field in display order.
pub fn validate_all(fields: &[FieldDescriptor], data: &FormData) -> Vec<ValidationError> {
    fields
        .iter()
        .filter_map(|field| {
            validate(field, data.get(&field.name)).map(|message| ValidationError {
                field: field.name.clone(),
                message,
            })
        })
        .collect()
}

fn validate_email(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if EMAIL_RE.is_match(s) => None,
        _ => Some("Please enter a valid email address".to_string()),
    }
}

fn validate_url(value: &Value) -> Option<String> {
    match value.as_str() {
        Some(s) if s.starts_with("http://") || s.starts_with("https://") => None,
        _ => Some("Please enter a valid URL".to_string()),
    }
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn validate_number(field: &FieldDescriptor, value: &Value) -> Option<String> {
    let Some(n) = parse_number(value) else {
        return Some("Please enter a valid number".to_string());
    };
    if let Some(min) = field.min {
        if n < min {
            return Some(format!("Value must be at least {}", min));
        }
    }
    if let Some(max) = field.max {
        if n > max {
            return Some(format!("Value must be at most {}", max));
        }
    }
    None
}

fn validate_text(field: &FieldDescriptor, value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let len = text.chars().count();

    if let Some(min_len) = field.min_length {
        if len < min_len {
            return Some(format!("Must be at least {} characters", min_len));
        }
    }
    if let Some(max_len) = field.max_length {
        if len > max_len {
            return Some(format!("Must be at most {} characters", max_len));
        }
    }
    if let Some(pattern) = &field.pattern {
        match compiled_pattern(&field.name, pattern) {
            Some(re) if re.is_match(&text) => {}
            _ => return Some("Invalid format".to_string()),
        }
    }
    None
}
