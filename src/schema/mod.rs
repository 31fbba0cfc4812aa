pub mod builder;
pub mod loader;

use std::collections::{HashMap, HashSet};
use serde::{Serialize, Deserialize};
use serde_json::{Value, json};

/// Current field values, keyed by field name.
pub type FormData = HashMap<String, Value>;

/// Adjacency list: field name -> names of fields whose options depend on it.
pub type DependencyMap = HashMap<String, Vec<String>>;

/// Supported input kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Password,
    Number,
    Tel,
    Url,
    /// Multiline text
    Textarea,
    /// Dropdown
    Select,
    Checkbox,
    Boolean,
    Radio,
    File,
    Date,
    Time,
    Datetime,
}

impl FieldType {
    pub fn has_choices(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }

    /// Kinds that accept `minLength` / `maxLength` / `pattern`.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldType::Text
                | FieldType::Email
                | FieldType::Password
                | FieldType::Tel
                | FieldType::Url
                | FieldType::Textarea
        )
    }

    /// Kinds that accept `min` / `max`.
    pub fn is_ranged(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Date | FieldType::Time | FieldType::Datetime
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub value: Value,
    pub text: String,
}

impl Choice {
    pub fn new(value: impl Into<Value>, text: &str) -> Self {
        Self {
            value: value.into(),
            text: text.to_string(),
        }
    }
}

/// Custom message for the required rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValidation {
    pub message: String,
}

/// Visibility/enablement condition. Captured from the source definition and
/// carried along; never evaluated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conditional {
    pub depends_on: String,
    /// Which property the condition came from (`visibleIf`, `enableIf`).
    pub condition: String,
    /// Raw expression text.
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl FieldDescriptor {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            field_type,
            name: name.to_string(),
            title: None,
            description: None,
            placeholder: None,
            is_required: false,
            default_value: None,
            min: None,
            max: None,
            step: None,
            min_length: None,
            max_length: None,
            pattern: None,
            choices: Vec::new(),
            validation: None,
            conditional: None,
        }
    }

    /// Title if present, else the field name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    /// Value a field starts with when nothing else is known about it.
    pub fn initial_value(&self) -> Value {
        if let Some(v) = &self.default_value {
            return v.clone();
        }
        match self.field_type {
            FieldType::Checkbox | FieldType::Boolean => Value::Bool(false),
            FieldType::Number => number_value(self.min.unwrap_or(0.0)),
            FieldType::Select | FieldType::Radio => self
                .choices
                .first()
                .map(|c| c.value.clone())
                .unwrap_or_else(|| Value::String(String::new())),
            _ => Value::String(String::new()),
        }
    }
}

/// Ordered field list plus presentation metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FormConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub show_progress_bar: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_next_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_prev_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default)]
    pub elements: Vec<FieldDescriptor>,
}

impl FormConfiguration {
    /// Returns the first name that appears more than once.
    pub fn check_unique_names(&self) -> Result<(), String> {
        unique_names(&self.elements)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.elements.iter().find(|f| f.name == name)
    }
}

/// Form definition as served by the backend for a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FormSchema {
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub dependencies: DependencyMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_field_errors: Option<Vec<String>>,
}

pub(crate) fn unique_names(fields: &[FieldDescriptor]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(field.name.clone());
        }
    }
    Ok(())
}

/// Integral floats become JSON integers so `0.0` round-trips as `0`.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}
