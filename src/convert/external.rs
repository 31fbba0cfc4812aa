use serde::{Serialize, Deserialize};
use serde_json::Value;

/// One element of an external (SurveyJS-style) form definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalElement {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Numbers, or strings for date inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Plain strings/numbers or `{value, text}` objects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ExternalValidator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_if: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalValidator {
    #[serde(rename = "type")]
    pub validator_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

/// Output shape of [`to_external`](crate::convert::converter::to_external):
/// always the flat `elements` layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExternalForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_progress_bar: Option<String>,
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
    pub elements: Vec<ExternalElement>,
}

impl ExternalForm {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Top-level layout of an external definition, decided once up front.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalLayout<'a> {
    Flat(&'a [Value]),
    Paged(Vec<&'a [Value]>),
    Questions(&'a [Value]),
    Invalid,
}

impl<'a> ExternalLayout<'a> {
    pub fn classify(raw: &'a Value) -> Self {
        let Some(obj) = raw.as_object() else {
            return ExternalLayout::Invalid;
        };

        if let Some(pages) = obj.get("pages").and_then(Value::as_array) {
            let page_elements = pages
                .iter()
                .map(|page| {
                    page.get("elements")
                        .or_else(|| page.get("questions"))
                        .and_then(Value::as_array)
                        .map(Vec::as_slice)
                        .unwrap_or(&[])
                })
                .collect();
            return ExternalLayout::Paged(page_elements);
        }
        if let Some(elements) = obj.get("elements").and_then(Value::as_array) {
            return ExternalLayout::Flat(elements);
        }
        if let Some(questions) = obj.get("questions").and_then(Value::as_array) {
            return ExternalLayout::Questions(questions);
        }
        ExternalLayout::Invalid
    }

    /// All elements in display order, with panels expanded in place.
    pub fn flatten(&self) -> Vec<&'a Value> {
        let mut out = Vec::new();
        match self {
            ExternalLayout::Flat(elements) | ExternalLayout::Questions(elements) => {
                flatten_into(*elements, &mut out)
            }
            ExternalLayout::Paged(pages) => {
                for page in pages {
                    flatten_into(*page, &mut out);
                }
            }
            ExternalLayout::Invalid => {}
        }
        out
    }
}

fn flatten_into<'a>(elements: &'a [Value], out: &mut Vec<&'a Value>) {
    for element in elements {
        let is_panel = element.get("type").and_then(Value::as_str) == Some("panel");
        match element.get("elements").and_then(Value::as_array) {
            Some(children) if is_panel => flatten_into(children, out),
            _ => out.push(element),
        }
    }
}
