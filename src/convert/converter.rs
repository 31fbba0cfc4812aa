use serde_json::Value;
use tracing::warn;
use crate::convert::external::{ExternalElement, ExternalForm, ExternalLayout, ExternalValidator};
use crate::error::ConvertError;
use crate::schema::{
    Choice, Conditional, FieldDescriptor, FieldType, FieldValidation, FormConfiguration, number_value, unique_names,
};

/// Maps an external element type (and `inputType` for `text`) to the
/// internal kind. Unrecognized types fall back to `Text`.
pub fn resolve_type(element_type: &str, input_type: Option<&str>) -> FieldType {
    match element_type {
        "text" => match input_type {
            Some("email") => FieldType::Email,
            Some("password") => FieldType::Password,
            Some("number") | Some("range") => FieldType::Number,
            Some("tel") => FieldType::Tel,
            Some("url") => FieldType::Url,
            Some("date") => FieldType::Date,
            Some("time") => FieldType::Time,
            Some("datetime-local") | Some("datetime") => FieldType::Datetime,
            _ => FieldType::Text,
        },
        "comment" => FieldType::Textarea,
        "dropdown" | "tagbox" => FieldType::Select,
        "checkbox" => FieldType::Checkbox,
        "radiogroup" => FieldType::Radio,
        "boolean" => FieldType::Boolean,
        "file" => FieldType::File,
        // Lossy: collapsed onto the closest input kind
        "rating" => FieldType::Number,
        "ranking" | "imagepicker" => FieldType::Radio,
        _ => FieldType::Text,
    }
}

/// Inverse of [`resolve_type`]: `(type, inputType)`.
pub fn external_type(field_type: FieldType) -> (&'static str, Option<&'static str>) {
    match field_type {
        FieldType::Text => ("text", None),
        FieldType::Email => ("text", Some("email")),
        FieldType::Password => ("text", Some("password")),
        FieldType::Number => ("text", Some("number")),
        FieldType::Tel => ("text", Some("tel")),
        FieldType::Url => ("text", Some("url")),
        FieldType::Date => ("text", Some("date")),
        FieldType::Time => ("text", Some("time")),
        FieldType::Datetime => ("text", Some("datetime-local")),
        FieldType::Textarea => ("comment", None),
        FieldType::Select => ("dropdown", None),
        FieldType::Checkbox => ("checkbox", None),
        FieldType::Radio => ("radiogroup", None),
        FieldType::Boolean => ("boolean", None),
        FieldType::File => ("file", None),
    }
}

pub fn to_internal(raw: &Value) -> Result<FormConfiguration, ConvertError> {
    if !raw.is_object() {
        return Err(ConvertError::NotAnObject);
    }
    let layout = ExternalLayout::classify(raw);
    if layout == ExternalLayout::Invalid {
        return Err(ConvertError::UnknownLayout);
    }

    let mut elements = Vec::new();
    for (index, raw_element) in layout.flatten().into_iter().enumerate() {
        let element: ExternalElement =
            serde_json::from_value(raw_element.clone()).map_err(|e| ConvertError::InvalidElement {
                index,
                message: e.to_string(),
            })?;
        elements.push(convert_element(index, element)?);
    }
    unique_names(&elements).map_err(ConvertError::DuplicateName)?;

    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
    Ok(FormConfiguration {
        title: text("title"),
        description: text("description"),
        show_progress_bar: match raw.get("showProgressBar") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s != "off",
            _ => false,
        },
        complete_text: text("completeText"),
        page_next_text: text("pageNextText"),
        page_prev_text: text("pagePrevText"),
        logo: text("logo"),
        locale: text("locale"),
        elements,
    })
}

/// Like [`to_internal`], but a malformed definition yields `None`.
pub fn parse_configuration(raw: &Value) -> Option<FormConfiguration> {
    match to_internal(raw) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, "Invalid form configuration");
            None
        }
    }
}

fn convert_element(index: usize, element: ExternalElement) -> Result<FieldDescriptor, ConvertError> {
    let name = element
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or(ConvertError::MissingName { index })?;
    let field_type = resolve_type(&element.element_type, element.input_type.as_deref());

    let mut field = FieldDescriptor::new(&name, field_type);
    field.title = element.title;
    field.description = element.description;
    field.placeholder = element.placeholder;
    field.is_required = element.is_required;
    field.default_value = element.default_value;

    if field_type.is_ranged() {
        field.min = element.min.as_ref().and_then(as_number).or(element.rate_min);
        field.max = element.max.as_ref().and_then(as_number).or(element.rate_max);
        if field_type == FieldType::Number {
            field.step = element.step;
        }
    }
    if field_type.is_textual() {
        field.min_length = element.min_length;
        field.max_length = element.max_length;
    }
    if field_type.has_choices() || field_type == FieldType::Checkbox {
        field.choices = element.choices.iter().map(to_choice).collect();
    }

    let mut required_message = element.required_error_text;
    for validator in &element.validators {
        match validator.validator_type.as_str() {
            "required" | "expression" if required_message.is_none() => {
                required_message = validator.text.clone()
            }
            "regex" if field_type.is_textual() => field.pattern = validator.regex.clone(),
            "text" if field_type.is_textual() => {
                field.min_length = field.min_length.or(validator.min_length);
                field.max_length = field.max_length.or(validator.max_length);
            }
            "numeric" if field_type == FieldType::Number => {
                field.min = field.min.or(validator.min_value);
                field.max = field.max.or(validator.max_value);
            }
            _ => {}
        }
    }
    field.validation = required_message.map(|message| FieldValidation { message });

    field.conditional = match (element.visible_if, element.enable_if) {
        (Some(expr), _) => Some(capture_condition("visibleIf", expr)),
        (None, Some(expr)) => Some(capture_condition("enableIf", expr)),
        (None, None) => None,
    };

    Ok(field)
}

pub fn to_external(config: &FormConfiguration) -> ExternalForm {
    ExternalForm {
        title: config.title.clone(),
        description: config.description.clone(),
        show_progress_bar: config.show_progress_bar.then(|| "top".to_string()),
        complete_text: config.complete_text.clone(),
        page_next_text: config.page_next_text.clone(),
        page_prev_text: config.page_prev_text.clone(),
        logo: config.logo.clone(),
        locale: config.locale.clone(),
        elements: config.elements.iter().map(element_from_field).collect(),
    }
}

fn element_from_field(field: &FieldDescriptor) -> ExternalElement {
    let (element_type, input_type) = external_type(field.field_type);

    let mut validators = Vec::new();
    if field.is_required {
        if let Some(validation) = &field.validation {
            validators.push(ExternalValidator {
                validator_type: "required".to_string(),
                text: Some(validation.message.clone()),
                ..ExternalValidator::default()
            });
        }
    }
    if let Some(pattern) = &field.pattern {
        validators.push(ExternalValidator {
            validator_type: "regex".to_string(),
            regex: Some(pattern.clone()),
            ..ExternalValidator::default()
        });
    }

    let (visible_if, enable_if) = match &field.conditional {
        Some(c) => {
            let expr = match &c.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if c.condition == "enableIf" {
                (None, Some(expr))
            } else {
                (Some(expr), None)
            }
        }
        None => (None, None),
    };

    ExternalElement {
        element_type: element_type.to_string(),
        name: Some(field.name.clone()),
        title: field.title.clone(),
        description: field.description.clone(),
        placeholder: field.placeholder.clone(),
        is_required: field.is_required,
        required_error_text: None,
        default_value: field.default_value.clone(),
        input_type: input_type.map(str::to_string),
        min: field.min.map(number_value),
        max: field.max.map(number_value),
        step: field.step,
        rate_min: None,
        rate_max: None,
        min_length: field.min_length,
        max_length: field.max_length,
        choices: field
            .choices
            .iter()
            .map(|c| serde_json::json!({ "value": c.value, "text": c.text }))
            .collect(),
        validators,
        visible_if,
        enable_if,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_choice(value: &Value) -> Choice {
    match value {
        Value::Object(obj) => {
            let value = obj.get("value").cloned().unwrap_or(Value::Null);
            let text = match obj.get("text") {
                Some(Value::String(s)) => s.clone(),
                _ => display_text(&value),
            };
            Choice { value, text }
        }
        other => Choice {
            value: other.clone(),
            text: display_text(other),
        },
    }
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Records the expression and the first `{field}` it references.
fn capture_condition(kind: &str, expression: String) -> Conditional {
    let depends_on = expression
        .split_once('{')
        .and_then(|(_, rest)| rest.split_once('}'))
        .map(|(name, _)| name.trim().to_string())
        .unwrap_or_default();
    Conditional {
        depends_on,
        condition: kind.to_string(),
        value: Value::String(expression),
    }
}
