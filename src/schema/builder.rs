use crate::schema::{
    Choice, DependencyMap, FieldDescriptor, FieldType, FieldValidation, FormConfiguration, FormSchema,
};
use serde_json::Value;

pub struct FormBuilder {
    config: FormConfiguration,
    dependencies: DependencyMap,
}

impl FormBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            config: FormConfiguration {
                title: Some(title.to_string()),
                ..FormConfiguration::default()
            },
            dependencies: DependencyMap::new(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.config.description = Some(description.to_string());
        self
    }

    pub fn locale(mut self, locale: &str) -> Self {
        self.config.locale = Some(locale.to_string());
        self
    }

    pub fn progress_bar(mut self) -> Self {
        self.config.show_progress_bar = true;
        self
    }

    pub fn complete_text(mut self, text: &str) -> Self {
        self.config.complete_text = Some(text.to_string());
        self
    }

    pub fn field(self, name: &str, field_type: FieldType) -> FieldBuilder {
        FieldBuilder {
            form_builder: self,
            field: FieldDescriptor::new(name, field_type),
        }
    }

    /// Declares that `dependent`'s options are derived from `parent`'s value.
    pub fn depends(mut self, parent: &str, dependent: &str) -> Self {
        self.dependencies
            .entry(parent.to_string())
            .or_default()
            .push(dependent.to_string());
        self
    }

    pub fn build(self) -> FormConfiguration {
        self.config
    }

    pub fn build_schema(self) -> FormSchema {
        FormSchema {
            fields: self.config.elements,
            dependencies: self.dependencies,
            non_field_errors: None,
        }
    }
}

pub struct FieldBuilder {
    form_builder: FormBuilder,
    field: FieldDescriptor,
}

impl FieldBuilder {
    pub fn title(mut self, title: &str) -> Self {
        self.field.title = Some(title.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.field.description = Some(description.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.field.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.field.is_required = true;
        self
    }

    pub fn required_message(mut self, message: &str) -> Self {
        self.field.is_required = true;
        self.field.validation = Some(FieldValidation {
            message: message.to_string(),
        });
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.field.default_value = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.field.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.field.max = Some(max);
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.field.step = Some(step);
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.field.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.field.max_length = Some(len);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.field.pattern = Some(pattern.to_string());
        self
    }

    pub fn choice(mut self, value: impl Into<Value>, text: &str) -> Self {
        self.field.choices.push(Choice::new(value, text));
        self
    }

    pub fn build(mut self) -> FormBuilder {
        self.form_builder.config.elements.push(self.field);
        self.form_builder
    }
}
