use std::collections::HashSet;
use serde_json::Value;
use tracing::debug;
use crate::schema::{Choice, FieldDescriptor, FormData};
use crate::validation::{self, ValidationError};

pub type ChangeCallback = Box<dyn FnMut(&str, &Value, &FormData) + Send>;
pub type ValidationCallback = Box<dyn FnMut(bool, &[ValidationError]) + Send>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub data: FormData,
    pub errors: Vec<ValidationError>,
    pub is_valid: bool,
    pub is_dirty: bool,
    pub is_submitting: bool,
}

/// Owns the values of one form and keeps errors/validity in step with them.
pub struct FormController {
    fields: Vec<FieldDescriptor>,
    state: FormState,
    /// Fields with an option request in flight
    loading: HashSet<String>,
    validate_on_change: bool,
    on_change: Option<ChangeCallback>,
    on_validation: Option<ValidationCallback>,
}

impl FormController {
    pub fn new(fields: Vec<FieldDescriptor>, initial_data: FormData) -> Self {
        let mut controller = Self {
            fields: Vec::new(),
            state: FormState::default(),
            loading: HashSet::new(),
            validate_on_change: true,
            on_change: None,
            on_validation: None,
        };
        controller.initialize(fields, initial_data);
        controller
    }

    pub fn with_validate_on_change(mut self, enabled: bool) -> Self {
        self.validate_on_change = enabled;
        self
    }

    pub fn on_change(mut self, callback: impl FnMut(&str, &Value, &FormData) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn on_validation(mut self, callback: impl FnMut(bool, &[ValidationError]) + Send + 'static) -> Self {
        self.on_validation = Some(Box::new(callback));
        self
    }

    /// Seeds every field from `initial_data`, falling back to the field's
    /// default. Errors stay empty until the first validation pass.
    pub fn initialize(&mut self, fields: Vec<FieldDescriptor>, initial_data: FormData) {
        let mut data = initial_data;
        for field in &fields {
            if !data.contains_key(&field.name) {
                data.insert(field.name.clone(), field.initial_value());
            }
        }
        self.fields = fields;
        self.loading.clear();
        self.state = FormState {
            is_valid: validation::validate_all(&self.fields, &data).is_empty(),
            data,
            ..FormState::default()
        };
    }

    pub fn update_field(&mut self, name: &str, value: Value) {
        if self.field(name).is_none() {
            debug!(field = %name, "Updating value of undeclared field");
        }
        self.state.data.insert(name.to_string(), value.clone());
        self.state.is_dirty = true;

        if self.validate_on_change {
            self.run_validation();
        }

        if let Some(cb) = self.on_change.as_mut() {
            cb(name, &value, &self.state.data);
        }
    }

    /// Validates every field regardless of the on-change setting.
    pub fn validate_form(&mut self) -> bool {
        self.run_validation();
        self.state.is_valid
    }

    pub fn reset(&mut self) {
        let data = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.initial_value()))
            .collect();
        self.state.data = data;
        self.state.errors.clear();
        self.state.is_dirty = false;
        self.state.is_valid = validation::validate_all(&self.fields, &self.state.data).is_empty();
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.state.is_submitting = submitting;
    }

    /// Clears the given fields in one step, re-validating once afterwards.
    /// Names the form does not declare are skipped.
    pub fn clear_fields(&mut self, names: &[String]) {
        let mut cleared = false;
        for name in names {
            if self.field(name).is_none() {
                debug!(field = %name, "Skipping clear of undeclared field");
                continue;
            }
            self.state.data.insert(name.clone(), Value::Null);
            cleared = true;
        }
        if cleared && self.validate_on_change {
            self.run_validation();
        }
    }

    pub fn set_loading(&mut self, name: &str, loading: bool) {
        if loading {
            self.loading.insert(name.to_string());
        } else {
            self.loading.remove(name);
        }
    }

    pub fn is_loading(&self, name: &str) -> bool {
        self.loading.contains(name)
    }

    pub fn loading_fields(&self) -> &HashSet<String> {
        &self.loading
    }

    /// Returns false when no such field exists.
    pub fn replace_choices(&mut self, name: &str, choices: Vec<Choice>) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.choices = choices;
                true
            }
            None => false,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.state.data.get(name)
    }

    pub fn data(&self) -> &FormData {
        &self.state.data
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.state.errors
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting
    }

    fn run_validation(&mut self) {
        self.state.errors = validation::validate_all(&self.fields, &self.state.data);
        self.state.is_valid = self.state.errors.is_empty();

        if let Some(cb) = self.on_validation.as_mut() {
            cb(self.state.is_valid, &self.state.errors);
        }
    }
}
