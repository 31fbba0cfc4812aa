use anyhow::{Result, Context as AnyhowContext, anyhow};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;
use crate::convert::converter::to_internal;
use crate::schema::{FormConfiguration, FormData, FormSchema};

/// Reads a YAML (or JSON, which parses as YAML) document into `T`.
fn load_document<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read file from {}", file_path.display()))?;

    let doc: T = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to deserialize content from {}", file_path.display()))?;

    Ok(doc)
}

/// Loads a configuration written in the internal format.
pub fn load_configuration(file_path: &Path) -> Result<FormConfiguration> {
    let config: FormConfiguration = load_document(file_path)?;
    config
        .check_unique_names()
        .map_err(|name| anyhow!("Duplicate field name '{}' in {}", name, file_path.display()))?;
    Ok(config)
}

/// Loads a configuration written in the external (SurveyJS-style) format.
pub fn load_external_configuration(file_path: &Path) -> Result<FormConfiguration> {
    let raw: Value = load_document(file_path)?;
    to_internal(&raw).with_context(|| format!("Invalid form configuration in {}", file_path.display()))
}

/// Loads a backend-style schema (`fields` + `dependencies`).
pub fn load_schema(file_path: &Path) -> Result<FormSchema> {
    let schema: FormSchema = load_document(file_path)?;
    crate::schema::unique_names(&schema.fields)
        .map_err(|name| anyhow!("Duplicate field name '{}' in {}", name, file_path.display()))?;
    Ok(schema)
}

pub fn load_form_data(file_path: &Path) -> Result<FormData> {
    load_document(file_path)
}
