use formflow::config::{EngineConfig, load_config_from_yaml};
use formflow::schema::builder::FormBuilder;
use formflow::schema::loader;
use formflow::schema::FieldType;
use serde_json::json;
use std::fs;

#[test]
fn test_load_internal_yaml_configuration() {
    let yaml_content = r#"
title: "Send Email"
locale: "en"
elements:
  - type: "email"
    name: "to"
    title: "Recipient"
    isRequired: true
  - type: "select"
    name: "priority"
    choices:
      - value: "low"
        text: "Low"
      - value: "high"
        text: "High"
  - type: "number"
    name: "delay"
    min: 0
    max: 60
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("send_email.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let loaded = loader::load_configuration(&file_path).expect("Failed to load configuration");

    let expected = FormBuilder::new("Send Email")
        .locale("en")
        .field("to", FieldType::Email).title("Recipient").required().build()
        .field("priority", FieldType::Select).choice("low", "Low").choice("high", "High").build()
        .field("delay", FieldType::Number).min(0.0).max(60.0).build()
        .build();

    assert_eq!(loaded, expected);
}

#[test]
fn test_load_external_json_configuration() {
    let json_content = json!({
        "title": "Feedback",
        "pages": [{ "elements": [
            { "type": "rating", "name": "score", "rateMax": 5 },
            { "type": "comment", "name": "why" }
        ]}]
    });

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("feedback.json");
    fs::write(&file_path, json_content.to_string()).expect("Failed to write temp file");

    let loaded = loader::load_external_configuration(&file_path).expect("Failed to load");
    assert_eq!(loaded.elements.len(), 2);
    assert_eq!(loaded.elements[0].field_type, FieldType::Number);
    assert_eq!(loaded.elements[0].max, Some(5.0));
    assert_eq!(loaded.elements[1].field_type, FieldType::Textarea);
}

#[test]
fn test_duplicate_names_are_rejected() {
    let yaml_content = r#"
elements:
  - { type: "text", name: "dup" }
  - { type: "text", name: "dup" }
"#;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("dup.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let err = loader::load_configuration(&file_path).unwrap_err();
    assert!(err.to_string().contains("Duplicate field name 'dup'"));
}

#[test]
fn test_load_schema_with_dependencies() {
    let yaml_content = r#"
fields:
  - { type: "select", name: "country", isRequired: true }
  - { type: "select", name: "state", isRequired: true }
dependencies:
  country: ["state"]
"#;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("schema.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let schema = loader::load_schema(&file_path).expect("Failed to load schema");
    assert_eq!(schema.fields.len(), 2);
    assert_eq!(schema.dependencies.get("country"), Some(&vec!["state".to_string()]));
    assert!(schema.non_field_errors.is_none());
}

#[test]
fn test_missing_file_reports_path() {
    let err = loader::load_configuration(std::path::Path::new("/nonexistent/form.yaml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/form.yaml"));
}

#[test]
fn test_engine_config_defaults_and_overrides() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("formflow.yaml");
    fs::write(&file_path, "backend_url: \"http://backend:9000\"\nvalidate_on_change: false\n")
        .expect("Failed to write temp file");

    let config = load_config_from_yaml(&file_path).expect("Failed to load config");
    assert_eq!(config.backend_url, "http://backend:9000");
    assert!(!config.validate_on_change);
    // Unset keys keep their defaults
    assert_eq!(config.poll_interval_ms, EngineConfig::default().poll_interval_ms);
    assert_eq!(config.request_timeout_secs, 30);
}
