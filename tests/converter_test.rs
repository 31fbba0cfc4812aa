use formflow::convert::converter::{parse_configuration, resolve_type, to_external, to_internal};
use formflow::convert::external::ExternalLayout;
use formflow::error::ConvertError;
use formflow::schema::builder::FormBuilder;
use formflow::schema::{Choice, Conditional, FieldType, FormConfiguration};
use serde_json::json;

#[test]
fn test_layout_is_classified_once() {
    let flat = json!({ "elements": [{ "type": "text", "name": "a" }] });
    let paged = json!({ "pages": [{ "elements": [] }] });
    let questions = json!({ "questions": [] });
    let neither = json!({ "title": "x" });

    assert!(matches!(ExternalLayout::classify(&flat), ExternalLayout::Flat(e) if e.len() == 1));
    assert!(matches!(ExternalLayout::classify(&paged), ExternalLayout::Paged(p) if p.len() == 1));
    assert!(matches!(ExternalLayout::classify(&questions), ExternalLayout::Questions(_)));
    assert_eq!(ExternalLayout::classify(&neither), ExternalLayout::Invalid);
    assert_eq!(ExternalLayout::classify(&json!([1, 2])), ExternalLayout::Invalid);
}

#[test]
fn test_pages_and_panels_flatten_in_order() {
    let raw = json!({
        "title": "Survey",
        "showProgressBar": "top",
        "pages": [
            { "name": "p1", "elements": [
                { "type": "text", "name": "first" },
                { "type": "panel", "name": "group", "elements": [
                    { "type": "comment", "name": "second" }
                ]}
            ]},
            { "name": "p2", "questions": [
                { "type": "boolean", "name": "third" }
            ]}
        ]
    });

    let config = to_internal(&raw).unwrap();
    let names: Vec<_> = config.elements.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(config.elements[1].field_type, FieldType::Textarea);
    assert_eq!(config.title.as_deref(), Some("Survey"));
    assert!(config.show_progress_bar);
}

#[test]
fn test_type_lookup_table() {
    assert_eq!(resolve_type("text", None), FieldType::Text);
    assert_eq!(resolve_type("text", Some("email")), FieldType::Email);
    assert_eq!(resolve_type("text", Some("datetime-local")), FieldType::Datetime);
    assert_eq!(resolve_type("text", Some("color")), FieldType::Text);
    assert_eq!(resolve_type("dropdown", None), FieldType::Select);
    assert_eq!(resolve_type("radiogroup", None), FieldType::Radio);
    // Lossy collapses
    assert_eq!(resolve_type("rating", None), FieldType::Number);
    assert_eq!(resolve_type("imagepicker", None), FieldType::Radio);
    assert_eq!(resolve_type("matrixdynamic", None), FieldType::Text);
    assert_eq!(resolve_type("something-new", None), FieldType::Text);
}

#[test]
fn test_constraints_copied_only_for_matching_type() {
    let raw = json!({ "elements": [
        { "type": "text", "inputType": "number", "name": "n", "min": 1, "max": "10", "step": 0.5, "maxLength": 3 },
        { "type": "text", "name": "t", "min": 1, "maxLength": 20, "minLength": 2,
          "validators": [{ "type": "regex", "regex": "^[a-z]+$", "text": "lowercase" }] },
        { "type": "rating", "name": "r", "rateMin": 1, "rateMax": 5 }
    ]});

    let config = to_internal(&raw).unwrap();
    let n = &config.elements[0];
    assert_eq!((n.min, n.max, n.step), (Some(1.0), Some(10.0), Some(0.5)));
    assert_eq!(n.max_length, None);

    let t = &config.elements[1];
    assert_eq!(t.min, None);
    assert_eq!((t.min_length, t.max_length), (Some(2), Some(20)));
    assert_eq!(t.pattern.as_deref(), Some("^[a-z]+$"));

    let r = &config.elements[2];
    assert_eq!(r.field_type, FieldType::Number);
    assert_eq!((r.min, r.max), (Some(1.0), Some(5.0)));
}

#[test]
fn test_required_message_and_choices_extracted() {
    let raw = json!({ "questions": [
        { "type": "dropdown", "name": "country", "isRequired": true,
          "choices": ["US", { "value": "CA", "text": "Canada" }, 3],
          "validators": [{ "type": "required", "text": "Pick a country" }] },
        { "type": "radiogroup", "name": "size", "isRequired": true, "requiredErrorText": "Pick a size",
          "choices": ["S"] }
    ]});

    let config = to_internal(&raw).unwrap();
    let country = &config.elements[0];
    assert!(country.is_required);
    assert_eq!(country.validation.as_ref().unwrap().message, "Pick a country");
    assert_eq!(
        country.choices,
        vec![Choice::new("US", "US"), Choice::new("CA", "Canada"), Choice::new(3, "3")]
    );
    assert_eq!(config.elements[1].validation.as_ref().unwrap().message, "Pick a size");
}

#[test]
fn test_expression_validator_message_becomes_required_message() {
    let raw = json!({ "elements": [
        { "type": "text", "name": "a", "isRequired": true,
          "validators": [{ "type": "expression", "expression": "{a} notempty", "text": "A needed" }] },
        { "type": "text", "name": "b", "isRequired": true, "requiredErrorText": "B first",
          "validators": [{ "type": "expression", "text": "ignored" }] }
    ]});

    let config = to_internal(&raw).unwrap();
    assert_eq!(config.elements[0].validation.as_ref().unwrap().message, "A needed");
    // An explicit requiredErrorText wins over validator text
    assert_eq!(config.elements[1].validation.as_ref().unwrap().message, "B first");
}

#[test]
fn test_conditions_captured_not_evaluated() {
    let raw = json!({ "elements": [
        { "type": "text", "name": "state", "visibleIf": "{country} = 'US'" },
        { "type": "text", "name": "vat", "enableIf": "{ business } = true" }
    ]});

    let config = to_internal(&raw).unwrap();
    assert_eq!(
        config.elements[0].conditional,
        Some(Conditional {
            depends_on: "country".to_string(),
            condition: "visibleIf".to_string(),
            value: json!("{country} = 'US'"),
        })
    );
    let vat = config.elements[1].conditional.as_ref().unwrap();
    assert_eq!(vat.depends_on, "business");
    assert_eq!(vat.condition, "enableIf");
}

#[test]
fn test_malformed_input_is_an_error_not_a_panic() {
    assert_eq!(to_internal(&json!("nope")), Err(ConvertError::NotAnObject));
    assert_eq!(to_internal(&json!({ "foo": [] })), Err(ConvertError::UnknownLayout));
    assert_eq!(
        to_internal(&json!({ "elements": [{ "type": "text" }] })),
        Err(ConvertError::MissingName { index: 0 })
    );
    assert!(matches!(
        to_internal(&json!({ "elements": [{ "name": "no-type" }] })),
        Err(ConvertError::InvalidElement { index: 0, .. })
    ));
    assert_eq!(
        to_internal(&json!({ "elements": [{ "type": "text", "name": "a" }, { "type": "comment", "name": "a" }] })),
        Err(ConvertError::DuplicateName("a".to_string()))
    );
    assert!(parse_configuration(&json!(42)).is_none());
}

#[test]
fn test_to_external_rebuilds_required_validator() {
    let config = FormBuilder::new("t")
        .field("name", FieldType::Text).required_message("Name please").build()
        .field("nick", FieldType::Text).required().build()
        .build();

    let external = to_external(&config);
    let name = &external.elements[0];
    assert_eq!(name.validators.len(), 1);
    assert_eq!(name.validators[0].validator_type, "required");
    assert_eq!(name.validators[0].text.as_deref(), Some("Name please"));
    // Required without a custom message needs no validator
    assert!(external.elements[1].validators.is_empty());
    assert!(external.elements[1].is_required);
}

fn every_type_config() -> FormConfiguration {
    FormBuilder::new("All inputs")
        .description("One of each")
        .locale("de")
        .progress_bar()
        .complete_text("Save")
        .field("text", FieldType::Text)
            .title("Text").placeholder("type here").min_length(1).max_length(10).pattern("^\\w+$")
            .build()
        .field("email", FieldType::Email).required_message("Email required").build()
        .field("password", FieldType::Password).max_length(64).build()
        .field("number", FieldType::Number).min(0.0).max(10.5).step(0.5).default_value(2).build()
        .field("tel", FieldType::Tel).build()
        .field("url", FieldType::Url).description("Webhook").build()
        .field("comment", FieldType::Textarea).max_length(500).build()
        .field("dropdown", FieldType::Select).choice("a", "A").choice(2, "Two").required().build()
        .field("radio", FieldType::Radio).choice("x", "X").build()
        .field("checkbox", FieldType::Checkbox).default_value(true).build()
        .field("boolean", FieldType::Boolean).build()
        .field("file", FieldType::File).build()
        .field("date", FieldType::Date).min(1.0).build()
        .field("time", FieldType::Time).build()
        .field("datetime", FieldType::Datetime).build()
        .build()
}

#[test]
fn test_round_trip_is_exact_for_supported_types() {
    let config = every_type_config();
    let external = to_external(&config).to_value();
    let back = to_internal(&external).expect("round trip should convert");
    assert_eq!(back, config);
}

#[test]
fn test_round_trip_keeps_conditions() {
    let raw = json!({ "elements": [
        { "type": "dropdown", "name": "country", "choices": ["US", "CA"] },
        { "type": "text", "name": "state", "visibleIf": "{country} = 'US'" }
    ]});
    let config = to_internal(&raw).unwrap();
    let again = to_internal(&to_external(&config).to_value()).unwrap();
    assert_eq!(again, config);
}
