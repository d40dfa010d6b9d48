use serde_json::{Value, json};

use form_spec::{
    Comparison, FieldDefinition, ValidationRule, ValidationSettings, ValidatorKind,
    ValidatorRegistry, fields_schema, parse_fields, validate_field,
};

const SCHEMA: &str = r#"[
    {
        "id": "password",
        "name": "account.password",
        "type": "password",
        "label": "Password",
        "required": true,
        "visibleWhen": [{ "field": "mode", "is": ["signup"] }],
        "validWhen": {
            "lengthIsGreaterThan": { "length": 7, "message": "At least eight characters" },
            "matchesRegEx": { "pattern": "[0-9]", "message": "Needs a digit" },
            "comparedTo": { "fields": ["username"], "is": "LONGER", "message": "Longer than the username" },
            "notCommon": { "message": "Too common" }
        }
    }
]"#;

#[test]
fn field_definitions_parse_from_camel_case_json() {
    let fields = parse_fields(SCHEMA).expect("schema should parse");
    let password = &fields[0];
    assert_eq!(password.output_name(), "account.password");
    assert_eq!(password.kind, "password");
    assert_eq!(password.label.as_deref(), Some("Password"));
    assert!(password.visible);
    assert!(password.is_valid);
    assert_eq!(password.visible_when[0].field, "mode");

    let kinds: Vec<_> = password
        .valid_when
        .iter()
        .map(ValidationRule::kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(ValidatorKind::LengthIsGreaterThan),
            Some(ValidatorKind::MatchesRegEx),
            Some(ValidatorKind::ComparedTo),
            None,
        ]
    );
    let Some(ValidationRule::ComparedTo(config)) = password.valid_when.iter().nth(2) else {
        panic!("expected comparedTo");
    };
    assert_eq!(config.is, Comparison::Longer);
    assert_eq!(password.valid_when.iter().nth(3).map(ValidationRule::name), Some("notCommon"));
}

#[test]
fn serialized_fields_keep_validator_order() {
    let fields = parse_fields(SCHEMA).expect("schema should parse");
    let text = serde_json::to_string(&fields).expect("serialize");
    let first = text.find("lengthIsGreaterThan").expect("length rule");
    let second = text.find("matchesRegEx").expect("regex rule");
    let third = text.find("comparedTo").expect("compared rule");
    let fourth = text.find("notCommon").expect("custom rule");
    assert!(first < second && second < third && third < fourth);

    let reparsed = parse_fields(&text).expect("reparse");
    assert_eq!(reparsed, fields);
}

#[test]
fn unreadable_validator_configs_degrade_to_passing() {
    let schema = r#"[
        { "id": "a", "type": "text", "value": "x",
          "validWhen": {
              "comparedTo": { "fields": ["b"], "is": "WIDER", "message": "never" },
              "lengthIsGreaterThan": { "length": -1, "message": "negative" },
              "lengthIsLessThan": { "message": "no length" }
          } },
        { "id": "b", "type": "text", "value": "longer value" }
    ]"#;
    let mut fields = parse_fields(schema).expect("schema still parses");
    let rules: Vec<_> = fields[0].valid_when.iter().collect();
    assert_eq!(rules.len(), 3);
    assert!(
        rules
            .iter()
            .all(|rule| matches!(rule, ValidationRule::Malformed { .. }))
    );
    assert_eq!(rules[0].kind(), Some(ValidatorKind::ComparedTo));

    let text = serde_json::to_string(&fields).expect("serialize");
    assert!(text.contains("WIDER"));
    assert_eq!(parse_fields(&text).expect("reparse"), fields);

    fields[0].touched = true;
    let registry = ValidatorRegistry::new();
    let validated = validate_field(&fields[0], &fields, &ValidationSettings::new(&registry));
    assert!(validated.is_valid);
    assert!(validated.error_messages.is_empty());
}

#[test]
fn numeric_strings_are_accepted_in_validator_configs() {
    let fields = parse_fields(
        r#"[{ "id": "age", "type": "number", "value": "7",
              "validWhen": {
                  "lengthIsGreaterThan": { "length": "3", "message": "Too short" },
                  "fallsWithinNumericalRange": { "min": "18", "max": " 99 ", "message": "Out of range" }
              } }]"#,
    )
    .expect("schema parses");
    let rules: Vec<_> = fields[0].valid_when.iter().collect();
    let ValidationRule::LengthIsGreaterThan(length) = rules[0] else {
        panic!("expected lengthIsGreaterThan");
    };
    assert_eq!(length.length, 3);
    let ValidationRule::FallsWithinNumericalRange(range) = rules[1] else {
        panic!("expected fallsWithinNumericalRange");
    };
    assert_eq!((range.min, range.max), (Some(18.0), Some(99.0)));

    let mut age = fields[0].clone();
    age.touched = true;
    let registry = ValidatorRegistry::new();
    let validated = validate_field(&age, &fields, &ValidationSettings::new(&registry));
    assert_eq!(validated.error_messages, "Too short, Out of range");
}

#[test]
fn defaults_apply_to_minimal_fields() {
    let field: FieldDefinition =
        serde_json::from_value(json!({ "id": "x" })).expect("minimal field");
    assert!(field.visible);
    assert!(field.is_valid);
    assert!(!field.required);
    assert_eq!(field.output_name(), "x");
    assert_eq!(field.added_key(), "x_added");
    assert_eq!(field.removed_key(), "x_removed");
}

#[test]
fn json_schema_describes_field_documents() {
    let schema = serde_json::to_value(fields_schema()).expect("schema serializes");
    assert_eq!(schema.get("type"), Some(&Value::String("array".into())));
    let text = schema.to_string();
    assert!(text.contains("visibleWhen"));
    assert!(text.contains("validWhen"));
    assert!(!text.contains("pendingOptions"));
}
