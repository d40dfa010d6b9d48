use serde_json::{Value, json};

use form_spec::{
    FieldDefinition, Rule, evaluate_all_rules, evaluate_rule, fields_by_id, process_fields,
    values_match,
};

fn text_field(id: &str, value: Value) -> FieldDefinition {
    FieldDefinition {
        value: Some(value),
        ..FieldDefinition::new(id, "text")
    }
}

#[test]
fn missing_rule_is_permissive() {
    assert!(evaluate_rule(None, &json!("anything")));
    assert!(evaluate_rule(None, &Value::Null));
}

#[test]
fn rule_without_constraints_matches_everything() {
    let rule = Rule {
        field: "other".into(),
        is: Vec::new(),
        is_not: Vec::new(),
    };
    assert!(evaluate_rule(Some(&rule), &json!("x")));
    assert!(evaluate_rule(Some(&rule), &Value::Null));
}

#[test]
fn is_list_matches_by_string_form() {
    let rule = Rule::is("other", [json!("1"), json!(false)]);
    assert!(evaluate_rule(Some(&rule), &json!(1)));
    assert!(evaluate_rule(Some(&rule), &json!("false")));
    assert!(!evaluate_rule(Some(&rule), &json!(2)));
}

#[test]
fn falsy_values_are_matchable() {
    assert!(evaluate_rule(Some(&Rule::is("f", [json!(0)])), &json!(0)));
    assert!(evaluate_rule(Some(&Rule::is("f", [json!(false)])), &json!(false)));
    assert!(evaluate_rule(Some(&Rule::is("f", [json!("")])), &json!("")));
    assert!(!evaluate_rule(Some(&Rule::is("f", [json!("")])), &Value::Null));
}

#[test]
fn is_not_excludes_even_when_is_matches() {
    let rule = Rule {
        field: "other".into(),
        is: vec![json!("a"), json!("b")],
        is_not: vec![json!("b")],
    };
    assert!(evaluate_rule(Some(&rule), &json!("a")));
    assert!(!evaluate_rule(Some(&rule), &json!("b")));
}

#[test]
fn option_wrappers_are_unwrapped_on_both_sides() {
    assert!(values_match(&json!({ "value": "en" }), &json!("en")));
    assert!(values_match(&json!("en"), &json!({ "value": "en", "label": "English" })));
    let rule = Rule::is("lang", [json!({ "value": 3 })]);
    assert!(evaluate_rule(Some(&rule), &json!("3")));
}

#[test]
fn rules_are_or_combined() {
    let fields = vec![
        text_field("country", json!("NL")),
        text_field("plan", json!("free")),
    ];
    let by_id = fields_by_id(&fields);
    let rules = vec![
        Rule::is("country", [json!("BE")]),
        Rule::is("plan", [json!("free")]),
    ];
    assert!(evaluate_all_rules(&rules, &by_id, false));

    let rules = vec![
        Rule::is("country", [json!("BE")]),
        Rule::is("plan", [json!("pro")]),
    ];
    assert!(!evaluate_all_rules(&rules, &by_id, true));
}

#[test]
fn empty_rules_and_unknown_fields_fall_back_to_default() {
    let fields = vec![text_field("country", json!("NL"))];
    let by_id = fields_by_id(&fields);
    assert!(evaluate_all_rules(&[], &by_id, true));
    assert!(!evaluate_all_rules(&[], &by_id, false));

    let rules = vec![Rule::is("missing", [json!("x")])];
    assert!(evaluate_all_rules(&rules, &by_id, true));
    assert!(!evaluate_all_rules(&rules, &by_id, false));
}

#[test]
fn unset_fields_are_judged_by_their_default() {
    let fields = vec![FieldDefinition {
        default_value: Some(json!("yes")),
        ..FieldDefinition::new("consent", "checkbox")
    }];
    let by_id = fields_by_id(&fields);
    assert!(evaluate_all_rules(
        &[Rule::is("consent", [json!("yes")])],
        &by_id,
        false
    ));
}

#[test]
fn process_fields_derives_flags_from_rules() {
    let fields = vec![
        text_field("kind", json!("company")),
        FieldDefinition {
            visible: false,
            visible_when: vec![Rule::is("kind", [json!("company")])],
            required_when: vec![Rule::is("kind", [json!("company")])],
            disabled_when: vec![Rule::is_not("kind", [json!("company")])],
            ..FieldDefinition::new("vat", "text")
        },
    ];

    let processed = process_fields(&fields, false, false);
    let vat = &processed[1];
    assert!(vat.visible);
    assert!(vat.required);
    assert!(!vat.disabled);
    assert_eq!(vat.default_disabled, Some(false));
}

#[test]
fn process_fields_uses_default_value_when_unset() {
    let fields = vec![
        FieldDefinition {
            default_value: Some(json!("EUR")),
            ..FieldDefinition::new("currency", "select")
        },
        FieldDefinition {
            value: Some(json!("USD")),
            default_value: Some(json!("EUR")),
            ..FieldDefinition::new("other", "select")
        },
    ];
    let processed = process_fields(&fields, false, false);
    assert_eq!(processed[0].value, Some(json!("EUR")));
    assert_eq!(processed[1].value, Some(json!("USD")));
}

#[test]
fn form_disable_can_be_lifted_again() {
    let fields = vec![FieldDefinition::new("name", "text")];

    let disabled = process_fields(&fields, true, false);
    assert!(disabled[0].disabled);
    assert_eq!(disabled[0].default_disabled, Some(false));

    let enabled = process_fields(&disabled, false, false);
    assert!(!enabled[0].disabled);
}

#[test]
fn process_fields_can_reset_touched() {
    let fields = vec![FieldDefinition {
        touched: true,
        ..FieldDefinition::new("name", "text")
    }];
    assert!(process_fields(&fields, false, false)[0].touched);
    assert!(!process_fields(&fields, false, true)[0].touched);
}

#[test]
fn rules_see_the_input_snapshot_not_earlier_results() {
    // `b` depends on `a`'s value, which is only filled from its default in this same pass.
    let fields = vec![
        FieldDefinition {
            visible_when: vec![Rule::is("a", [json!("on")])],
            ..FieldDefinition::new("b", "text")
        },
        FieldDefinition {
            default_value: Some(json!("on")),
            ..FieldDefinition::new("a", "text")
        },
    ];
    let processed = process_fields(&fields, false, false);
    assert!(processed[0].visible);

    let reversed: Vec<_> = fields.iter().rev().cloned().collect();
    let processed = process_fields(&reversed, false, false);
    assert!(processed[1].visible);
}
