use std::collections::BTreeMap;

use serde_json::Value;

use crate::spec::field::FieldDefinition;
use crate::spec::rule::Rule;

/// Lookup of fields by id, rebuilt for every pass.
pub type FieldsById<'a> = BTreeMap<&'a str, &'a FieldDefinition>;

pub fn fields_by_id(fields: &[FieldDefinition]) -> FieldsById<'_> {
    fields
        .iter()
        .map(|field| (field.id.as_str(), field))
        .collect()
}

/// Value a rule sees for a field: its current value, or its default while unset.
pub fn rule_target_value(field: &FieldDefinition) -> &Value {
    match &field.value {
        Some(value) if !value.is_null() => value,
        _ => field.default_value.as_ref().unwrap_or(&Value::Null),
    }
}

/// Evaluates one rule against a value. A missing rule is permissive.
pub fn evaluate_rule(rule: Option<&Rule>, target: &Value) -> bool {
    let Some(rule) = rule else {
        return true;
    };

    let has_valid_value =
        rule.is.is_empty() || rule.is.iter().any(|candidate| values_match(target, candidate));
    let has_invalid_value = !rule.is_not.is_empty()
        && rule
            .is_not
            .iter()
            .any(|candidate| values_match(target, candidate));

    has_valid_value && !has_invalid_value
}

/// OR-combines `rules`. An empty list, and any rule naming an unknown field, yields
/// `default_result`.
pub fn evaluate_all_rules(rules: &[Rule], fields: &FieldsById<'_>, default_result: bool) -> bool {
    if rules.is_empty() {
        return default_result;
    }

    rules.iter().any(|rule| match fields.get(rule.field.as_str()) {
        Some(field) => evaluate_rule(Some(rule), rule_target_value(field)),
        None => default_result,
    })
}

/// Compares two values by their string form, so `1` matches `"1"`. Nulls only match nulls.
/// `{ "value": V }` option wrappers are unwrapped on both sides.
pub fn values_match(left: &Value, right: &Value) -> bool {
    let left = unwrap_option_value(left);
    let right = unwrap_option_value(right);
    if left.is_null() || right.is_null() {
        return left == right;
    }
    coerce_to_string(left) == coerce_to_string(right)
}

pub fn unwrap_option_value(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("value").unwrap_or(value),
        _ => value,
    }
}

/// String form used for loose comparisons; arrays join their items with `,`.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int.to_string()
            } else if let Some(uint) = number.as_u64() {
                uint.to_string()
            } else {
                let float = number.as_f64().unwrap_or(f64::NAN);
                if float.is_finite() && float.fract() == 0.0 && float.abs() < 1e21 {
                    format!("{float:.0}")
                } else {
                    float.to_string()
                }
            }
        }
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(coerce_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
