use serde_json::{Map, Value};

use crate::rules::{coerce_to_string, values_match};
use crate::spec::field::FieldDefinition;

/// Projected output of a form, keyed by field name.
pub type FormValue = Map<String, Value>;

/// True when the field must not contribute to the form value.
pub fn should_omit_field_value(field: &FieldDefinition) -> bool {
    if field.omit_when_hidden && !field.visible {
        return true;
    }
    field
        .value
        .as_ref()
        .is_some_and(|value| field.omit_when_value_is.contains(value))
}

/// Splits a delimited string into an array of strings. With a delimiter every non-string
/// becomes an empty array; without one the value is returned unchanged.
pub fn split_delimited_value(value: &Value, delimiter: Option<&str>) -> Value {
    match delimiter {
        None => value.clone(),
        Some(delimiter) => match value {
            Value::String(text) => Value::Array(
                text.split(delimiter)
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        },
    }
}

/// Joins an array into a delimited string; anything else is returned unchanged.
pub fn join_delimited_value(value: &Value, delimiter: Option<&str>) -> Value {
    match (value, delimiter) {
        (Value::Array(items), Some(delimiter)) => Value::String(
            items
                .iter()
                .map(coerce_to_string)
                .collect::<Vec<_>>()
                .join(delimiter),
        ),
        _ => value.clone(),
    }
}

/// Items added to and removed from the field's default value.
pub fn calculate_changes(field: &FieldDefinition) -> (Vec<Value>, Vec<Value>) {
    let delimiter = field.value_delimiter.as_deref();
    let current = delimited_items(field.value.as_ref(), delimiter);
    let initial = delimited_items(field.default_value.as_ref(), delimiter);

    let added = current
        .iter()
        .filter(|item| !initial.iter().any(|original| values_match(original, item)))
        .cloned()
        .collect();
    let removed = initial
        .iter()
        .filter(|original| !current.iter().any(|item| values_match(item, original)))
        .cloned()
        .collect();
    (added, removed)
}

fn delimited_items(value: Option<&Value>, delimiter: Option<&str>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(value) => match split_delimited_value(value, delimiter) {
            Value::Array(items) => items,
            other => vec![other],
        },
    }
}

/// Reduces validated fields into the form value. Later fields overwrite earlier ones that
/// share a name.
pub fn calculate_form_value(fields: &[FieldDefinition]) -> FormValue {
    let mut output = Value::Object(Map::new());

    for field in fields {
        if should_omit_field_value(field) {
            continue;
        }
        let delimiter = field.value_delimiter.as_deref();

        if field.use_changes_as_values {
            let (added, removed) = calculate_changes(field);
            set_path(
                &mut output,
                &field.added_key(),
                join_delimited_value(&Value::Array(added), delimiter),
            );
            set_path(
                &mut output,
                &field.removed_key(),
                join_delimited_value(&Value::Array(removed), delimiter),
            );
            continue;
        }

        let Some(value) = &field.value else {
            continue;
        };
        let mut value = join_delimited_value(value, delimiter);
        if field.trim_value
            && let Value::String(text) = &value
        {
            value = Value::String(text.trim().to_string());
        }
        set_path(&mut output, field.output_name(), value);
    }

    match output {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Writes `value` at a dot-separated path, creating intermediate objects.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments = path
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(current).insert(last.to_string(), value);
}

/// Reads a dot-separated path; a flat key containing dots wins over nesting.
pub fn get_path<'a>(value: &'a FormValue, path: &str) -> Option<&'a Value> {
    if let Some(found) = value.get(path) {
        return Some(found);
    }
    let mut segments = path.split('.').filter(|segment| !segment.is_empty());
    let mut current = value.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced with an object"),
    }
}
