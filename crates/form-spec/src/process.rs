use serde_json::Value;

use crate::rules::{evaluate_all_rules, fields_by_id};
use crate::spec::field::FieldDefinition;

/// Derives `visible`, `required` and `disabled` for every field and applies the default-value
/// fallback.
///
/// Rules are evaluated against the input snapshot, so the order of fields never changes the
/// outcome of a pass.
pub fn process_fields(
    fields: &[FieldDefinition],
    form_disabled: bool,
    reset_touched: bool,
) -> Vec<FieldDefinition> {
    let by_id = fields_by_id(fields);

    fields
        .iter()
        .map(|field| {
            let mut next = field.clone();

            if field.value.as_ref().is_none_or(Value::is_null) {
                next.value = field.default_value.clone();
            }
            if reset_touched {
                next.touched = false;
            }

            let default_disabled = field.default_disabled.unwrap_or(field.disabled);
            next.default_disabled = Some(default_disabled);

            next.visible = evaluate_all_rules(&field.visible_when, &by_id, field.visible);
            next.required = evaluate_all_rules(&field.required_when, &by_id, field.required);
            next.disabled =
                form_disabled || evaluate_all_rules(&field.disabled_when, &by_id, default_disabled);
            next
        })
        .collect()
}
