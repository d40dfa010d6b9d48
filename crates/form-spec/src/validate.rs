use serde_json::Value;

use crate::context::FormContext;
use crate::rules::{FieldsById, fields_by_id};
use crate::spec::field::FieldDefinition;
use crate::validators::{ValidatorContext, ValidatorRegistry, run_validator};

pub const REQUIRED_MESSAGE: &str = "A value must be provided";

/// External validation consulted after the built-in validators.
pub trait ValidationHandler: Send + Sync {
    fn validate(
        &self,
        field: &FieldDefinition,
        fields: &[FieldDefinition],
        parent: Option<&FormContext>,
    ) -> Option<String>;
}

impl<F> ValidationHandler for F
where
    F: Fn(&FieldDefinition, &[FieldDefinition], Option<&FormContext>) -> Option<String>
        + Send
        + Sync,
{
    fn validate(
        &self,
        field: &FieldDefinition,
        fields: &[FieldDefinition],
        parent: Option<&FormContext>,
    ) -> Option<String> {
        self(field, fields, parent)
    }
}

/// Inputs of a validation pass besides the fields themselves.
#[derive(Clone, Copy)]
pub struct ValidationSettings<'a> {
    pub show_validation_before_touched: bool,
    pub handler: Option<&'a dyn ValidationHandler>,
    pub parent: Option<&'a FormContext>,
    pub validators: &'a ValidatorRegistry,
}

impl<'a> ValidationSettings<'a> {
    pub fn new(validators: &'a ValidatorRegistry) -> Self {
        Self {
            show_validation_before_touched: false,
            handler: None,
            parent: None,
            validators,
        }
    }
}

/// Form-level outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormValidity {
    /// Ids of fields showing an error.
    pub invalid: Vec<String>,
    /// Ids of fields that fail but are suppressed until touched.
    pub discretely_invalid: Vec<String>,
}

impl FormValidity {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty() && self.discretely_invalid.is_empty()
    }
}

/// `null`, `""` and `[]` are empty; `0` and `false` are values.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validates one field against the rest of the form.
pub fn validate_field(
    field: &FieldDefinition,
    fields: &[FieldDefinition],
    settings: &ValidationSettings<'_>,
) -> FieldDefinition {
    let by_id = fields_by_id(fields);
    validate_with_lookup(field, fields, &by_id, settings)
}

/// Validates every field and folds the form-level validity.
pub fn validate_fields(
    fields: &[FieldDefinition],
    settings: &ValidationSettings<'_>,
) -> (Vec<FieldDefinition>, FormValidity) {
    let by_id = fields_by_id(fields);
    let mut validity = FormValidity::default();

    let validated = fields
        .iter()
        .map(|field| {
            let next = validate_with_lookup(field, fields, &by_id, settings);
            if !next.is_valid {
                validity.invalid.push(next.id.clone());
            }
            if next.is_discretely_invalid {
                validity.discretely_invalid.push(next.id.clone());
            }
            next
        })
        .collect();

    (validated, validity)
}

fn validate_with_lookup(
    field: &FieldDefinition,
    fields: &[FieldDefinition],
    by_id: &FieldsById<'_>,
    settings: &ValidationSettings<'_>,
) -> FieldDefinition {
    let mut next = field.clone();
    next.is_valid = true;
    next.error_messages.clear();
    next.is_discretely_invalid = false;

    if !field.visible {
        return next;
    }

    let value = field.current_value();
    let mut messages = Vec::new();

    if field.required && is_empty_value(value) {
        messages.push(REQUIRED_MESSAGE.to_string());
    }

    let ctx = ValidatorContext {
        value,
        field,
        fields: by_id,
        registry: settings.validators,
    };
    messages.extend(
        field
            .valid_when
            .iter()
            .filter_map(|rule| run_validator(rule, &ctx)),
    );

    if let Some(handler) = settings.handler
        && let Some(message) = handler.validate(field, fields, settings.parent)
    {
        messages.push(message);
    }

    if messages.is_empty() {
        return next;
    }

    if !field.touched && !settings.show_validation_before_touched {
        next.is_discretely_invalid = true;
        return next;
    }

    next.is_valid = false;
    next.error_messages = messages
        .into_iter()
        .filter(|message| !message.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    next
}
