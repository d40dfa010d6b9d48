use schemars::Schema;
use serde_json::Value;

use crate::error::FormSpecError;
use crate::spec::field::FieldDefinition;
use crate::value::FormValue;

/// Parses an ordered list of field definitions.
pub fn parse_fields(json: &str) -> Result<Vec<FieldDefinition>, FormSpecError> {
    // Read straight from text so `validWhen` keeps the document's key order.
    Ok(serde_json::from_str(json)?)
}

/// Parses an external form value.
pub fn parse_form_value(json: &str) -> Result<FormValue, FormSpecError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        _ => Err(FormSpecError::NotAnObject("form value")),
    }
}

/// JSON Schema describing the field-definition document.
pub fn fields_schema() -> Schema {
    schemars::schema_for!(Vec<FieldDefinition>)
}
