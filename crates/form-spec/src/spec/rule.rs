use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Condition on another field's current value, used by `visibleWhen`, `requiredWhen` and
/// `disabledWhen`.
///
/// Entries of `is` / `isNot` may be raw values or `{ "value": V }` option wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub field: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub is: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub is_not: Vec<Value>,
}

impl Rule {
    pub fn is(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            field: field.into(),
            is: values.into_iter().collect(),
            is_not: Vec::new(),
        }
    }

    pub fn is_not(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            field: field.into(),
            is: Vec::new(),
            is_not: values.into_iter().collect(),
        }
    }
}
