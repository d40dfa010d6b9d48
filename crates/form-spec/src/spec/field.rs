use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::options::OptionsTicket;
use crate::spec::rule::Rule;
use crate::spec::validation::ValidationRules;

pub const DEFAULT_ADDED_SUFFIX: &str = "_added";
pub const DEFAULT_REMOVED_SUFFIX: &str = "_removed";

static NULL: Value = Value::Null;

/// Single selectable entry; plain strings act as both label and value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum OptionItem {
    Text(String),
    Choice {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        misc: Option<Value>,
    },
}

impl OptionItem {
    pub fn value(&self) -> Value {
        match self {
            OptionItem::Text(text) => Value::String(text.clone()),
            OptionItem::Choice { value, .. } => value.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            OptionItem::Text(text) => text.clone(),
            OptionItem::Choice {
                label: Some(label), ..
            } => label.clone(),
            OptionItem::Choice { value, .. } => crate::rules::coerce_to_string(value),
        }
    }
}

/// Group of options, optionally under a heading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct OptionGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default)]
    pub items: Vec<OptionItem>,
}

impl OptionGroup {
    pub fn from_items(items: impl IntoIterator<Item = OptionItem>) -> Self {
        Self {
            heading: None,
            items: items.into_iter().collect(),
        }
    }
}

/// Schema unit of a form: static definition plus the flags derived on every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: String,
    /// Output path in the form value; dot segments nest. Falls back to `id` when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Renderer tag, never interpreted by the engine.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub autofocus: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misc: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub disabled: bool,
    /// The schema's own `disabled` flag, captured on the first pass so a form-wide disable can
    /// be lifted again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_disabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visible_when: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_when: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_when: Vec<Rule>,
    #[serde(default, skip_serializing_if = "ValidationRules::is_empty")]
    #[schemars(with = "std::collections::BTreeMap<String, serde_json::Value>")]
    pub valid_when: ValidationRules,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionGroup>>,
    #[serde(skip)]
    pub pending_options: Option<OptionsTicket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub refresh_options_on_changes_to: Vec<String>,

    #[serde(default)]
    pub touched: bool,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_messages: String,
    #[serde(default)]
    pub is_discretely_invalid: bool,

    #[serde(default)]
    pub omit_when_hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub omit_when_value_is: Vec<Value>,
    #[serde(default)]
    pub use_changes_as_values: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_delimiter: Option<String>,
    #[serde(default)]
    pub trim_value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_suffix: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for FieldDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            kind: String::new(),
            label: None,
            description: None,
            placeholder: None,
            autofocus: false,
            misc: None,
            value: None,
            default_value: None,
            visible: true,
            required: false,
            disabled: false,
            default_disabled: None,
            visible_when: Vec::new(),
            required_when: Vec::new(),
            disabled_when: Vec::new(),
            valid_when: ValidationRules::default(),
            options: None,
            pending_options: None,
            refresh_options_on_changes_to: Vec::new(),
            touched: false,
            is_valid: true,
            error_messages: String::new(),
            is_discretely_invalid: false,
            omit_when_hidden: false,
            omit_when_value_is: Vec::new(),
            use_changes_as_values: false,
            value_delimiter: None,
            trim_value: false,
            added_suffix: None,
            removed_suffix: None,
        }
    }
}

impl FieldDefinition {
    /// Creates a field whose output name equals its id.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn output_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Current value, `null` when unset.
    pub fn current_value(&self) -> &Value {
        self.value.as_ref().unwrap_or(&NULL)
    }

    pub fn added_key(&self) -> String {
        format!(
            "{}{}",
            self.output_name(),
            self.added_suffix.as_deref().unwrap_or(DEFAULT_ADDED_SUFFIX)
        )
    }

    pub fn removed_key(&self) -> String {
        format!(
            "{}{}",
            self.output_name(),
            self.removed_suffix.as_deref().unwrap_or(DEFAULT_REMOVED_SUFFIX)
        )
    }

    pub fn has_pending_options(&self) -> bool {
        self.pending_options.is_some()
    }
}
