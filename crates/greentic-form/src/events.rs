use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use form_spec::{FieldDefinition, FormValue};

use crate::form::Form;

/// Inputs a host can feed into a [`Form`], in their JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum FormEvent {
    Register { field: Box<FieldDefinition> },
    Change { id: String, value: Value },
    Focus { id: String },
    Remove { id: String },
    SetValue { value: FormValue },
    ResetTouched,
    TouchAll,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("invalid event document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parses a JSON array of events.
pub fn parse_events(json: &str) -> Result<Vec<FormEvent>, EventError> {
    Ok(serde_json::from_str(json)?)
}

impl FormEvent {
    /// Feeds the event into `form`. Returns false when the form ignored it.
    pub fn apply(self, form: &mut Form) -> bool {
        match self {
            FormEvent::Register { field } => form.register_field(*field),
            FormEvent::Change { id, value } => form.on_field_change(&id, value),
            FormEvent::Focus { id } => form.on_field_focus(&id),
            FormEvent::Remove { id } => form.remove_field(&id),
            FormEvent::SetValue { value } => {
                form.set_value(value);
                true
            }
            FormEvent::ResetTouched => {
                form.reset_touched();
                true
            }
            FormEvent::TouchAll => {
                form.touch_all();
                true
            }
        }
    }
}
