use std::fmt;
use std::sync::Arc;

use crate::options::OptionsHandler;
use crate::spec::field::FieldDefinition;
use crate::validate::ValidationHandler;
use crate::validators::ValidatorRegistry;
use crate::value::FormValue;

/// Read-only snapshot of a form, handed to collaborators after every pass.
///
/// Nested forms keep their parent's snapshot in `parent` and fall back to its handlers when
/// they do not declare their own.
#[derive(Clone, Default)]
pub struct FormContext {
    pub fields: Vec<FieldDefinition>,
    pub value: FormValue,
    pub is_valid: bool,
    pub disabled: bool,
    pub show_validation_before_touched: bool,
    pub options_handler: Option<Arc<dyn OptionsHandler>>,
    pub validation_handler: Option<Arc<dyn ValidationHandler>>,
    pub validators: ValidatorRegistry,
    pub parent: Option<Arc<FormContext>>,
}

impl FormContext {
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }

    /// Own options handler, else the nearest ancestor's.
    pub fn effective_options_handler(&self) -> Option<Arc<dyn OptionsHandler>> {
        self.options_handler.clone().or_else(|| {
            self.parent
                .as_deref()
                .and_then(FormContext::effective_options_handler)
        })
    }

    /// Own validation handler, else the nearest ancestor's.
    pub fn effective_validation_handler(&self) -> Option<Arc<dyn ValidationHandler>> {
        self.validation_handler.clone().or_else(|| {
            self.parent
                .as_deref()
                .and_then(FormContext::effective_validation_handler)
        })
    }

    pub fn depth(&self) -> usize {
        self.parent.as_deref().map_or(0, |parent| parent.depth() + 1)
    }
}

impl fmt::Debug for FormContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormContext")
            .field("fields", &self.fields.len())
            .field("value", &self.value)
            .field("is_valid", &self.is_valid)
            .field("disabled", &self.disabled)
            .field(
                "show_validation_before_touched",
                &self.show_validation_before_touched,
            )
            .field("options_handler", &self.options_handler.is_some())
            .field("validation_handler", &self.validation_handler.is_some())
            .field("validators", &self.validators)
            .field("depth", &self.depth())
            .finish()
    }
}
