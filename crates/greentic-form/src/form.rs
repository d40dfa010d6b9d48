use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use form_spec::{
    CustomValidator, FieldDefinition, FormContext, FormValidity, FormValue, OptionsHandler,
    OptionsResolution, TicketIssuer, ValidationHandler, ValidationSettings, ValidatorRegistry,
    calculate_form_value, get_path, join_delimited_value, process_fields, process_options,
    validate_fields,
};

use crate::config::FormConfig;

/// Receives the form value and validity after every field change.
pub type ChangeListener = Box<dyn FnMut(&FormValue, bool) + Send>;

/// Lifecycle of a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    /// No field registered yet.
    Uninitialized,
    /// Every event so far has been folded into the current snapshot.
    Steady,
}

/// Serializable view of the form after the last pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub fields: Vec<FieldDefinition>,
    pub value: FormValue,
    pub is_valid: bool,
}

/// Stateful owner of a field list. Every mutation synchronously re-runs field processing,
/// options resolution, validation and value projection.
pub struct Form {
    config: FormConfig,
    fields: Vec<FieldDefinition>,
    value: FormValue,
    validity: FormValidity,
    external_value: FormValue,
    options_handler: Option<Arc<dyn OptionsHandler>>,
    validation_handler: Option<Arc<dyn ValidationHandler>>,
    validators: ValidatorRegistry,
    parent: Option<Arc<FormContext>>,
    on_change: Option<ChangeListener>,
    tickets: TicketIssuer,
    in_flight: FuturesUnordered<BoxFuture<'static, OptionsResolution>>,
    state: FormState,
}

impl Form {
    pub fn new(config: FormConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn builder() -> FormBuilder {
        FormBuilder::default()
    }

    /// Starts a sub-form that inherits handlers, validators and form-wide flags from `parent`.
    pub fn nested(parent: Arc<FormContext>) -> FormBuilder {
        let config = FormConfig {
            disabled: parent.disabled,
            show_validation_before_touched: parent.show_validation_before_touched,
            ..FormConfig::default()
        };
        FormBuilder {
            config,
            validators: parent.validators.clone(),
            parent: Some(parent),
            ..FormBuilder::default()
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn value(&self) -> &FormValue {
        &self.value
    }

    pub fn validity(&self) -> &FormValidity {
        &self.validity
    }

    pub fn is_valid(&self) -> bool {
        self.validity.is_valid()
    }

    /// Adds a field unless one with the same id is already registered.
    pub fn register_field(&mut self, field: FieldDefinition) -> bool {
        if self.field(&field.id).is_some() {
            warn!(field_id = %field.id, "field already registered; ignoring");
            return false;
        }
        let field = self.prepare_registration(field);
        self.fields.push(field);
        self.recompute(None, false);
        true
    }

    /// Registers several fields with a single pass. Returns how many were added.
    pub fn register_fields(&mut self, fields: impl IntoIterator<Item = FieldDefinition>) -> usize {
        let mut added = 0;
        for field in fields {
            if self.field(&field.id).is_some() {
                warn!(field_id = %field.id, "field already registered; ignoring");
                continue;
            }
            let field = self.prepare_registration(field);
            self.fields.push(field);
            added += 1;
        }
        if added > 0 {
            self.recompute(None, false);
        }
        added
    }

    /// Replaces the schema. Externally supplied values win over the previous internal state.
    pub fn replace_fields(&mut self, defaults: impl IntoIterator<Item = FieldDefinition>) {
        let previous = std::mem::take(&mut self.fields);
        let mut next: Vec<FieldDefinition> = Vec::new();

        for mut field in defaults {
            if next.iter().any(|existing| existing.id == field.id) {
                warn!(field_id = %field.id, "duplicate field id in schema; dropping");
                continue;
            }
            if let Some(old) = previous.iter().find(|old| old.id == field.id) {
                if old.value.is_some() {
                    field.value = old.value.clone();
                }
                field.touched = old.touched;
                if field.options.is_none() {
                    field.options = old.options.clone();
                    field.pending_options = old.pending_options;
                }
            }
            if let Some(external) = get_path(&self.external_value, field.output_name()) {
                field.value = Some(external.clone());
            }
            self.apply_config_defaults(&mut field);
            next.push(field);
        }

        self.fields = next;
        self.recompute(None, false);
    }

    /// Supplies a new external value and re-registers the current fields against it.
    pub fn set_value(&mut self, value: FormValue) {
        self.external_value = value;
        let defaults = self.fields.clone();
        self.replace_fields(defaults);
    }

    /// Removes a field, e.g. a repeating-group item. Pending options for it are discarded
    /// when they settle.
    pub fn remove_field(&mut self, id: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|field| field.id != id);
        if self.fields.len() == before {
            warn!(field_id = %id, "remove for unknown field");
            return false;
        }
        self.recompute(None, false);
        true
    }

    /// Sets a field's value and notifies the change listener.
    ///
    /// Hidden fields whose value is omitted keep their value frozen; the update is dropped.
    pub fn on_field_change(&mut self, id: &str, value: Value) -> bool {
        let Some(index) = self.fields.iter().position(|field| field.id == id) else {
            warn!(field_id = %id, "change for unknown field");
            return false;
        };

        let field = &mut self.fields[index];
        if field.omit_when_hidden && !field.visible {
            warn!(field_id = %id, "dropping change to a hidden field whose value is omitted");
            return false;
        }
        field.value = Some(join_delimited_value(
            &value,
            field.value_delimiter.as_deref(),
        ));

        self.recompute(Some(id), false);
        self.notify_change();
        true
    }

    /// Marks a field as interacted with.
    pub fn on_field_focus(&mut self, id: &str) -> bool {
        let Some(field) = self.fields.iter_mut().find(|field| field.id == id) else {
            warn!(field_id = %id, "focus for unknown field");
            return false;
        };
        field.touched = true;
        self.recompute(None, false);
        true
    }

    /// Marks every field as touched so suppressed errors become visible.
    pub fn touch_all(&mut self) {
        for field in &mut self.fields {
            field.touched = true;
        }
        self.recompute(None, false);
    }

    /// Clears every field's touched flag.
    pub fn reset_touched(&mut self) {
        self.recompute(None, true);
    }

    /// True while some field still waits on its latest options request.
    pub fn has_pending_options(&self) -> bool {
        self.fields.iter().any(FieldDefinition::has_pending_options)
    }

    /// Applies settled options to the current field list. Stale resolutions are ignored.
    pub fn apply_options_resolution(&mut self, resolution: OptionsResolution) -> bool {
        match form_spec::apply_options_resolution(&self.fields, resolution) {
            Some(fields) => {
                self.fields = fields;
                self.recompute(None, false);
                true
            }
            None => false,
        }
    }

    /// Applies every options future that has already completed, without waiting.
    pub fn apply_ready_options(&mut self) -> usize {
        let mut applied = 0;
        while self.has_pending_options() {
            let Some(Some(resolution)) = self.in_flight.next().now_or_never() else {
                break;
            };
            if self.apply_options_resolution(resolution) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits until no field has a live options request and applies the results. Requests
    /// that were superseded or whose field was removed are not waited on.
    pub async fn settle_options(&mut self) -> usize {
        let mut applied = 0;
        while self.has_pending_options() {
            let Some(resolution) = self.in_flight.next().await else {
                break;
            };
            if self.apply_options_resolution(resolution) {
                applied += 1;
            }
        }
        applied
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            fields: self.fields.clone(),
            value: self.value.clone(),
            is_valid: self.is_valid(),
        }
    }

    /// Read-only context for collaborators and nested forms.
    pub fn context(&self) -> FormContext {
        FormContext {
            fields: self.fields.clone(),
            value: self.value.clone(),
            is_valid: self.is_valid(),
            disabled: self.config.disabled,
            show_validation_before_touched: self.config.show_validation_before_touched,
            options_handler: self.options_handler.clone(),
            validation_handler: self.validation_handler.clone(),
            validators: self.validators.clone(),
            parent: self.parent.clone(),
        }
    }

    pub fn shared_context(&self) -> Arc<FormContext> {
        Arc::new(self.context())
    }

    fn effective_options_handler(&self) -> Option<Arc<dyn OptionsHandler>> {
        self.options_handler.clone().or_else(|| {
            self.parent
                .as_deref()
                .and_then(FormContext::effective_options_handler)
        })
    }

    fn effective_validation_handler(&self) -> Option<Arc<dyn ValidationHandler>> {
        self.validation_handler.clone().or_else(|| {
            self.parent
                .as_deref()
                .and_then(FormContext::effective_validation_handler)
        })
    }

    fn prepare_registration(&self, mut field: FieldDefinition) -> FieldDefinition {
        let known = get_path(&self.external_value, field.output_name())
            .or_else(|| get_path(&self.value, field.output_name()));
        if let Some(known) = known {
            field.value = Some(known.clone());
        }
        self.apply_config_defaults(&mut field);
        field
    }

    fn apply_config_defaults(&self, field: &mut FieldDefinition) {
        if field.added_suffix.is_none() {
            field.added_suffix = Some(self.config.added_suffix.clone());
        }
        if field.removed_suffix.is_none() {
            field.removed_suffix = Some(self.config.removed_suffix.clone());
        }
    }

    fn recompute(&mut self, last_field_updated: Option<&str>, reset_touched: bool) {
        let processed = process_fields(&self.fields, self.config.disabled, reset_touched);

        let parent = self.parent.clone();
        let processed = match self.effective_options_handler() {
            Some(handler) => {
                let outcome = process_options(
                    &processed,
                    handler.as_ref(),
                    parent.as_deref(),
                    last_field_updated,
                    &mut self.tickets,
                );
                for pending in outcome.pending {
                    self.in_flight.push(pending.into_resolution());
                }
                outcome.fields
            }
            None => processed,
        };

        let validation_handler = self.effective_validation_handler();
        let settings = ValidationSettings {
            show_validation_before_touched: self.config.show_validation_before_touched,
            handler: validation_handler.as_deref(),
            parent: parent.as_deref(),
            validators: &self.validators,
        };
        let (validated, validity) = validate_fields(&processed, &settings);

        self.value = calculate_form_value(&validated);
        self.fields = validated;
        self.validity = validity;
        if !self.has_pending_options() && !self.in_flight.is_empty() {
            debug!(
                dropped = self.in_flight.len(),
                "dropping options requests no field waits on"
            );
            self.in_flight.clear();
        }
        self.state = FormState::Steady;
        debug!(
            fields = self.fields.len(),
            is_valid = self.validity.is_valid(),
            in_flight_options = self.in_flight.len(),
            "form recomputed"
        );
    }

    fn notify_change(&mut self) {
        let is_valid = self.validity.is_valid();
        if let Some(listener) = self.on_change.as_mut() {
            listener(&self.value, is_valid);
        }
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("fields", &self.fields)
            .field("value", &self.value)
            .field("validity", &self.validity)
            .field("in_flight_options", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// Collects handlers and the initial schema before the first pass.
#[derive(Default)]
pub struct FormBuilder {
    config: FormConfig,
    fields: Vec<FieldDefinition>,
    value: FormValue,
    options_handler: Option<Arc<dyn OptionsHandler>>,
    validation_handler: Option<Arc<dyn ValidationHandler>>,
    validators: ValidatorRegistry,
    parent: Option<Arc<FormContext>>,
    on_change: Option<ChangeListener>,
}

impl FormBuilder {
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    /// External current values, matched to fields by output name.
    pub fn value(mut self, value: FormValue) -> Self {
        self.value = value;
        self
    }

    pub fn options_handler(mut self, handler: impl OptionsHandler + 'static) -> Self {
        self.options_handler = Some(Arc::new(handler));
        self
    }

    pub fn validation_handler(mut self, handler: impl ValidationHandler + 'static) -> Self {
        self.validation_handler = Some(Arc::new(handler));
        self
    }

    pub fn validator(
        mut self,
        name: impl Into<String>,
        validator: impl CustomValidator + 'static,
    ) -> Self {
        self.validators.register(name, validator);
        self
    }

    pub fn on_change(mut self, listener: impl FnMut(&FormValue, bool) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(listener));
        self
    }

    pub fn build(self) -> Form {
        let mut form = Form {
            config: self.config,
            fields: Vec::new(),
            value: FormValue::new(),
            validity: FormValidity::default(),
            external_value: self.value,
            options_handler: self.options_handler,
            validation_handler: self.validation_handler,
            validators: self.validators,
            parent: self.parent,
            on_change: self.on_change,
            tickets: TicketIssuer::default(),
            in_flight: FuturesUnordered::new(),
            state: FormState::Uninitialized,
        };
        form.register_fields(self.fields);
        form
    }
}
