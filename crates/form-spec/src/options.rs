use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::FormContext;
use crate::spec::field::{FieldDefinition, OptionGroup};

/// Handle of one in-flight options request. A newer request for the same field supersedes
/// older ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OptionsTicket(u64);

impl OptionsTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Hands out increasing tickets; owned by whoever drives the pipeline.
#[derive(Debug, Default)]
pub struct TicketIssuer {
    last: u64,
}

impl TicketIssuer {
    pub fn issue(&mut self) -> OptionsTicket {
        self.last += 1;
        OptionsTicket(self.last)
    }
}

pub type OptionsFuture = BoxFuture<'static, Vec<OptionGroup>>;

/// What an options handler produced for one field.
pub enum OptionsResult {
    Ready(Vec<OptionGroup>),
    Pending(OptionsFuture),
    /// The handler has nothing for this field; it will be asked again next pass.
    Unavailable,
}

impl OptionsResult {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Vec<OptionGroup>> + Send + 'static,
    {
        OptionsResult::Pending(future.boxed())
    }
}

impl From<Vec<OptionGroup>> for OptionsResult {
    fn from(options: Vec<OptionGroup>) -> Self {
        OptionsResult::Ready(options)
    }
}

impl From<Option<Vec<OptionGroup>>> for OptionsResult {
    fn from(options: Option<Vec<OptionGroup>>) -> Self {
        options.map_or(OptionsResult::Unavailable, OptionsResult::Ready)
    }
}

impl fmt::Debug for OptionsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsResult::Ready(options) => f.debug_tuple("Ready").field(options).finish(),
            OptionsResult::Pending(_) => f.write_str("Pending"),
            OptionsResult::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// Supplies option lists for fields that have none yet.
pub trait OptionsHandler: Send + Sync {
    fn options(
        &self,
        field_id: &str,
        fields: &[FieldDefinition],
        parent: Option<&FormContext>,
    ) -> OptionsResult;
}

impl<F> OptionsHandler for F
where
    F: Fn(&str, &[FieldDefinition], Option<&FormContext>) -> OptionsResult + Send + Sync,
{
    fn options(
        &self,
        field_id: &str,
        fields: &[FieldDefinition],
        parent: Option<&FormContext>,
    ) -> OptionsResult {
        self(field_id, fields, parent)
    }
}

/// Fixed option lists keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticOptions(BTreeMap<String, Vec<OptionGroup>>);

impl StaticOptions {
    pub fn new(options: BTreeMap<String, Vec<OptionGroup>>) -> Self {
        Self(options)
    }
}

impl OptionsHandler for StaticOptions {
    fn options(
        &self,
        field_id: &str,
        _fields: &[FieldDefinition],
        _parent: Option<&FormContext>,
    ) -> OptionsResult {
        self.0.get(field_id).cloned().into()
    }
}

/// Deferred options for one field, as handed back to the orchestrator.
pub struct PendingOptions {
    pub field_id: String,
    pub ticket: OptionsTicket,
    pub future: OptionsFuture,
}

impl PendingOptions {
    pub fn into_resolution(self) -> BoxFuture<'static, OptionsResolution> {
        let PendingOptions {
            field_id,
            ticket,
            future,
        } = self;
        future
            .map(move |options| OptionsResolution {
                field_id,
                ticket,
                options,
            })
            .boxed()
    }
}

impl fmt::Debug for PendingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOptions")
            .field("field_id", &self.field_id)
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Settled options for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsResolution {
    pub field_id: String,
    pub ticket: OptionsTicket,
    pub options: Vec<OptionGroup>,
}

#[derive(Debug)]
pub struct ProcessedOptions {
    pub fields: Vec<FieldDefinition>,
    pub pending: Vec<PendingOptions>,
}

/// True when `field` declares `last_field_updated` as one of its refresh triggers.
pub fn should_options_be_refreshed(
    last_field_updated: Option<&str>,
    field: &FieldDefinition,
) -> bool {
    last_field_updated.is_some_and(|updated| {
        field
            .refresh_options_on_changes_to
            .iter()
            .any(|trigger| trigger == updated)
    })
}

/// Asks `handler` for the options of every field that has none, or whose refresh trigger was
/// the last field updated. Deferred answers leave the field with an empty list and a pending
/// ticket.
pub fn process_options(
    fields: &[FieldDefinition],
    handler: &dyn OptionsHandler,
    parent: Option<&FormContext>,
    last_field_updated: Option<&str>,
    tickets: &mut TicketIssuer,
) -> ProcessedOptions {
    let mut pending = Vec::new();

    let processed = fields
        .iter()
        .map(|field| {
            let refresh = should_options_be_refreshed(last_field_updated, field);
            if field.options.is_some() && !refresh {
                return field.clone();
            }

            let mut next = field.clone();
            match handler.options(&field.id, fields, parent) {
                OptionsResult::Ready(options) => {
                    next.options = Some(options);
                    next.pending_options = None;
                }
                OptionsResult::Pending(future) => {
                    let ticket = tickets.issue();
                    debug!(field_id = %field.id, ticket = ticket.id(), "options pending");
                    next.options = Some(Vec::new());
                    next.pending_options = Some(ticket);
                    pending.push(PendingOptions {
                        field_id: field.id.clone(),
                        ticket,
                        future,
                    });
                }
                OptionsResult::Unavailable => {}
            }
            next
        })
        .collect();

    ProcessedOptions {
        fields: processed,
        pending,
    }
}

/// Splices settled options into `fields` at the field's current position.
///
/// Returns `None` when the field is gone or has since been given a newer ticket.
pub fn apply_options_resolution(
    fields: &[FieldDefinition],
    resolution: OptionsResolution,
) -> Option<Vec<FieldDefinition>> {
    let Some(index) = fields
        .iter()
        .position(|field| field.id == resolution.field_id)
    else {
        debug!(field_id = %resolution.field_id, "options resolved for a removed field");
        return None;
    };
    if fields[index].pending_options != Some(resolution.ticket) {
        debug!(
            field_id = %resolution.field_id,
            ticket = resolution.ticket.id(),
            "discarding superseded options resolution"
        );
        return None;
    }

    let mut next = fields.to_vec();
    next[index].options = Some(resolution.options);
    next[index].pending_options = None;
    Some(next)
}
