#![allow(missing_docs)]

pub mod context;
pub mod error;
pub mod options;
pub mod process;
pub mod rules;
pub mod schema;
pub mod spec;
pub mod validate;
pub mod validators;
pub mod value;

pub use context::FormContext;
pub use error::FormSpecError;
pub use options::{
    OptionsFuture, OptionsHandler, OptionsResolution, OptionsResult, OptionsTicket,
    PendingOptions, ProcessedOptions, StaticOptions, TicketIssuer, apply_options_resolution,
    process_options, should_options_be_refreshed,
};
pub use process::process_fields;
pub use rules::{
    FieldsById, coerce_to_string, evaluate_all_rules, evaluate_rule, fields_by_id, values_match,
};
pub use schema::{fields_schema, parse_fields, parse_form_value};
pub use spec::{
    Comparison, Condition, FieldDefinition, OptionGroup, OptionItem, Rule, ValidationRule,
    ValidationRules, ValidatorKind,
};
pub use validate::{
    FormValidity, REQUIRED_MESSAGE, ValidationHandler, ValidationSettings, is_empty_value,
    validate_field, validate_fields,
};
pub use validators::{CustomValidator, ValidatorContext, ValidatorRegistry, run_validator};
pub use value::{
    FormValue, calculate_changes, calculate_form_value, get_path, join_delimited_value, set_path,
    should_omit_field_value, split_delimited_value,
};
