use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::warn;

use crate::rules::{FieldsById, coerce_to_string, rule_target_value, values_match};
use crate::spec::field::FieldDefinition;
use crate::spec::validation::{
    CombinatorConfig, Comparison, ComparisonConfig, Condition, PatternConfig, RangeConfig,
    ValidationRule,
};

static NULL: Value = Value::Null;

/// Everything a validator may look at.
#[derive(Clone, Copy)]
pub struct ValidatorContext<'a> {
    /// Value under test; differs from `field`'s own value inside scoped conditions.
    pub value: &'a Value,
    pub field: &'a FieldDefinition,
    pub fields: &'a FieldsById<'a>,
    pub registry: &'a ValidatorRegistry,
}

/// Extension point for validators that are not built in.
pub trait CustomValidator: Send + Sync {
    fn validate(&self, config: &Value, ctx: &ValidatorContext<'_>) -> Option<String>;
}

impl<F> CustomValidator for F
where
    F: Fn(&Value, &ValidatorContext<'_>) -> Option<String> + Send + Sync,
{
    fn validate(&self, config: &Value, ctx: &ValidatorContext<'_>) -> Option<String> {
        self(config, ctx)
    }
}

/// Custom validators keyed by the name used in `validWhen`.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    custom: BTreeMap<String, Arc<dyn CustomValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, validator: impl CustomValidator + 'static) {
        self.custom.insert(name.into(), Arc::new(validator));
    }

    pub fn with(mut self, name: impl Into<String>, validator: impl CustomValidator + 'static) -> Self {
        self.register(name, validator);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomValidator>> {
        self.custom.get(name)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Runs one validator; `None` means the value passes.
pub fn run_validator(rule: &ValidationRule, ctx: &ValidatorContext<'_>) -> Option<String> {
    let value = ctx.value;
    match rule {
        ValidationRule::LengthIsGreaterThan(config) => {
            (length_of(value) <= config.length).then(|| config.message.clone())
        }
        ValidationRule::LengthIsLessThan(config) => {
            (length_of(value) >= config.length).then(|| config.message.clone())
        }
        ValidationRule::MatchesRegEx(config) => matches_reg_ex(config, ctx),
        ValidationRule::FallsWithinNumericalRange(config) => falls_within_range(config, value),
        ValidationRule::ComparedTo(config) => compared_to(config, ctx),
        ValidationRule::Is(config) => (!config
            .values
            .iter()
            .any(|candidate| values_match(value, candidate)))
        .then(|| config.message.clone()),
        ValidationRule::IsNot(config) => config
            .values
            .iter()
            .any(|candidate| values_match(value, candidate))
            .then(|| config.message.clone()),
        ValidationRule::AllAreTrue(config) => {
            let all = config
                .conditions
                .iter()
                .all(|condition| condition_passes(condition, ctx));
            (!all).then(|| config.message.clone())
        }
        ValidationRule::SomeAreTrue(config) => {
            (!any_condition_passes(config, ctx)).then(|| config.message.clone())
        }
        ValidationRule::NoneAreTrue(config) => {
            any_condition_passes(config, ctx).then(|| config.message.clone())
        }
        ValidationRule::Malformed { kind, .. } => {
            warn!(
                field_id = %ctx.field.id,
                validator = %kind,
                "skipping validator with an unreadable config"
            );
            None
        }
        ValidationRule::Custom { name, config } => match ctx.registry.get(name) {
            Some(validator) => validator.validate(config, ctx),
            None => {
                warn!(
                    field_id = %ctx.field.id,
                    validator = %name,
                    "unknown validator; treating as passing"
                );
                None
            }
        },
    }
}

/// Length of strings and arrays; other scalars are measured by their string form and
/// `null` counts as empty.
pub fn length_of(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        other => coerce_to_string(other).chars().count(),
    }
}

/// Numeric reading of a value: numbers, or strings that parse as one.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
        }
        _ => None,
    }
}

/// Reads RFC 3339 timestamps and plain `YYYY-MM-DD` dates as UTC nanoseconds.
pub fn as_timestamp(value: &Value) -> Option<i128> {
    let text = value.as_str()?.trim();
    if let Ok(at) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(at.unix_timestamp_nanos());
    }
    let format = time::format_description::parse("[year]-[month]-[day]").ok()?;
    let date = Date::parse(text, &format).ok()?;
    Some(date.midnight().assume_utc().unix_timestamp_nanos())
}

fn matches_reg_ex(config: &PatternConfig, ctx: &ValidatorContext<'_>) -> Option<String> {
    let pattern = config.pattern.as_deref().unwrap_or(".*");
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => {
            warn!(
                field_id = %ctx.field.id,
                pattern,
                error = %err,
                "invalid matchesRegEx pattern; treating as passing"
            );
            return None;
        }
    };
    (!regex.is_match(&coerce_to_string(ctx.value))).then(|| config.message.clone())
}

fn falls_within_range(config: &RangeConfig, value: &Value) -> Option<String> {
    let Some(number) = as_number(value) else {
        return Some(config.message.clone());
    };
    let below = config.min.is_some_and(|min| number < min);
    let above = config.max.is_some_and(|max| number > max);
    (below || above).then(|| config.message.clone())
}

fn compared_to(config: &ComparisonConfig, ctx: &ValidatorContext<'_>) -> Option<String> {
    if is_blank(ctx.value) {
        return None;
    }

    for id in &config.fields {
        let Some(other) = ctx.fields.get(id.as_str()) else {
            warn!(
                field_id = %ctx.field.id,
                compared_field = %id,
                "comparedTo references an unknown field; skipping it"
            );
            continue;
        };
        let other_value = rule_target_value(other);
        if is_blank(other_value) {
            continue;
        }
        if !relation_holds(config.is, ctx.value, other_value) {
            return Some(config.message.clone());
        }
    }
    None
}

fn relation_holds(relation: Comparison, value: &Value, other: &Value) -> bool {
    match relation {
        Comparison::Smaller => compare_ordered(value, other) == Some(Ordering::Less),
        Comparison::Bigger => compare_ordered(value, other) == Some(Ordering::Greater),
        Comparison::Shorter => length_of(value) < length_of(other),
        Comparison::Longer => length_of(value) > length_of(other),
    }
}

fn compare_ordered(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (as_number(left), as_number(right)) {
        return left.partial_cmp(&right);
    }
    if let (Some(left), Some(right)) = (as_timestamp(left), as_timestamp(right)) {
        return Some(left.cmp(&right));
    }
    None
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn any_condition_passes(config: &CombinatorConfig, ctx: &ValidatorContext<'_>) -> bool {
    config
        .conditions
        .iter()
        .any(|condition| condition_passes(condition, ctx))
}

fn condition_passes(condition: &Condition, ctx: &ValidatorContext<'_>) -> bool {
    let scoped = match condition.field.as_deref() {
        None => *ctx,
        Some(id) => match ctx.fields.get(id) {
            Some(&other) => ValidatorContext {
                value: rule_target_value(other),
                field: other,
                ..*ctx
            },
            None => ValidatorContext {
                value: &NULL,
                ..*ctx
            },
        },
    };
    condition
        .rules
        .iter()
        .all(|rule| run_validator(rule, &scoped).is_none())
}
