use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::{self, SerializeMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// Names of the built-in validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidatorKind {
    LengthIsGreaterThan,
    LengthIsLessThan,
    MatchesRegEx,
    FallsWithinNumericalRange,
    ComparedTo,
    Is,
    IsNot,
    AllAreTrue,
    SomeAreTrue,
    NoneAreTrue,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 10] = [
        ValidatorKind::LengthIsGreaterThan,
        ValidatorKind::LengthIsLessThan,
        ValidatorKind::MatchesRegEx,
        ValidatorKind::FallsWithinNumericalRange,
        ValidatorKind::ComparedTo,
        ValidatorKind::Is,
        ValidatorKind::IsNot,
        ValidatorKind::AllAreTrue,
        ValidatorKind::SomeAreTrue,
        ValidatorKind::NoneAreTrue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValidatorKind::LengthIsGreaterThan => "lengthIsGreaterThan",
            ValidatorKind::LengthIsLessThan => "lengthIsLessThan",
            ValidatorKind::MatchesRegEx => "matchesRegEx",
            ValidatorKind::FallsWithinNumericalRange => "fallsWithinNumericalRange",
            ValidatorKind::ComparedTo => "comparedTo",
            ValidatorKind::Is => "is",
            ValidatorKind::IsNot => "isNot",
            ValidatorKind::AllAreTrue => "allAreTrue",
            ValidatorKind::SomeAreTrue => "someAreTrue",
            ValidatorKind::NoneAreTrue => "noneAreTrue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LengthConfig {
    #[serde(default)]
    pub message: String,
    #[serde(deserialize_with = "lenient_usize")]
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeConfig {
    #[serde(default)]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<f64>,
}

/// Numbers may be written as JSON numbers or numeric strings.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn lenient_usize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match numeric(&value) {
        Some(number) if number >= 0.0 && number.fract() == 0.0 && number <= usize::MAX as f64 => {
            Ok(number as usize)
        }
        _ => Err(de::Error::custom(format!(
            "expected a non-negative integer, found {value}"
        ))),
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => numeric(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected a number, found {value}"))),
    }
}

/// Relation a value must hold against every compared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    Smaller,
    Bigger,
    Shorter,
    Longer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
    pub is: Comparison,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MembershipConfig {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombinatorConfig {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// One validator entry of a `validWhen` map.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    LengthIsGreaterThan(LengthConfig),
    LengthIsLessThan(LengthConfig),
    MatchesRegEx(PatternConfig),
    FallsWithinNumericalRange(RangeConfig),
    ComparedTo(ComparisonConfig),
    Is(MembershipConfig),
    IsNot(MembershipConfig),
    AllAreTrue(CombinatorConfig),
    SomeAreTrue(CombinatorConfig),
    NoneAreTrue(CombinatorConfig),
    /// Anything not built in; resolved against a `ValidatorRegistry` at validation time.
    Custom { name: String, config: Value },
    /// Built-in validator whose config could not be read. Always passes; the raw config is
    /// kept so the schema serializes back unchanged.
    Malformed { kind: ValidatorKind, config: Value },
}

impl ValidationRule {
    /// Parses a `name -> config` entry. Unknown names become `Custom`; built-in entries with an
    /// unreadable config become `Malformed`.
    pub fn from_entry(name: String, config: Value) -> Self {
        let Some(kind) = ValidatorKind::from_name(&name) else {
            return ValidationRule::Custom { name, config };
        };
        match Self::parse_builtin(kind, config.clone()) {
            Ok(rule) => rule,
            Err(err) => {
                warn!(
                    validator = %kind,
                    error = %err,
                    "unreadable validator config; the validator will always pass"
                );
                ValidationRule::Malformed { kind, config }
            }
        }
    }

    fn parse_builtin(kind: ValidatorKind, config: Value) -> Result<Self, serde_json::Error> {
        let rule = match kind {
            ValidatorKind::LengthIsGreaterThan => {
                ValidationRule::LengthIsGreaterThan(serde_json::from_value(config)?)
            }
            ValidatorKind::LengthIsLessThan => {
                ValidationRule::LengthIsLessThan(serde_json::from_value(config)?)
            }
            ValidatorKind::MatchesRegEx => {
                ValidationRule::MatchesRegEx(serde_json::from_value(config)?)
            }
            ValidatorKind::FallsWithinNumericalRange => {
                ValidationRule::FallsWithinNumericalRange(serde_json::from_value(config)?)
            }
            ValidatorKind::ComparedTo => ValidationRule::ComparedTo(serde_json::from_value(config)?),
            ValidatorKind::Is => ValidationRule::Is(serde_json::from_value(config)?),
            ValidatorKind::IsNot => ValidationRule::IsNot(serde_json::from_value(config)?),
            ValidatorKind::AllAreTrue => ValidationRule::AllAreTrue(serde_json::from_value(config)?),
            ValidatorKind::SomeAreTrue => {
                ValidationRule::SomeAreTrue(serde_json::from_value(config)?)
            }
            ValidatorKind::NoneAreTrue => {
                ValidationRule::NoneAreTrue(serde_json::from_value(config)?)
            }
        };
        Ok(rule)
    }

    pub fn kind(&self) -> Option<ValidatorKind> {
        let kind = match self {
            ValidationRule::LengthIsGreaterThan(_) => ValidatorKind::LengthIsGreaterThan,
            ValidationRule::LengthIsLessThan(_) => ValidatorKind::LengthIsLessThan,
            ValidationRule::MatchesRegEx(_) => ValidatorKind::MatchesRegEx,
            ValidationRule::FallsWithinNumericalRange(_) => ValidatorKind::FallsWithinNumericalRange,
            ValidationRule::ComparedTo(_) => ValidatorKind::ComparedTo,
            ValidationRule::Is(_) => ValidatorKind::Is,
            ValidationRule::IsNot(_) => ValidatorKind::IsNot,
            ValidationRule::AllAreTrue(_) => ValidatorKind::AllAreTrue,
            ValidationRule::SomeAreTrue(_) => ValidatorKind::SomeAreTrue,
            ValidationRule::NoneAreTrue(_) => ValidatorKind::NoneAreTrue,
            ValidationRule::Malformed { kind, .. } => *kind,
            ValidationRule::Custom { .. } => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &str {
        match self {
            ValidationRule::Custom { name, .. } => name,
            other => other.kind().map(ValidatorKind::as_str).unwrap_or_default(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ValidationRule::LengthIsGreaterThan(config)
            | ValidationRule::LengthIsLessThan(config) => &config.message,
            ValidationRule::MatchesRegEx(config) => &config.message,
            ValidationRule::FallsWithinNumericalRange(config) => &config.message,
            ValidationRule::ComparedTo(config) => &config.message,
            ValidationRule::Is(config) | ValidationRule::IsNot(config) => &config.message,
            ValidationRule::AllAreTrue(config)
            | ValidationRule::SomeAreTrue(config)
            | ValidationRule::NoneAreTrue(config) => &config.message,
            ValidationRule::Custom { config, .. } | ValidationRule::Malformed { config, .. } => {
                config
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
            }
        }
    }

    pub fn config_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            ValidationRule::LengthIsGreaterThan(config)
            | ValidationRule::LengthIsLessThan(config) => serde_json::to_value(config),
            ValidationRule::MatchesRegEx(config) => serde_json::to_value(config),
            ValidationRule::FallsWithinNumericalRange(config) => serde_json::to_value(config),
            ValidationRule::ComparedTo(config) => serde_json::to_value(config),
            ValidationRule::Is(config) | ValidationRule::IsNot(config) => {
                serde_json::to_value(config)
            }
            ValidationRule::AllAreTrue(config)
            | ValidationRule::SomeAreTrue(config)
            | ValidationRule::NoneAreTrue(config) => serde_json::to_value(config),
            ValidationRule::Custom { config, .. } | ValidationRule::Malformed { config, .. } => {
                Ok(config.clone())
            }
        }
    }
}

/// Ordered `validWhen` map. Serialized as a JSON object; document key order is kept so
/// error messages concatenate in the order the schema lists them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationRules(Vec<ValidationRule>);

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationRule> {
        self.0.iter()
    }

    pub fn push(&mut self, rule: ValidationRule) {
        self.0.push(rule);
    }
}

impl From<Vec<ValidationRule>> for ValidationRules {
    fn from(rules: Vec<ValidationRule>) -> Self {
        Self(rules)
    }
}

impl<'a> IntoIterator for &'a ValidationRules {
    type Item = &'a ValidationRule;
    type IntoIter = std::slice::Iter<'a, ValidationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for ValidationRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for rule in &self.0 {
            let config = rule.config_value().map_err(ser::Error::custom)?;
            map.serialize_entry(rule.name(), &config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValidationRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RulesVisitor)
    }
}

struct RulesVisitor;

impl<'de> Visitor<'de> for RulesVisitor {
    type Value = ValidationRules;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of validator names to validator configs")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut rules = Vec::new();
        while let Some((name, config)) = access.next_entry::<String, Value>()? {
            rules.push(ValidationRule::from_entry(name, config));
        }
        Ok(ValidationRules(rules))
    }
}

/// Nested condition of a combinator: validators evaluated against `field` (or the field
/// being validated when absent). Passes when every validator in it passes.
///
/// Serialized as `{ "field": "other", "<validatorName>": { ... }, ... }`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub field: Option<String>,
    pub rules: ValidationRules,
}

impl Condition {
    pub fn on(field: Option<&str>, rule: ValidationRule) -> Self {
        Self {
            field: field.map(str::to_string),
            rules: ValidationRules(vec![rule]),
        }
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.rules.len() + usize::from(self.field.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(field) = &self.field {
            map.serialize_entry("field", field)?;
        }
        for rule in &self.rules {
            let config = rule.config_value().map_err(ser::Error::custom)?;
            map.serialize_entry(rule.name(), &config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ConditionVisitor)
    }
}

struct ConditionVisitor;

impl<'de> Visitor<'de> for ConditionVisitor {
    type Value = Condition;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a condition map with an optional `field` and validator entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut condition = Condition::default();
        while let Some(key) = access.next_key::<String>()? {
            if key == "field" {
                condition.field = access.next_value::<Option<String>>()?;
                continue;
            }
            let config = access.next_value::<Value>()?;
            condition
                .rules
                .push(ValidationRule::from_entry(key, config));
        }
        Ok(condition)
    }
}
