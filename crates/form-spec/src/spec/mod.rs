pub mod field;
pub mod rule;
pub mod validation;

pub use field::{
    DEFAULT_ADDED_SUFFIX, DEFAULT_REMOVED_SUFFIX, FieldDefinition, OptionGroup, OptionItem,
};
pub use rule::Rule;
pub use validation::{
    CombinatorConfig, Comparison, ComparisonConfig, Condition, LengthConfig, MembershipConfig,
    PatternConfig, RangeConfig, ValidationRule, ValidationRules, ValidatorKind,
};
