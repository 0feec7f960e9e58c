//! # verity
//!
//! Declarative data validation over JSON values. Rules are attached to
//! dot/bracket paths (with `*` wildcards for array elements), compiled
//! into a validator, and run synchronously against any `serde_json::Value`.
//! A JSON Schema front end compiles schemas into the same machinery.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod formats;
pub mod path;
pub mod rule;
pub mod rules;
pub mod schema;
pub mod validators;

// Re-exports for easy access
pub use config::ValidationConfig;
pub use engine::{ValidateOptions, Validator};
pub use error::{ValidationError, ValidationErrors, ValidationReport};
pub use formats::FormatRegistry;
pub use rule::{Rule, RuleContext, RuleOutcome, ValueKind, Violation};
pub use rules::{Rules, RulesBuilder};
pub use schema::{validate_against_schema, SchemaCompiler, SchemaViolation};

// Built-in validators
pub use validators::{
    custom::CustomValidator,
    email::EmailValidator,
    length::LengthValidator,
    numeric::NumericValidator,
    pattern::PatternValidator,
    required::{NullableValidator, RequiredValidator},
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_public_surface() {
        let rules = Rules::new()
            .rule("name", RequiredValidator::new())
            .rule("name", LengthValidator::new().min(2));
        let validator = Validator::compile(rules);
        assert!(validator.validate(&json!({"name": "Ada"})).valid);
        assert!(!validator.validate(&json!({})).valid);
    }
}
