//! Required and nullable field rules

use serde_json::Value;

use crate::rule::{Rule, RuleContext, RuleOutcome, Violation};

/// Rule that ensures a field is present and not empty.
///
/// This is the one rule that applies to missing values; every other
/// constraint rule is vacuous on an absent field.
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator {
    /// Custom error message
    pub message: Option<String>,
}

impl RequiredValidator {
    /// Create a new required rule with the default message
    pub fn new() -> Self {
        Self { message: None }
    }

    /// Create a required rule with a custom message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// Check if a value is considered empty
    fn is_empty(value: Option<&Value>) -> bool {
        match value {
            None => true,
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Object(map)) => map.is_empty(),
            Some(_) => false,
        }
    }
}

impl Rule for RequiredValidator {
    fn code(&self) -> &str {
        "required"
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if Self::is_empty(value) {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} is required", ctx.path));
            RuleOutcome::Fail(Violation::new("required", message))
        } else {
            RuleOutcome::Pass
        }
    }

    fn parameters(&self) -> Option<Value> {
        self.message
            .as_ref()
            .map(|message| serde_json::json!({ "message": message }))
    }
}

/// Rule that lets an explicit `null` bypass the field's remaining
/// validation rules, with no error. Transforms still run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableValidator;

impl NullableValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NullableValidator {
    fn code(&self) -> &str {
        "nullable"
    }

    fn check(&self, value: Option<&Value>, _ctx: &RuleContext<'_>) -> RuleOutcome {
        match value {
            Some(Value::Null) => RuleOutcome::Nullable,
            _ => RuleOutcome::Pass,
        }
    }
}
