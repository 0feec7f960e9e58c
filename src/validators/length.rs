//! Length constraints for strings and arrays

use serde_json::Value;

use crate::rule::{
    configuration_violation, Rule, RuleContext, RuleOutcome, ValueKind, Violation,
};

/// Rule for string/array length constraints.
///
/// String length is counted in code points. Applies only to strings and
/// arrays; any other kind is vacuously satisfied (pair with
/// `RequiredValidator` or a type rule when presence matters).
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
    /// Exact length required
    pub exact: Option<usize>,
    /// Custom error message
    pub message: Option<String>,
    config_error: Option<String>,
}

impl LengthValidator {
    /// Create a new length rule with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum length constraint
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self.recheck_bounds();
        self
    }

    /// Set maximum length constraint
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self.recheck_bounds();
        self
    }

    /// Set exact length requirement
    pub fn exact(mut self, exact: usize) -> Self {
        self.exact = Some(exact);
        self
    }

    /// Set length range (min and max)
    pub fn range(mut self, min: usize, max: usize) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.recheck_bounds();
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    // An inverted range is a construction error; the rule keeps working
    // but always fails with a diagnostic instead of rejecting every value
    // with a misleading length message.
    fn recheck_bounds(&mut self) {
        self.config_error = match (self.min, self.max) {
            (Some(min), Some(max)) if min > max => {
                Some(format!("min {min} is greater than max {max}"))
            }
            _ => None,
        };
    }

    fn length_of(value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()),
            Value::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    fn describe(&self, path: &str) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        if let Some(exact) = self.exact {
            return format!("{path} must be exactly {exact} characters long");
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => {
                format!("{path} must be exactly {min} characters long")
            }
            (Some(min), Some(max)) => {
                format!("{path} must be between {min} and {max} characters long")
            }
            (Some(min), None) => format!("{path} must be at least {min} characters long"),
            (None, Some(max)) => format!("{path} must be at most {max} characters long"),
            (None, None) => format!("{path} has an invalid length"),
        }
    }
}

impl Rule for LengthValidator {
    fn code(&self) -> &str {
        "length"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[ValueKind::String, ValueKind::Array]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if let Some(problem) = &self.config_error {
            return RuleOutcome::Fail(configuration_violation("length", problem));
        }

        let Some(length) = value.and_then(Self::length_of) else {
            return RuleOutcome::Pass;
        };

        if let Some(exact) = self.exact {
            if length != exact {
                return RuleOutcome::Fail(Violation::new("length_exact", self.describe(ctx.path)));
            }
            return RuleOutcome::Pass;
        }

        if let Some(min) = self.min {
            if length < min {
                return RuleOutcome::Fail(Violation::new("length_min", self.describe(ctx.path)));
            }
        }

        if let Some(max) = self.max {
            if length > max {
                return RuleOutcome::Fail(Violation::new("length_max", self.describe(ctx.path)));
            }
        }

        RuleOutcome::Pass
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        if let Some(min) = self.min {
            params.insert("min".to_string(), min.into());
        }
        if let Some(max) = self.max {
            params.insert("max".to_string(), max.into());
        }
        if let Some(exact) = self.exact {
            params.insert("exact".to_string(), exact.into());
        }
        if let Some(message) = &self.message {
            params.insert("message".to_string(), Value::String(message.clone()));
        }
        Some(Value::Object(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use serde_json::json;

    fn run(rule: &LengthValidator, value: &Value) -> RuleOutcome {
        let root = json!({});
        let config = ValidationConfig::default();
        let context = serde_json::Map::new();
        let ctx = RuleContext {
            path: "field",
            root: &root,
            context: &context,
            config: &config,
        };
        rule.check(Some(value), &ctx)
    }

    #[test]
    fn test_length_range() {
        let rule = LengthValidator::new().range(2, 5);
        assert_eq!(run(&rule, &json!("ok")), RuleOutcome::Pass);
        assert_eq!(run(&rule, &json!("hello")), RuleOutcome::Pass);
        assert!(matches!(run(&rule, &json!("x")), RuleOutcome::Fail(v) if v.code == "length_min"));
        assert!(
            matches!(run(&rule, &json!("toolong")), RuleOutcome::Fail(v) if v.code == "length_max")
        );
    }

    #[test]
    fn test_length_counts_code_points() {
        let rule = LengthValidator::new().max(5);
        // Five code points, many more bytes.
        assert_eq!(run(&rule, &json!("héllø")), RuleOutcome::Pass);
        assert_eq!(run(&rule, &json!("ñøñø")), RuleOutcome::Pass);
    }

    #[test]
    fn test_length_applies_to_arrays() {
        let rule = LengthValidator::new().min(2);
        assert_eq!(run(&rule, &json!([1, 2])), RuleOutcome::Pass);
        assert!(matches!(run(&rule, &json!([1])), RuleOutcome::Fail(_)));
    }

    #[test]
    fn test_length_exact() {
        let rule = LengthValidator::new().exact(3);
        assert_eq!(run(&rule, &json!("abc")), RuleOutcome::Pass);
        assert!(
            matches!(run(&rule, &json!("ab")), RuleOutcome::Fail(v) if v.code == "length_exact")
        );
    }

    #[test]
    fn test_length_vacuous_on_other_kinds() {
        // Kind gating happens in the engine; the checker itself also
        // passes values it cannot measure.
        let rule = LengthValidator::new().min(2);
        assert_eq!(run(&rule, &json!(42)), RuleOutcome::Pass);
        assert_eq!(run(&rule, &Value::Null), RuleOutcome::Pass);
    }

    #[test]
    fn test_inverted_range_is_configuration_error() {
        let rule = LengthValidator::new().min(5).max(2);
        let RuleOutcome::Fail(violation) = run(&rule, &json!("perfectly fine")) else {
            panic!("expected configuration failure");
        };
        assert_eq!(violation.code, crate::rule::CONFIGURATION_ERROR);
        assert!(violation.message.contains("min 5"));
    }

    #[test]
    fn test_custom_message() {
        let rule = LengthValidator::new().min(8).message("too short for a password");
        let RuleOutcome::Fail(violation) = run(&rule, &json!("hunter")) else {
            panic!("expected failure");
        };
        assert_eq!(violation.message, "too short for a password");
    }
}
