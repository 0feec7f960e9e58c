//! Numeric value constraints

use serde_json::Value;

use crate::rule::{
    configuration_violation, Rule, RuleContext, RuleOutcome, ValueKind, Violation,
};

/// Rule for numeric constraints.
///
/// Applies to numbers and to strings that parse as numbers; other kinds
/// are vacuously satisfied. Negative zero compares equal to zero: it is
/// neither positive nor negative under `positive_only`/`negative_only`.
#[derive(Debug, Clone, Default)]
pub struct NumericValidator {
    /// Minimum value (inclusive)
    pub min: Option<f64>,
    /// Maximum value (inclusive)
    pub max: Option<f64>,
    /// Allow only integers (no decimals)
    pub integer_only: bool,
    /// Allow only positive numbers (> 0)
    pub positive_only: bool,
    /// Allow only negative numbers (< 0)
    pub negative_only: bool,
    /// Custom error message
    pub message: Option<String>,
    config_error: Option<String>,
}

impl NumericValidator {
    /// Create a new numeric rule with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum value constraint
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.recheck_bounds();
        self
    }

    /// Set maximum value constraint
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self.recheck_bounds();
        self
    }

    /// Set value range (min and max)
    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.recheck_bounds();
        self
    }

    /// Require integer values only (no decimals)
    pub fn integer_only(mut self, integer_only: bool) -> Self {
        self.integer_only = integer_only;
        self
    }

    /// Allow only positive numbers (> 0)
    pub fn positive_only(mut self, positive_only: bool) -> Self {
        self.positive_only = positive_only;
        if positive_only {
            self.negative_only = false;
        }
        self
    }

    /// Allow only negative numbers (< 0)
    pub fn negative_only(mut self, negative_only: bool) -> Self {
        self.negative_only = negative_only;
        if negative_only {
            self.positive_only = false;
        }
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    // NaN bounds and inverted ranges are construction errors and turn the
    // rule into an always-failing diagnostic.
    fn recheck_bounds(&mut self) {
        self.config_error = None;
        if self.min.is_some_and(f64::is_nan) || self.max.is_some_and(f64::is_nan) {
            self.config_error = Some("bound is NaN".to_string());
            return;
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                self.config_error = Some(format!("min {min} is greater than max {max}"));
            }
        }
    }

    fn numeric_value(value: &Value) -> Option<f64> {
        match value {
            Value::Number(num) => num.as_f64(),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    fn describe(&self, path: &str, value: f64) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        if self.positive_only && value <= 0.0 {
            return format!("{path} must be a positive number");
        }
        if self.negative_only && value >= 0.0 {
            return format!("{path} must be a negative number");
        }
        if self.integer_only && value.fract() != 0.0 {
            return format!("{path} must be an integer");
        }
        match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => format!("{path} must equal {min}"),
            (Some(min), Some(max)) => format!("{path} must be between {min} and {max}"),
            (Some(min), None) => format!("{path} must be at least {min}"),
            (None, Some(max)) => format!("{path} must be at most {max}"),
            (None, None) => format!("{path} has an invalid numeric value: {value}"),
        }
    }
}

impl Rule for NumericValidator {
    fn code(&self) -> &str {
        "numeric"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[ValueKind::Number, ValueKind::String]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if let Some(problem) = &self.config_error {
            return RuleOutcome::Fail(configuration_violation("numeric", problem));
        }

        let Some(value) = value else {
            return RuleOutcome::Pass;
        };
        if !matches!(value, Value::Number(_) | Value::String(_)) {
            return RuleOutcome::Pass;
        }

        let Some(num) = Self::numeric_value(value) else {
            return RuleOutcome::Fail(Violation::new(
                "invalid_number",
                format!("{} must be a numeric value", ctx.path),
            ));
        };

        if !num.is_finite() {
            return RuleOutcome::Fail(Violation::new(
                "invalid_number",
                format!("{} must be a finite number", ctx.path),
            ));
        }

        if self.integer_only && num.fract() != 0.0 {
            return RuleOutcome::Fail(Violation::new("not_integer", self.describe(ctx.path, num)));
        }

        // -0.0 == 0.0 here, so -0 fails both checks.
        if self.positive_only && num <= 0.0 {
            return RuleOutcome::Fail(Violation::new("not_positive", self.describe(ctx.path, num)));
        }
        if self.negative_only && num >= 0.0 {
            return RuleOutcome::Fail(Violation::new("not_negative", self.describe(ctx.path, num)));
        }

        if let Some(min) = self.min {
            if num < min {
                return RuleOutcome::Fail(Violation::new(
                    "below_minimum",
                    self.describe(ctx.path, num),
                ));
            }
        }

        if let Some(max) = self.max {
            if num > max {
                return RuleOutcome::Fail(Violation::new(
                    "above_maximum",
                    self.describe(ctx.path, num),
                ));
            }
        }

        RuleOutcome::Pass
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        if let Some(min) = self.min.and_then(serde_json::Number::from_f64) {
            params.insert("min".to_string(), Value::Number(min));
        }
        if let Some(max) = self.max.and_then(serde_json::Number::from_f64) {
            params.insert("max".to_string(), Value::Number(max));
        }
        params.insert("integer_only".to_string(), Value::Bool(self.integer_only));
        params.insert("positive_only".to_string(), Value::Bool(self.positive_only));
        params.insert("negative_only".to_string(), Value::Bool(self.negative_only));
        if let Some(message) = &self.message {
            params.insert("message".to_string(), Value::String(message.clone()));
        }
        Some(Value::Object(params))
    }
}
