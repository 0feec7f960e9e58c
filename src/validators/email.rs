//! Email address validation

use regex::Regex;
use serde_json::Value;

use crate::formats::EMAIL_PATTERN;
use crate::rule::{
    configuration_violation, Rule, RuleContext, RuleOutcome, ValueKind, Violation,
};

/// Rule for email address validation.
///
/// Uses the same pattern as the `email` format checker, plus the RFC
/// length limits: at most 64 characters before the `@` and at most 255
/// after it.
#[derive(Debug, Clone, Default)]
pub struct EmailValidator {
    /// Custom regex pattern replacing the default
    pub custom_pattern: Option<String>,
    /// Custom error message
    pub message: Option<String>,
    custom_regex: Option<Regex>,
    config_error: Option<String>,
}

impl EmailValidator {
    /// Create a new email rule with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default pattern with a custom one
    pub fn custom_pattern(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        match Regex::new(&pattern) {
            Ok(regex) => {
                self.custom_regex = Some(regex);
                self.config_error = None;
            }
            Err(err) => {
                self.custom_regex = None;
                self.config_error = Some(format!("invalid pattern {pattern:?}: {err}"));
            }
        }
        self.custom_pattern = Some(pattern);
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn is_valid(&self, email: &str) -> bool {
        let matched = match &self.custom_regex {
            Some(regex) => regex.is_match(email),
            None => EMAIL_PATTERN.is_match(email),
        };
        if !matched {
            return false;
        }
        // Length limits apply regardless of the pattern in use.
        match email.split_once('@') {
            Some((local, domain)) => local.len() <= 64 && domain.len() <= 255,
            None => false,
        }
    }
}

impl Rule for EmailValidator {
    fn code(&self) -> &str {
        "email"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[ValueKind::String]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if let Some(problem) = &self.config_error {
            return RuleOutcome::Fail(configuration_violation("email", problem));
        }
        let Some(Value::String(email)) = value else {
            return RuleOutcome::Pass;
        };

        if self.is_valid(email) {
            RuleOutcome::Pass
        } else {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} must be a valid email address", ctx.path));
            RuleOutcome::Fail(Violation::new("invalid_email", message))
        }
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        if let Some(pattern) = &self.custom_pattern {
            params.insert("pattern".to_string(), Value::String(pattern.clone()));
        }
        if let Some(message) = &self.message {
            params.insert("message".to_string(), Value::String(message.clone()));
        }
        Some(Value::Object(params))
    }
}
