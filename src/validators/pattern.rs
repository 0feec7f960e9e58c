//! Regular expression matching

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::rule::{
    configuration_violation, Rule, RuleContext, RuleOutcome, ValueKind, Violation,
};

/// Rule that matches strings against a regular expression.
///
/// By default the whole string must match; use [`search`](Self::search)
/// to accept a match anywhere in the string. An invalid pattern is not a
/// panic: the rule is still constructed and reports a configuration
/// error on every check.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    /// The original pattern source
    pub pattern: String,
    /// Custom error message
    pub message: Option<String>,
    /// Whether the entire string must match
    pub full_match: bool,
    regex: Option<Regex>,
    config_error: Option<String>,
}

impl PatternValidator {
    /// Create a new pattern rule from a regex pattern
    pub fn new(pattern: &str) -> Self {
        let (regex, config_error) = match Regex::new(pattern) {
            Ok(regex) => (Some(regex), None),
            Err(err) => (None, Some(format!("invalid pattern {pattern:?}: {err}"))),
        };
        Self {
            pattern: pattern.to_string(),
            message: None,
            full_match: true,
            regex,
            config_error,
        }
    }

    /// Create a case-insensitive pattern rule
    pub fn new_case_insensitive(pattern: &str) -> Self {
        let (regex, config_error) = match RegexBuilder::new(pattern).case_insensitive(true).build()
        {
            Ok(regex) => (Some(regex), None),
            Err(err) => (None, Some(format!("invalid pattern {pattern:?}: {err}"))),
        };
        Self {
            pattern: pattern.to_string(),
            message: None,
            full_match: true,
            regex,
            config_error,
        }
    }

    /// Accept a match anywhere in the string instead of requiring the
    /// whole string to match
    pub fn search(mut self) -> Self {
        self.full_match = false;
        self
    }

    /// Set custom error message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Letters and digits only
    pub fn alphanumeric() -> Self {
        Self::new(r"[a-zA-Z0-9]+").message("must contain only letters and numbers")
    }

    /// Lowercase URL slug (letters, digits, hyphens)
    pub fn slug() -> Self {
        Self::new(r"[a-z0-9]+(?:-[a-z0-9]+)*").message("must be a valid slug")
    }

    /// HTTP or HTTPS URL
    pub fn url() -> Self {
        Self::new(r"https?://[^\s/$.?#].[^\s]*").message("must be a valid URL")
    }

    fn matches(&self, regex: &Regex, text: &str) -> bool {
        if self.full_match {
            regex
                .find(text)
                .is_some_and(|m| m.start() == 0 && m.end() == text.len())
        } else {
            regex.is_match(text)
        }
    }
}

impl Rule for PatternValidator {
    fn code(&self) -> &str {
        "pattern"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[ValueKind::String]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if let Some(problem) = &self.config_error {
            return RuleOutcome::Fail(configuration_violation("pattern", problem));
        }
        let Some(Value::String(text)) = value else {
            return RuleOutcome::Pass;
        };
        let Some(regex) = &self.regex else {
            return RuleOutcome::Pass;
        };

        if self.matches(regex, text) {
            RuleOutcome::Pass
        } else {
            let message = self
                .message
                .clone()
                .unwrap_or_else(|| format!("{} does not match the expected format", ctx.path));
            RuleOutcome::Fail(Violation::new("pattern_mismatch", message))
        }
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        params.insert("pattern".to_string(), Value::String(self.pattern.clone()));
        params.insert("full_match".to_string(), Value::Bool(self.full_match));
        if let Some(message) = &self.message {
            params.insert("message".to_string(), Value::String(message.clone()));
        }
        Some(Value::Object(params))
    }
}
