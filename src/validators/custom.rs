//! Closure-backed rules and control-flow markers

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use crate::rule::{Rule, RuleContext, RuleOutcome, ValueKind, Violation, PRESENT_KINDS};

type CheckFn = Arc<dyn Fn(Option<&Value>, &RuleContext<'_>) -> RuleOutcome + Send + Sync>;

/// Rule backed by a user-supplied closure.
///
/// Also the home of the small built-ins that are just closures with a
/// name: membership checks, truthiness, date parsing, value mapping,
/// and the control-flow markers (`skip_when`, `abort_when`,
/// `recursive`).
#[derive(Clone)]
pub struct CustomValidator {
    name: String,
    check: CheckFn,
    message: Option<String>,
    transform: bool,
    kinds: Vec<ValueKind>,
}

impl CustomValidator {
    /// Create a rule from a closure returning a [`RuleOutcome`]
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(Option<&Value>, &RuleContext<'_>) -> RuleOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Arc::new(check),
            message: None,
            transform: false,
            kinds: Vec::new(),
        }
    }

    /// Require the string value to be one of the allowed choices
    pub fn one_of(choices: Vec<String>) -> Self {
        let allowed = choices;
        let mut rule = Self::new("one_of", move |value, ctx| {
            let Some(Value::String(text)) = value else {
                return RuleOutcome::Pass;
            };
            if allowed.iter().any(|choice| choice == text) {
                RuleOutcome::Pass
            } else {
                RuleOutcome::Fail(Violation::new(
                    "not_in_list",
                    format!("{} must be one of: {}", ctx.path, allowed.join(", ")),
                ))
            }
        });
        rule.kinds = vec![ValueKind::String];
        rule
    }

    /// Reject string values present in the forbidden list
    pub fn not_one_of(choices: Vec<String>) -> Self {
        let forbidden = choices;
        let mut rule = Self::new("not_one_of", move |value, ctx| {
            let Some(Value::String(text)) = value else {
                return RuleOutcome::Pass;
            };
            if forbidden.iter().any(|choice| choice == text) {
                RuleOutcome::Fail(Violation::new(
                    "in_forbidden_list",
                    format!("{} is not an allowed value", ctx.path),
                ))
            } else {
                RuleOutcome::Pass
            }
        });
        rule.kinds = vec![ValueKind::String];
        rule
    }

    /// Require a truthy value as defined by the active configuration
    pub fn truthy() -> Self {
        let mut rule = Self::new("truthy", |value, ctx| {
            let Some(value) = value else {
                return RuleOutcome::Pass;
            };
            if ctx.config.is_truthy(value) {
                RuleOutcome::Pass
            } else {
                RuleOutcome::Fail(Violation::new(
                    "not_truthy",
                    format!("{} must be accepted", ctx.path),
                ))
            }
        });
        rule.kinds = PRESENT_KINDS.to_vec();
        rule
    }

    /// Require a string parseable as a date with the configured format
    pub fn date() -> Self {
        let mut rule = Self::new("date", |value, ctx| {
            let Some(Value::String(text)) = value else {
                return RuleOutcome::Pass;
            };
            match NaiveDate::parse_from_str(text, &ctx.config.date_format) {
                Ok(_) => RuleOutcome::Pass,
                Err(_) => RuleOutcome::Fail(Violation::new(
                    "invalid_date",
                    format!("{} must be a valid date", ctx.path),
                )),
            }
        });
        rule.kinds = vec![ValueKind::String];
        rule
    }

    /// Create a transform that replaces the value when the closure
    /// returns `Some`
    pub fn map(
        name: impl Into<String>,
        map: impl Fn(Option<&Value>) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        let mut rule = Self::new(name, move |value, _ctx| match map(value) {
            Some(replacement) => RuleOutcome::Transform(replacement),
            None => RuleOutcome::Pass,
        });
        rule.transform = true;
        rule
    }

    /// Skip the remaining rules for this field when the predicate holds
    pub fn skip_when(
        name: impl Into<String>,
        predicate: impl Fn(Option<&Value>, &RuleContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |value, ctx| {
            if predicate(value, ctx) {
                RuleOutcome::SkipFurther
            } else {
                RuleOutcome::Pass
            }
        })
    }

    /// Stop the entire run when the predicate holds
    pub fn abort_when(
        name: impl Into<String>,
        predicate: impl Fn(Option<&Value>, &RuleContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |value, ctx| {
            if predicate(value, ctx) {
                RuleOutcome::SkipAll
            } else {
                RuleOutcome::Pass
            }
        })
    }

    /// Marker requesting recursive descent into the value
    pub fn recursive(name: impl Into<String>) -> Self {
        Self::new(name, |_value, _ctx| RuleOutcome::Recursive)
    }

    /// Restrict the rule to the given value kinds
    pub fn kinds(mut self, kinds: Vec<ValueKind>) -> Self {
        self.kinds = kinds;
        self
    }

    /// Set custom error message, replacing whatever the closure reports
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidator")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("transform", &self.transform)
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

impl Rule for CustomValidator {
    fn code(&self) -> &str {
        &self.name
    }

    fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        match (self.check)(value, ctx) {
            RuleOutcome::Fail(mut violation) => {
                if let Some(message) = &self.message {
                    violation.message = message.clone();
                }
                RuleOutcome::Fail(violation)
            }
            other => other,
        }
    }

    fn is_transform(&self) -> bool {
        self.transform
    }

    fn parameters(&self) -> Option<Value> {
        let mut params = serde_json::Map::new();
        params.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(message) = &self.message {
            params.insert("message".to_string(), Value::String(message.clone()));
        }
        Some(Value::Object(params))
    }
}
