//! The rule contract every validation or transform operation satisfies

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ValidationConfig;

/// Runtime kind of a value under validation.
///
/// `Missing` is the kind of an absent value (an intermediate container was
/// not there); it is distinct from an explicit JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Missing,
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Kind of the given value; `None` is missing.
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => ValueKind::Missing,
            Some(Value::Null) => ValueKind::Null,
            Some(Value::Bool(_)) => ValueKind::Bool,
            Some(Value::Number(_)) => ValueKind::Number,
            Some(Value::String(_)) => ValueKind::String,
            Some(Value::Array(_)) => ValueKind::Array,
            Some(Value::Object(_)) => ValueKind::Object,
        }
    }

    /// Stable lowercase name, matching JSON type vocabulary
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Missing => "missing",
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single recorded rule failure, before path/message resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Stable code identifying the failed constraint
    pub code: String,
    /// Default human-readable message
    pub message: String,
}

impl Violation {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Outcome of running one rule against one value.
///
/// This is a closed set the engine matches exhaustively; control flow is
/// expressed here rather than through marker flags on the rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Constraint satisfied (or vacuously satisfied)
    Pass,
    /// Constraint violated; recorded as an error
    Fail(Violation),
    /// Replace the working value for this field
    Transform(Value),
    /// Stop remaining validation rules for this field; transforms still run
    SkipFurther,
    /// Stop validation for the entire remaining run; transforms still run
    SkipAll,
    /// A null value bypasses the field's remaining validation rules
    Nullable,
    /// Marker for self-referential re-validation, consumed by composing
    /// rules; the engine itself treats it as a pass
    Recursive,
}

/// Read-only context handed to every rule checker.
pub struct RuleContext<'a> {
    /// Path of the field being validated
    pub path: &'a str,
    /// The full working value (all fields, transforms applied so far)
    pub root: &'a Value,
    /// Caller-supplied context map, passed through unchanged
    pub context: &'a serde_json::Map<String, Value>,
    /// Validator-level configuration
    pub config: &'a ValidationConfig,
}

/// Uniform shape every validation or transform operation must satisfy.
///
/// Rules are immutable once constructed. Configuration errors (an invalid
/// bound, a bad regex) must be captured at construction and surfaced as an
/// always-failing checker with code `configuration_error`, never as a panic
/// or a build-time error.
pub trait Rule: Send + Sync {
    /// Stable code/identifier for this rule
    fn code(&self) -> &str;

    /// Value kinds this rule applies to; an empty slice means any kind.
    ///
    /// A rule whose kinds exclude the current value's kind is vacuously
    /// satisfied. Absent or wrong-typed values are the job of a dedicated
    /// required/type rule, not every constraint rule.
    fn kinds(&self) -> &[ValueKind] {
        &[]
    }

    /// Run the rule. `value` is `None` when the field is missing.
    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome;

    /// Whether this rule is a transform; transforms keep running after
    /// skip-further/skip-all suppress validation rules.
    fn is_transform(&self) -> bool {
        false
    }

    /// Rule parameters/configuration as JSON, for introspection
    fn parameters(&self) -> Option<Value> {
        None
    }
}

/// Kinds slice for rules that apply to any present value but not to a
/// missing one.
pub const PRESENT_KINDS: &[ValueKind] = &[
    ValueKind::Null,
    ValueKind::Bool,
    ValueKind::Number,
    ValueKind::String,
    ValueKind::Array,
    ValueKind::Object,
];

/// Code used by rules whose construction-time configuration was invalid
pub const CONFIGURATION_ERROR: &str = "configuration_error";

/// Build the failure every misconfigured rule reports
pub fn configuration_violation(rule: &str, detail: impl fmt::Display) -> Violation {
    Violation::new(
        CONFIGURATION_ERROR,
        format!("{rule} rule is misconfigured: {detail}"),
    )
}
