//! Validation error types and the validation report

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Individual validation error for a specific location in the input.
///
/// `path` uses dot notation for object keys and bracket notation for array
/// indices (e.g. `users[2].email`), matching the exact location validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// The path that failed validation
    pub path: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for programmatic handling
    pub code: String,
    /// Additional context or hints
    pub context: Option<Value>,
}

impl ValidationError {
    /// Create a new validation error with the default code
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            code: "validation_failed".to_string(),
            context: None,
        }
    }

    /// Create a validation error with a specific code
    pub fn with_code(
        path: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            code: code.into(),
            context: None,
        }
    }

    /// Set the error code
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set additional context
    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Ordered collection of validation errors.
///
/// Errors keep the order in which they were recorded; for a compiled
/// validator that is field declaration order, truncated only by the abort
/// policies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
pub struct ValidationErrors {
    /// All recorded errors, in declaration order
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty error collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a single validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record a simple validation error with path and message
    pub fn add_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }

    /// Check whether any errors were recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of recorded errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the recorded errors in order
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// All distinct paths that have at least one error, in first-seen order
    pub fn paths(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !seen.contains(&error.path.as_str()) {
                seen.push(&error.path);
            }
        }
        seen
    }

    /// Errors recorded for a specific path
    pub fn for_path(&self, path: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.path == path).collect()
    }

    /// Check whether a specific path has errors
    pub fn has_path_errors(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path == path)
    }

    /// Append all errors from another collection, preserving order
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    /// Create a collection holding a single error
    pub fn from_error(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    /// Convert to a JSON-serializable shape for API responses
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "message": "Validation failed",
                "errors": self.errors,
            }
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else {
            write!(f, "Validation failed with {} error(s):", self.errors.len())?;
            for error in &self.errors {
                write!(f, "\n  {}: {}", error.path, error.message)?;
            }
            Ok(())
        }
    }
}

impl std::ops::Index<usize> for ValidationErrors {
    type Output = ValidationError;

    fn index(&self, index: usize) -> &ValidationError {
        &self.errors[index]
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self::from_error(error)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Outcome of a full validation run.
///
/// `value` is the (possibly transformed) input when valid, `None` otherwise.
/// Every input, however malformed, yields a report rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether the input passed every applicable rule
    pub valid: bool,
    /// The accepted value, with transforms applied
    pub value: Option<Value>,
    /// All recorded errors, in declaration order
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Build a passing report around the given value
    pub fn passed(value: Value) -> Self {
        Self {
            valid: true,
            value: Some(value),
            errors: Vec::new(),
        }
    }

    /// Build a failing report from collected errors
    pub fn failed(errors: ValidationErrors) -> Self {
        Self {
            valid: false,
            value: None,
            errors: errors.errors,
        }
    }

    /// Errors recorded for a specific path
    pub fn for_path(&self, path: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.path == path).collect()
    }
}
