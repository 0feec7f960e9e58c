//! Validator-level configuration
//!
//! Everything that used to be a process-wide default (truthy values, date
//! format, format checkers) is an explicit configuration object passed at
//! validator construction. The engine never reads hidden globals
//! mid-validation; a `Default` instance exists purely for convenience.

use serde_json::{json, Value};

use crate::formats::FormatRegistry;

/// Configuration shared by every rule of one compiled validator.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Values accepted as "true" by truthiness rules
    pub truthy_values: Vec<Value>,
    /// `chrono` format string used by date rules
    pub date_format: String,
    /// Named format checkers consumed by the schema compiler
    pub formats: FormatRegistry,
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self {
            truthy_values: vec![
                json!(true),
                json!(1),
                json!("1"),
                json!("true"),
                json!("yes"),
                json!("on"),
            ],
            date_format: "%Y-%m-%d".to_string(),
            formats: FormatRegistry::with_defaults(),
        }
    }

    /// Replace the accepted truthy values
    pub fn truthy_values(mut self, values: Vec<Value>) -> Self {
        self.truthy_values = values;
        self
    }

    /// Replace the date format string
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Replace the format registry
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Whether a value counts as truthy under this configuration
    pub fn is_truthy(&self, value: &Value) -> bool {
        self.truthy_values.iter().any(|candidate| candidate == value)
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_truthy_values() {
        let config = ValidationConfig::default();
        assert!(config.is_truthy(&json!(true)));
        assert!(config.is_truthy(&json!("yes")));
        assert!(config.is_truthy(&json!(1)));
        assert!(!config.is_truthy(&json!(false)));
        assert!(!config.is_truthy(&json!("no")));
        assert!(!config.is_truthy(&json!(0)));
    }

    #[test]
    fn test_custom_truthy_values() {
        let config = ValidationConfig::new().truthy_values(vec![json!("si")]);
        assert!(config.is_truthy(&json!("si")));
        assert!(!config.is_truthy(&json!(true)));
    }

    #[test]
    fn test_date_format_override() {
        let config = ValidationConfig::new().date_format("%d/%m/%Y");
        assert_eq!(config.date_format, "%d/%m/%Y");
    }
}
