//! JSON Schema evaluation and compilation
//!
//! Two entry points: direct evaluation ([`SchemaCompiler::check`] /
//! [`validate_against_schema`]) and compilation into the rule engine
//! ([`SchemaCompiler::compile`]), where top-level `properties` become
//! per-key rules and schema violations surface as validation errors with
//! the failing keyword as the error code.

mod keywords;

pub use keywords::{SchemaViolation, MAX_SCHEMA_DEPTH};

use serde_json::Value;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::engine::Validator;
use crate::rule::{Rule, RuleContext, RuleOutcome, ValueKind, Violation};
use crate::rules::Rules;
use keywords::EvalContext;

/// Evaluates values against a JSON Schema.
///
/// Holds the root schema so `$ref` pointers (`#`, `#/$defs/…`,
/// `#/definitions/…`, and general `#/…` lookups) resolve against it.
#[derive(Debug, Clone)]
pub struct SchemaCompiler {
    schema: Value,
    config: ValidationConfig,
}

impl SchemaCompiler {
    /// Create a compiler with the default configuration
    pub fn new(schema: Value) -> Self {
        Self::with_config(schema, ValidationConfig::default())
    }

    /// Create a compiler with an explicit configuration (custom formats)
    pub fn with_config(schema: Value, config: ValidationConfig) -> Self {
        Self { schema, config }
    }

    /// The root schema
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check a value, reporting the first failing keyword
    pub fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        let ctx = EvalContext {
            root: &self.schema,
            formats: &self.config.formats,
        };
        keywords::check_value(value, &self.schema, &ctx, 0)
    }

    /// Whether a value satisfies the schema
    pub fn is_valid(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    /// Compile a schema into a [`Validator`] with the default configuration
    pub fn compile(schema: Value) -> Validator {
        Self::compile_with(schema, ValidationConfig::default())
    }

    /// Compile a schema into a [`Validator`].
    ///
    /// Top-level `properties` become per-key field rules and `required`
    /// keys get a presence rule first, so errors carry the property path
    /// (`age`, not the root). All remaining keywords are checked by a
    /// root-path rule. Property names that collide with the path syntax
    /// (dots, wildcards, the empty key) stay in the root rule instead of
    /// becoming field paths.
    pub fn compile_with(schema: Value, config: ValidationConfig) -> Validator {
        let mut rules = Rules::new();

        if let Value::Object(map) = &schema {
            let required: Vec<&str> = match map.get("required") {
                Some(Value::Array(keys)) => keys.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            let properties = match map.get("properties") {
                Some(Value::Object(props)) => Some(props),
                _ => None,
            };

            // Per-key rules validate each property subschema; the map also
            // records which keys `properties` declared, so the root rule's
            // `additionalProperties` check still knows what is covered.
            let mut residual_props = serde_json::Map::new();
            if let Some(props) = properties {
                for (key, subschema) in props {
                    if plain_property_key(key) {
                        if required.contains(&key.as_str()) {
                            rules = rules.rule(key.clone(), PresenceRule);
                        }
                        rules = rules.rule(
                            key.clone(),
                            SchemaRule::new(subschema.clone(), schema.clone()),
                        );
                        residual_props.insert(key.clone(), Value::Bool(true));
                    } else {
                        residual_props.insert(key.clone(), subschema.clone());
                    }
                }
            }
            for key in &required {
                if plain_property_key(key)
                    && !properties.is_some_and(|props| props.contains_key(*key))
                {
                    rules = rules.rule(key.to_string(), PresenceRule);
                }
            }
            let residual_required: Vec<Value> = required
                .iter()
                .filter(|key| !plain_property_key(key))
                .map(|key| Value::String(key.to_string()))
                .collect();

            let mut residual: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(key, _)| key.as_str() != "properties" && key.as_str() != "required")
                .map(|(key, subschema)| (key.clone(), subschema.clone()))
                .collect();
            let props_needed = residual.contains_key("additionalProperties")
                || residual_props.values().any(|s| s != &Value::Bool(true));
            if props_needed && !residual_props.is_empty() {
                residual.insert("properties".to_string(), Value::Object(residual_props));
            }
            if !residual_required.is_empty() {
                residual.insert("required".to_string(), Value::Array(residual_required));
            }
            if !residual.is_empty() {
                rules = rules.rule("", SchemaRule::new(Value::Object(residual), schema.clone()));
            }
        } else {
            rules = rules.rule("", SchemaRule::new(schema.clone(), schema.clone()));
        }

        debug!(fields = rules.len(), "compiled schema into field rules");
        Validator::compile_with(rules, config)
    }
}

/// Check a value against a schema with the default format registry
pub fn validate_against_schema(value: &Value, schema: &Value) -> bool {
    SchemaCompiler::new(schema.clone()).is_valid(value)
}

/// Whether a property name survives the dot/wildcard path syntax
/// unchanged. Names that do not (dotted keys, `*`, the empty string) are
/// evaluated by the root rule rather than compiled into a field path.
fn plain_property_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('.') && !key.contains('*')
}

/// Rule wrapping one schema node.
///
/// Reports the failing keyword as the error code. An absent value
/// passes; presence is [`PresenceRule`]'s job.
#[derive(Debug, Clone)]
pub struct SchemaRule {
    schema: Value,
    root: Value,
}

impl SchemaRule {
    pub fn new(schema: Value, root: Value) -> Self {
        Self { schema, root }
    }
}

impl Rule for SchemaRule {
    fn code(&self) -> &str {
        "schema"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        let Some(value) = value else {
            return RuleOutcome::Pass;
        };
        let eval = EvalContext {
            root: &self.root,
            formats: &ctx.config.formats,
        };
        match keywords::check_value(value, &self.schema, &eval, 0) {
            Ok(()) => RuleOutcome::Pass,
            Err(violation) => {
                let path = if ctx.path.is_empty() { "value" } else { ctx.path };
                RuleOutcome::Fail(Violation::new(
                    violation.keyword,
                    format!("{path} {}", violation.detail),
                ))
            }
        }
    }

    fn parameters(&self) -> Option<Value> {
        Some(self.schema.clone())
    }
}

/// Presence rule for `required` schema keys; unlike the general required
/// rule it accepts null and empty values, matching JSON Schema semantics.
#[derive(Debug, Clone, Copy)]
struct PresenceRule;

impl Rule for PresenceRule {
    fn code(&self) -> &str {
        "required"
    }

    fn kinds(&self) -> &[ValueKind] {
        &[]
    }

    fn check(&self, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
        if value.is_some() {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(Violation::new(
                "required",
                format!("{} is required", ctx.path),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ValidateOptions;
    use serde_json::json;

    #[test]
    fn test_validate_against_schema_booleans() {
        assert!(validate_against_schema(&json!(42), &json!(true)));
        assert!(!validate_against_schema(&json!(42), &json!(false)));
    }

    #[test]
    fn test_check_reports_first_keyword() {
        let compiler = SchemaCompiler::new(json!({"type": "string", "minLength": 3}));
        assert!(compiler.is_valid(&json!("abc")));
        let violation = compiler.check(&json!("ab")).unwrap_err();
        assert_eq!(violation.keyword, "minLength");
        let violation = compiler.check(&json!(7)).unwrap_err();
        assert_eq!(violation.keyword, "type");
    }

    #[test]
    fn test_custom_formats_through_config() {
        let mut formats = crate::formats::FormatRegistry::with_defaults();
        formats.register("ticket", |s| s.starts_with("TCK-"));
        let config = ValidationConfig::default().formats(formats);
        let compiler = SchemaCompiler::with_config(json!({"format": "ticket"}), config);
        assert!(compiler.is_valid(&json!("TCK-7")));
        assert!(!compiler.is_valid(&json!("7")));
    }

    #[test]
    fn test_compile_round_trip() {
        let schema = json!({
            "type": "object",
            "properties": {"age": {"type": "integer", "minimum": 0}},
            "required": ["age"]
        });
        let validator = SchemaCompiler::compile(schema);
        let options = ValidateOptions::default().collect_all();

        let report = validator.validate_with(&json!({"age": 5}), &options);
        assert!(report.valid, "{:?}", report.errors);

        let report = validator.validate_with(&json!({"age": -1}), &options);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "age");
        assert_eq!(report.errors[0].code, "minimum");

        let report = validator.validate_with(&json!({}), &options);
        assert!(!report.valid);
        assert_eq!(report.errors[0].path, "age");
        assert_eq!(report.errors[0].code, "required");
    }

    #[test]
    fn test_compile_missing_property_without_required_is_valid() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}}
        });
        let validator = SchemaCompiler::compile(schema);
        assert!(validator.validate(&json!({})).valid);
        assert!(!validator.validate(&json!({"name": 5})).valid);
    }

    #[test]
    fn test_compile_required_null_passes_presence() {
        // JSON Schema required checks presence, not nullness.
        let schema = json!({
            "type": "object",
            "properties": {"note": true},
            "required": ["note"]
        });
        let validator = SchemaCompiler::compile(schema);
        assert!(validator.validate(&json!({"note": null})).valid);
        assert!(!validator.validate(&json!({})).valid);
    }

    #[test]
    fn test_compile_required_without_matching_property() {
        let schema = json!({
            "type": "object",
            "required": ["id"]
        });
        let validator = SchemaCompiler::compile(schema);
        assert!(validator.validate(&json!({"id": 1})).valid);
        let report = validator.validate(&json!({}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].path, "id");
        assert_eq!(report.errors[0].code, "required");
    }

    #[test]
    fn test_compile_residual_root_keywords() {
        let schema = json!({
            "type": "object",
            "properties": {"a": true},
            "maxProperties": 2
        });
        let validator = SchemaCompiler::compile(schema);
        assert!(validator.validate(&json!({"a": 1, "b": 2})).valid);
        let report = validator.validate(&json!({"a": 1, "b": 2, "c": 3}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].code, "maxProperties");
        assert_eq!(report.errors[0].path, "");
    }

    #[test]
    fn test_compile_additional_properties_respects_declared_properties() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "additionalProperties": false
        });
        let compiler = SchemaCompiler::new(schema.clone());
        let validator = SchemaCompiler::compile(schema);

        // Declared properties are covered, not "unexpected".
        let covered = json!({"name": "Ada"});
        assert!(compiler.is_valid(&covered));
        assert!(validator.validate(&covered).valid);

        let report = validator.validate(&json!({"other": 1}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].code, "additionalProperties");
        assert!(!compiler.is_valid(&json!({"other": 1})));
    }

    #[test]
    fn test_compile_additional_properties_schema_form() {
        let schema = json!({
            "properties": {"id": {"type": "integer"}},
            "additionalProperties": {"type": "string"}
        });
        let validator = SchemaCompiler::compile(schema);
        assert!(validator.validate(&json!({"id": 1, "note": "ok"})).valid);
        let report = validator.validate(&json!({"id": 1, "note": 2}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].code, "type");
    }

    #[test]
    fn test_compile_dotted_property_names_stay_literal() {
        // A dotted key is a literal property name in JSON Schema, not a
        // nested path; it is evaluated by the root rule.
        let schema = json!({
            "type": "object",
            "properties": {"a.b": {"type": "number"}},
            "required": ["a.b"]
        });
        let compiler = SchemaCompiler::new(schema.clone());
        let validator = SchemaCompiler::compile(schema);

        let present = json!({"a.b": 1});
        assert!(compiler.is_valid(&present));
        assert!(validator.validate(&present).valid);

        let report = validator.validate(&json!({}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].code, "required");

        let report = validator.validate(&json!({"a.b": "x"}));
        assert!(!report.valid);
        assert_eq!(report.errors[0].code, "type");

        // The nested shape the dotted key must NOT be read as.
        assert!(!validator.validate(&json!({"a": {"b": 1}})).valid);
    }

    #[test]
    fn test_compile_boolean_schema() {
        let validator = SchemaCompiler::compile(json!(false));
        assert!(!validator.validate(&json!({"anything": 1})).valid);
        let validator = SchemaCompiler::compile(json!(true));
        assert!(validator.validate(&json!({"anything": 1})).valid);
    }
}
