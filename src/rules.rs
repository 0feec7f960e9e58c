//! Field rule sets and the fluent builder

use std::sync::Arc;

use crate::path::{self, PathSegments};
use crate::rule::Rule;
use crate::validators::{
    CustomValidator, EmailValidator, LengthValidator, NumericValidator, PatternValidator,
    RequiredValidator,
};

/// The ordered rules declared for one path.
#[derive(Clone)]
pub struct FieldRules {
    /// Declared path, possibly containing wildcard segments
    pub path: String,
    /// Interned segment sequence for the path
    pub segments: PathSegments,
    /// Rules in declaration order
    pub rules: Vec<Arc<dyn Rule>>,
}

/// Ordered collection of field rule sets.
///
/// Declaration order is preserved and drives error ordering. Declaring the
/// same path twice replaces the prior list in place (last write wins).
#[derive(Clone, Default)]
pub struct Rules {
    fields: Vec<FieldRules>,
}

impl std::fmt::Debug for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rules")
            .field("field_count", &self.fields.len())
            .field("paths", &self.paths())
            .finish()
    }
}

impl Rules {
    /// Create a new empty rule collection
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Declare the full rule list for a path, replacing any prior
    /// declaration for the same path.
    pub fn field(mut self, path: impl Into<String>, rules: Vec<Arc<dyn Rule>>) -> Self {
        let path = path.into();
        let segments = path::segments(&path);
        match self.fields.iter_mut().find(|f| f.path == path) {
            Some(existing) => existing.rules = rules,
            None => self.fields.push(FieldRules {
                path,
                segments,
                rules,
            }),
        }
        self
    }

    /// Append a single rule to a path's declaration, creating it if absent
    pub fn rule<R>(mut self, path: impl Into<String>, rule: R) -> Self
    where
        R: Rule + 'static,
    {
        let path = path.into();
        match self.fields.iter_mut().find(|f| f.path == path) {
            Some(existing) => existing.rules.push(Arc::new(rule)),
            None => {
                let segments = path::segments(&path);
                self.fields.push(FieldRules {
                    path,
                    segments,
                    rules: vec![Arc::new(rule)],
                });
            }
        }
        self
    }

    /// All declared field rule sets, in declaration order
    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    /// Rules declared for a specific path
    pub fn for_path(&self, path: &str) -> Option<&[Arc<dyn Rule>]> {
        self.fields
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.rules.as_slice())
    }

    /// Whether any rules are declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of declared paths
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// All declared paths, in declaration order
    pub fn paths(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.path.as_str()).collect()
    }
}

/// Fluent builder for common rule combinations.
///
/// Every helper declares the field's kind explicitly through the rules it
/// attaches; nothing is inferred from how the value is later used.
#[derive(Default)]
pub struct RulesBuilder {
    rules: Rules,
}

impl RulesBuilder {
    /// Create a new rules builder
    pub fn new() -> Self {
        Self {
            rules: Rules::new(),
        }
    }

    /// Build and return the accumulated rules
    pub fn build(self) -> Rules {
        self.rules
    }

    /// A required string field with optional length bounds
    pub fn required_string(
        mut self,
        path: impl Into<String>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    ) -> Self {
        let path = path.into();
        self.rules = self.rules.rule(path.clone(), RequiredValidator::new());
        if min_length.is_some() || max_length.is_some() {
            let mut length = LengthValidator::new();
            if let Some(min) = min_length {
                length = length.min(min);
            }
            if let Some(max) = max_length {
                length = length.max(max);
            }
            self.rules = self.rules.rule(path, length);
        }
        self
    }

    /// A required email field
    pub fn required_email(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.rules = self
            .rules
            .rule(path.clone(), RequiredValidator::new())
            .rule(path, EmailValidator::new());
        self
    }

    /// An optional email field; absent and null values pass
    pub fn optional_email(mut self, path: impl Into<String>) -> Self {
        self.rules = self.rules.rule(path, EmailValidator::new());
        self
    }

    /// A required numeric field with optional bounds
    pub fn required_number(
        mut self,
        path: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        let path = path.into();
        self.rules = self.rules.rule(path.clone(), RequiredValidator::new());
        let mut numeric = NumericValidator::new();
        if let Some(min) = min {
            numeric = numeric.min(min);
        }
        if let Some(max) = max {
            numeric = numeric.max(max);
        }
        self.rules = self.rules.rule(path, numeric);
        self
    }

    /// A required integer field with optional bounds
    pub fn required_integer(
        mut self,
        path: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Self {
        let path = path.into();
        self.rules = self.rules.rule(path.clone(), RequiredValidator::new());
        let mut numeric = NumericValidator::new().integer_only(true);
        if let Some(min) = min {
            numeric = numeric.min(min);
        }
        if let Some(max) = max {
            numeric = numeric.max(max);
        }
        self.rules = self.rules.rule(path, numeric);
        self
    }

    /// A string field matching a regular expression
    pub fn pattern(mut self, path: impl Into<String>, pattern: &str) -> Self {
        self.rules = self.rules.rule(path, PatternValidator::new(pattern));
        self
    }

    /// A string field restricted to a set of allowed values
    pub fn one_of(mut self, path: impl Into<String>, allowed: Vec<String>) -> Self {
        self.rules = self.rules.rule(path, CustomValidator::one_of(allowed));
        self
    }

    /// Attach an arbitrary rule to a path
    pub fn custom<R>(mut self, path: impl Into<String>, rule: R) -> Self
    where
        R: Rule + 'static,
    {
        self.rules = self.rules.rule(path, rule);
        self
    }
}
