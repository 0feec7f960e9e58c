//! Rule execution engine
//!
//! Compiles a rule collection into a [`Validator`] and runs it: field
//! values are resolved through the path cache, batched array groups walk
//! each array once, control-flow outcomes are interpreted, and errors are
//! aggregated into a [`ValidationReport`]. The engine is synchronous end to
//! end and never panics on malformed input; every input yields a report.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::batch::{indexed_path, BatchGroup, BatchPlan, Slot};
use crate::config::ValidationConfig;
use crate::error::{ValidationError, ValidationErrors, ValidationReport};
use crate::path::{self, WILDCARD};
use crate::rule::{Rule, RuleContext, RuleOutcome, ValueKind, Violation};
use crate::rules::Rules;

/// Inputs handed to a caller-supplied message factory.
pub struct MessageContext<'a> {
    /// Path of the failing value
    pub path: &'a str,
    /// Code of the failed rule
    pub code: &'a str,
    /// The rule's own message, before overrides
    pub default_message: &'a str,
    /// The failing value, when present
    pub value: Option<&'a Value>,
    /// The failed rule's parameters, when it exposes any
    pub params: Option<Value>,
}

/// Caller-supplied message override
pub type MessageFactory = Arc<dyn Fn(&MessageContext<'_>) -> String + Send + Sync>;

/// Caller-supplied translation hook: `(code, params) → message`
pub type Translator = Arc<dyn Fn(&str, Option<&Value>) -> String + Send + Sync>;

/// Options for a single validation run.
#[derive(Clone)]
pub struct ValidateOptions {
    /// Stop the entire run at the first failing rule across all fields
    pub abort_early: bool,
    /// Stop a single field's rule chain at its first failure but continue
    /// with the remaining fields
    pub abort_early_on_each_field: bool,
    /// Message override applied to every recorded error
    pub message_factory: Option<MessageFactory>,
    /// Translation hook, consulted when no message factory is set
    pub translate: Option<Translator>,
    /// Arbitrary context passed through to every rule checker
    pub context: serde_json::Map<String, Value>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            abort_early: true,
            abort_early_on_each_field: true,
            message_factory: None,
            translate: None,
            context: serde_json::Map::new(),
        }
    }
}

impl std::fmt::Debug for ValidateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidateOptions")
            .field("abort_early", &self.abort_early)
            .field("abort_early_on_each_field", &self.abort_early_on_each_field)
            .field("has_message_factory", &self.message_factory.is_some())
            .field("has_translate", &self.translate.is_some())
            .finish()
    }
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every error instead of stopping at the first failing rule
    pub fn collect_all(mut self) -> Self {
        self.abort_early = false;
        self
    }

    pub fn abort_early(mut self, abort: bool) -> Self {
        self.abort_early = abort;
        self
    }

    pub fn abort_early_on_each_field(mut self, abort: bool) -> Self {
        self.abort_early_on_each_field = abort;
        self
    }

    pub fn message_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        self.message_factory = Some(Arc::new(factory));
        self
    }

    pub fn translate<F>(mut self, translate: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> String + Send + Sync + 'static,
    {
        self.translate = Some(Arc::new(translate));
        self
    }

    pub fn context(mut self, context: serde_json::Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}

/// Run-wide control flow accumulated while fields execute.
struct RunFlow {
    /// A failure under `abort_early`: stop everything
    halt: bool,
    /// A skip-all outcome: remaining validation rules are suppressed,
    /// transforms still run
    skip_validations: bool,
    /// Whether any transform rewrote the working value
    any_transform: bool,
}

/// A compiled validator: immutable field rule sets plus the derived batch
/// plan and configuration. Compiled once, then shared freely across runs.
pub struct Validator {
    rules: Rules,
    plan: BatchPlan,
    config: ValidationConfig,
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules)
            .field("plan", &self.plan)
            .finish()
    }
}

impl Validator {
    /// Compile a rule collection with the default configuration.
    pub fn compile(rules: Rules) -> Self {
        Self::compile_with(rules, ValidationConfig::default())
    }

    /// Compile a rule collection with an explicit configuration.
    pub fn compile_with(rules: Rules, config: ValidationConfig) -> Self {
        let plan = BatchPlan::analyze(&rules);
        debug!(
            fields = rules.len(),
            batch_groups = plan.groups().len(),
            "compiled validator"
        );
        Self {
            rules,
            plan,
            config,
        }
    }

    /// The configuration this validator was compiled with
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate with default options (both abort policies on).
    pub fn validate(&self, input: &Value) -> ValidationReport {
        self.validate_with(input, &ValidateOptions::default())
    }

    /// Validate with caller-supplied options.
    pub fn validate_with(&self, input: &Value, options: &ValidateOptions) -> ValidationReport {
        let mut working = input.clone();
        let mut errors = ValidationErrors::new();
        let mut flow = RunFlow {
            halt: false,
            skip_validations: false,
            any_transform: false,
        };
        let mut group_done = vec![false; self.plan.groups().len()];

        for (index, field) in self.rules.fields().iter().enumerate() {
            if flow.halt {
                break;
            }
            match self.plan.slot(index) {
                Slot::Plain => {
                    let value = path::accessor(&field.path)(&working).cloned();
                    let write: Vec<String> = field.segments.to_vec();
                    self.run_chain(
                        &field.rules,
                        &field.path,
                        value,
                        &write,
                        &mut working,
                        options,
                        &mut errors,
                        &mut flow,
                    );
                }
                Slot::Group(group_index) => {
                    if !group_done[group_index] {
                        group_done[group_index] = true;
                        self.run_group(
                            &self.plan.groups()[group_index],
                            &mut working,
                            options,
                            &mut errors,
                            &mut flow,
                        );
                    }
                }
            }
        }

        trace!(
            valid = errors.is_empty(),
            errors = errors.len(),
            transformed = flow.any_transform,
            "validation run finished"
        );

        if errors.is_empty() {
            ValidationReport::passed(working)
        } else {
            ValidationReport::failed(errors)
        }
    }

    /// Run one batched group: walk the array path once, resolving earlier
    /// wildcards recursively, then evaluate every member per element.
    fn run_group(
        &self,
        group: &BatchGroup,
        working: &mut Value,
        options: &ValidateOptions,
        errors: &mut ValidationErrors,
        flow: &mut RunFlow,
    ) {
        // Snapshot of the portion under the array path; element chains may
        // write back into `working` through concrete indexed paths.
        let snapshot = working.clone();
        let mut rendered = String::new();
        let mut concrete: Vec<String> = Vec::new();
        self.walk_group(
            group,
            &snapshot,
            &group.array_segments,
            &mut rendered,
            &mut concrete,
            working,
            options,
            errors,
            flow,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_group(
        &self,
        group: &BatchGroup,
        value: &Value,
        remaining: &[String],
        rendered: &mut String,
        concrete: &mut Vec<String>,
        working: &mut Value,
        options: &ValidateOptions,
        errors: &mut ValidationErrors,
        flow: &mut RunFlow,
    ) {
        if flow.halt {
            return;
        }

        let Some((segment, rest)) = remaining.split_first() else {
            // Reached the array the final wildcard iterates.
            let Value::Array(elements) = value else {
                return; // missing or non-array: zero errors, by contract
            };
            for (index, element) in elements.iter().enumerate() {
                if flow.halt {
                    return;
                }
                for member in &group.members {
                    if flow.halt {
                        return;
                    }
                    let element_value = if member.relative_segments.is_empty() {
                        Some(element.clone())
                    } else {
                        path::accessor(&member.relative_path)(element).cloned()
                    };
                    let error_path = indexed_path(rendered, index, &member.relative_path);

                    let mut write = concrete.clone();
                    write.push(index.to_string());
                    write.extend(member.relative_segments.iter().cloned());

                    self.run_chain(
                        &member.rules,
                        &error_path,
                        element_value,
                        &write,
                        working,
                        options,
                        errors,
                        flow,
                    );
                }
            }
            return;
        };

        if segment == WILDCARD {
            // An earlier wildcard: iterate here, extending the `[i]` index
            // pattern, and recurse one dimension deeper.
            let Value::Array(elements) = value else {
                return;
            };
            let prefix_len = rendered.len();
            for (index, element) in elements.iter().enumerate() {
                if flow.halt {
                    return;
                }
                rendered.truncate(prefix_len);
                rendered.push_str(&format!("[{index}]"));
                concrete.push(index.to_string());
                self.walk_group(
                    group, element, rest, rendered, concrete, working, options, errors, flow,
                );
                concrete.pop();
            }
            rendered.truncate(prefix_len);
            return;
        }

        let Some(next) = path::step(value, segment) else {
            return; // absent container along the array path: zero errors
        };

        let prefix_len = rendered.len();
        if !rendered.is_empty() {
            rendered.push('.');
        }
        rendered.push_str(segment);
        concrete.push(segment.clone());
        self.walk_group(
            group, next, rest, rendered, concrete, working, options, errors, flow,
        );
        concrete.pop();
        rendered.truncate(prefix_len);
    }

    /// Run one field's rule chain over its current value.
    ///
    /// This is the per-field state machine: failures honor the abort
    /// policies, transforms update the working value, skip outcomes
    /// suppress remaining validation rules while transforms keep running.
    #[allow(clippy::too_many_arguments)]
    fn run_chain(
        &self,
        rules: &[Arc<dyn Rule>],
        error_path: &str,
        initial: Option<Value>,
        write_segments: &[String],
        working: &mut Value,
        options: &ValidateOptions,
        errors: &mut ValidationErrors,
        flow: &mut RunFlow,
    ) {
        let mut value = initial;
        let mut transformed = false;
        let mut skip_validations = flow.skip_validations;

        {
            let root: &Value = &*working;
            let ctx = RuleContext {
                path: error_path,
                root,
                context: &options.context,
                config: &self.config,
            };

            for rule in rules {
                if skip_validations && !rule.is_transform() {
                    continue;
                }

                let kind = ValueKind::of(value.as_ref());
                if !rule.kinds().is_empty() && !rule.kinds().contains(&kind) {
                    continue; // vacuously satisfied
                }

                let outcome = run_checked(rule.as_ref(), value.as_ref(), &ctx);
                match outcome {
                    RuleOutcome::Pass | RuleOutcome::Recursive => {}
                    RuleOutcome::Nullable => {
                        if matches!(value, Some(Value::Null)) {
                            skip_validations = true;
                        }
                    }
                    RuleOutcome::Transform(new_value) => {
                        value = Some(new_value);
                        transformed = true;
                    }
                    RuleOutcome::SkipFurther => {
                        skip_validations = true;
                    }
                    RuleOutcome::SkipAll => {
                        skip_validations = true;
                        flow.skip_validations = true;
                    }
                    RuleOutcome::Fail(violation) => {
                        errors.add(resolve_error(
                            error_path,
                            &violation,
                            value.as_ref(),
                            rule.as_ref(),
                            options,
                        ));
                        if options.abort_early {
                            flow.halt = true;
                            return;
                        }
                        if options.abort_early_on_each_field {
                            break;
                        }
                    }
                }
            }
        }

        if transformed {
            if let Some(new_value) = value {
                path::write_at(working, write_segments, new_value);
                flow.any_transform = true;
            }
        }
    }
}

/// Run a rule checker, converting a panicking checker into a failure for
/// that rule alone; a user-supplied condition must never abort the run.
fn run_checked(rule: &dyn Rule, value: Option<&Value>, ctx: &RuleContext<'_>) -> RuleOutcome {
    match catch_unwind(AssertUnwindSafe(|| rule.check(value, ctx))) {
        Ok(outcome) => outcome,
        Err(_) => RuleOutcome::Fail(Violation::new(
            "checker_panic",
            format!("{} checker panicked while validating {}", rule.code(), ctx.path),
        )),
    }
}

/// Apply the caller's message overrides, in precedence order: message
/// factory, then translation hook, then the rule's own message.
fn resolve_error(
    path: &str,
    violation: &Violation,
    value: Option<&Value>,
    rule: &dyn Rule,
    options: &ValidateOptions,
) -> ValidationError {
    let message = if let Some(factory) = &options.message_factory {
        factory(&MessageContext {
            path,
            code: &violation.code,
            default_message: &violation.message,
            value,
            params: rule.parameters(),
        })
    } else if let Some(translate) = &options.translate {
        translate(&violation.code, rule.parameters().as_ref())
    } else {
        violation.message.clone()
    };
    ValidationError::with_code(path, message, violation.code.clone())
}
