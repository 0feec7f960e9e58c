//! JSON Schema keyword evaluation
//!
//! One function, [`check_value`], walks a value against a schema node and
//! reports the first failing keyword. Schema nodes are either booleans
//! (`true` accepts everything, `false` rejects everything) or keyword
//! objects. `$ref` resolves against the root schema through a depth
//! guard instead of unbounded recursion.

use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::formats::FormatRegistry;

/// Hard cap on `$ref` resolution depth; a reference chain longer than
/// this fails with keyword `$ref`.
pub const MAX_SCHEMA_DEPTH: usize = 64;

/// The first failing keyword and a human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// The keyword that failed, e.g. `minimum` or `required`
    pub keyword: String,
    /// What the value should have satisfied
    pub detail: String,
}

impl SchemaViolation {
    pub fn new(keyword: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.keyword, self.detail)
    }
}

/// Shared state for one evaluation: the root schema (for `$ref`) and the
/// format registry.
pub(crate) struct EvalContext<'a> {
    pub root: &'a Value,
    pub formats: &'a FormatRegistry,
}

/// Structural equality with cross-representation numeric equality
/// (`1` equals `1.0`). Integer representations compare exactly; the f64
/// fallback only applies across representations, so distinct integers
/// above 2^53 never collapse.
pub(crate) fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_eq(x, y)))
        }
        _ => a == b,
    }
}

fn type_matches(name: &str, value: &Value) -> bool {
    match name {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => matches!(value, Value::Number(n) if n.as_f64().is_some_and(f64::is_finite)),
        "integer" => {
            matches!(value, Value::Number(n) if n.as_f64().is_some_and(|x| x.is_finite() && x.fract() == 0.0))
        }
        _ => false,
    }
}

fn resolve_ref<'a>(pointer: &str, root: &'a Value) -> Option<&'a Value> {
    if pointer == "#" {
        return Some(root);
    }
    let rest = pointer.strip_prefix("#/")?;
    let mut node = root;
    for raw in rest.split('/') {
        let key = raw.replace("~1", "/").replace("~0", "~");
        node = match node {
            Value::Object(map) => map.get(&key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Walk `value` against `schema`, returning the first failing keyword.
pub(crate) fn check_value(
    value: &Value,
    schema: &Value,
    ctx: &EvalContext<'_>,
    depth: usize,
) -> Result<(), SchemaViolation> {
    let map = match schema {
        Value::Bool(true) => return Ok(()),
        Value::Bool(false) => {
            return Err(SchemaViolation::new("schema", "value is never valid"));
        }
        Value::Object(map) => map,
        _ => {
            return Err(SchemaViolation::new(
                "schema",
                "schema must be an object or a boolean",
            ));
        }
    };

    if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
        if depth >= MAX_SCHEMA_DEPTH {
            return Err(SchemaViolation::new(
                "$ref",
                format!("resolution exceeded {MAX_SCHEMA_DEPTH} levels"),
            ));
        }
        let Some(target) = resolve_ref(reference, ctx.root) else {
            return Err(SchemaViolation::new(
                "$ref",
                format!("unresolved reference {reference:?}"),
            ));
        };
        check_value(value, target, ctx, depth + 1)?;
    }

    check_type(value, map)?;
    check_const_enum(value, map)?;
    check_string(value, map, ctx)?;
    check_number(value, map)?;
    check_array(value, map, ctx, depth)?;
    check_object(value, map, ctx, depth)?;
    check_composition(value, map, ctx, depth)?;
    Ok(())
}

fn check_type(value: &Value, map: &serde_json::Map<String, Value>) -> Result<(), SchemaViolation> {
    let Some(declared) = map.get("type") else {
        return Ok(());
    };
    let matched = match declared {
        Value::String(name) => type_matches(name, value),
        Value::Array(names) => names
            .iter()
            .filter_map(Value::as_str)
            .any(|name| type_matches(name, value)),
        _ => true,
    };
    if matched {
        Ok(())
    } else {
        Err(SchemaViolation::new(
            "type",
            format!("value does not match type {declared}"),
        ))
    }
}

fn check_const_enum(
    value: &Value,
    map: &serde_json::Map<String, Value>,
) -> Result<(), SchemaViolation> {
    if let Some(expected) = map.get("const") {
        if !deep_eq(value, expected) {
            return Err(SchemaViolation::new("const", format!("must equal {expected}")));
        }
    }
    if let Some(Value::Array(choices)) = map.get("enum") {
        if !choices.iter().any(|choice| deep_eq(value, choice)) {
            return Err(SchemaViolation::new("enum", "must be one of the listed values"));
        }
    }
    Ok(())
}

fn check_string(
    value: &Value,
    map: &serde_json::Map<String, Value>,
    ctx: &EvalContext<'_>,
) -> Result<(), SchemaViolation> {
    let Value::String(text) = value else {
        return Ok(());
    };
    let length = text.chars().count() as u64;

    if let Some(min) = map.get("minLength").and_then(Value::as_u64) {
        if length < min {
            return Err(SchemaViolation::new(
                "minLength",
                format!("must be at least {min} characters"),
            ));
        }
    }
    if let Some(max) = map.get("maxLength").and_then(Value::as_u64) {
        if length > max {
            return Err(SchemaViolation::new(
                "maxLength",
                format!("must be at most {max} characters"),
            ));
        }
    }
    if let Some(pattern) = map.get("pattern").and_then(Value::as_str) {
        // Search semantics: a match anywhere in the string suffices.
        match Regex::new(pattern) {
            Ok(regex) => {
                if !regex.is_match(text) {
                    return Err(SchemaViolation::new(
                        "pattern",
                        format!("must match pattern {pattern:?}"),
                    ));
                }
            }
            Err(err) => {
                return Err(SchemaViolation::new(
                    "pattern",
                    format!("invalid pattern {pattern:?}: {err}"),
                ));
            }
        }
    }
    if let Some(format) = map.get("format").and_then(Value::as_str) {
        if !ctx.formats.check(format, text) {
            return Err(SchemaViolation::new(
                "format",
                format!("must be a valid {format}"),
            ));
        }
    }
    Ok(())
}

fn check_number(value: &Value, map: &serde_json::Map<String, Value>) -> Result<(), SchemaViolation> {
    let Value::Number(number) = value else {
        return Ok(());
    };
    let Some(num) = number.as_f64() else {
        return Ok(());
    };

    if let Some(min) = map.get("minimum").and_then(Value::as_f64) {
        // Draft-04 boolean form turns `minimum` into an exclusive bound.
        let exclusive = matches!(map.get("exclusiveMinimum"), Some(Value::Bool(true)));
        if exclusive {
            if num <= min {
                return Err(SchemaViolation::new(
                    "exclusiveMinimum",
                    format!("must be greater than {min}"),
                ));
            }
        } else if num < min {
            return Err(SchemaViolation::new("minimum", format!("must be at least {min}")));
        }
    }
    if let Some(Value::Number(bound)) = map.get("exclusiveMinimum") {
        if let Some(min) = bound.as_f64() {
            if num <= min {
                return Err(SchemaViolation::new(
                    "exclusiveMinimum",
                    format!("must be greater than {min}"),
                ));
            }
        }
    }
    if let Some(max) = map.get("maximum").and_then(Value::as_f64) {
        let exclusive = matches!(map.get("exclusiveMaximum"), Some(Value::Bool(true)));
        if exclusive {
            if num >= max {
                return Err(SchemaViolation::new(
                    "exclusiveMaximum",
                    format!("must be less than {max}"),
                ));
            }
        } else if num > max {
            return Err(SchemaViolation::new("maximum", format!("must be at most {max}")));
        }
    }
    if let Some(Value::Number(bound)) = map.get("exclusiveMaximum") {
        if let Some(max) = bound.as_f64() {
            if num >= max {
                return Err(SchemaViolation::new(
                    "exclusiveMaximum",
                    format!("must be less than {max}"),
                ));
            }
        }
    }
    if let Some(factor) = map.get("multipleOf").and_then(Value::as_f64) {
        if factor <= 0.0 || !factor.is_finite() {
            return Err(SchemaViolation::new(
                "multipleOf",
                "factor must be a positive number",
            ));
        }
        // Tolerance-bounded modulo to absorb floating-point error.
        let ratio = num / factor;
        if (ratio - ratio.round()).abs() > 1e-8 {
            return Err(SchemaViolation::new(
                "multipleOf",
                format!("must be a multiple of {factor}"),
            ));
        }
    }
    Ok(())
}

fn check_array(
    value: &Value,
    map: &serde_json::Map<String, Value>,
    ctx: &EvalContext<'_>,
    depth: usize,
) -> Result<(), SchemaViolation> {
    let Value::Array(items) = value else {
        return Ok(());
    };

    if let Some(min) = map.get("minItems").and_then(Value::as_u64) {
        if (items.len() as u64) < min {
            return Err(SchemaViolation::new(
                "minItems",
                format!("must have at least {min} items"),
            ));
        }
    }
    if let Some(max) = map.get("maxItems").and_then(Value::as_u64) {
        if (items.len() as u64) > max {
            return Err(SchemaViolation::new(
                "maxItems",
                format!("must have at most {max} items"),
            ));
        }
    }
    if matches!(map.get("uniqueItems"), Some(Value::Bool(true))) {
        for (i, a) in items.iter().enumerate() {
            if items[..i].iter().any(|b| deep_eq(a, b)) {
                return Err(SchemaViolation::new(
                    "uniqueItems",
                    format!("duplicate item at index {i}"),
                ));
            }
        }
    }
    match map.get("items") {
        Some(Value::Array(tuple)) => {
            for (item, subschema) in items.iter().zip(tuple) {
                check_value(item, subschema, ctx, depth)?;
            }
            if items.len() > tuple.len() {
                match map.get("additionalItems") {
                    Some(Value::Bool(false)) => {
                        return Err(SchemaViolation::new(
                            "additionalItems",
                            format!("must have at most {} items", tuple.len()),
                        ));
                    }
                    Some(subschema) if !matches!(subschema, Value::Bool(true)) => {
                        for item in &items[tuple.len()..] {
                            check_value(item, subschema, ctx, depth)?;
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(subschema) => {
            for item in items {
                check_value(item, subschema, ctx, depth)?;
            }
        }
        None => {}
    }
    if let Some(subschema) = map.get("contains") {
        if !items
            .iter()
            .any(|item| check_value(item, subschema, ctx, depth).is_ok())
        {
            return Err(SchemaViolation::new(
                "contains",
                "no item matches the contained schema",
            ));
        }
    }
    Ok(())
}

fn check_object(
    value: &Value,
    map: &serde_json::Map<String, Value>,
    ctx: &EvalContext<'_>,
    depth: usize,
) -> Result<(), SchemaViolation> {
    let Value::Object(object) = value else {
        return Ok(());
    };

    if let Some(min) = map.get("minProperties").and_then(Value::as_u64) {
        if (object.len() as u64) < min {
            return Err(SchemaViolation::new(
                "minProperties",
                format!("must have at least {min} properties"),
            ));
        }
    }
    if let Some(max) = map.get("maxProperties").and_then(Value::as_u64) {
        if (object.len() as u64) > max {
            return Err(SchemaViolation::new(
                "maxProperties",
                format!("must have at most {max} properties"),
            ));
        }
    }
    if let Some(Value::Array(required)) = map.get("required") {
        for key in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(key) {
                return Err(SchemaViolation::new(
                    "required",
                    format!("missing property {key:?}"),
                ));
            }
        }
    }

    let properties = match map.get("properties") {
        Some(Value::Object(props)) => Some(props),
        _ => None,
    };
    if let Some(props) = properties {
        for (key, subschema) in props {
            if let Some(property) = object.get(key) {
                check_value(property, subschema, ctx, depth)?;
            }
        }
    }

    let mut pattern_props = Vec::new();
    if let Some(Value::Object(patterns)) = map.get("patternProperties") {
        for (pattern, subschema) in patterns {
            match Regex::new(pattern) {
                Ok(regex) => pattern_props.push((regex, subschema)),
                Err(err) => {
                    return Err(SchemaViolation::new(
                        "patternProperties",
                        format!("invalid pattern {pattern:?}: {err}"),
                    ));
                }
            }
        }
        for (key, property) in object {
            for (regex, subschema) in &pattern_props {
                if regex.is_match(key) {
                    check_value(property, subschema, ctx, depth)?;
                }
            }
        }
    }

    if let Some(additional) = map.get("additionalProperties") {
        for (key, property) in object {
            let covered = properties.is_some_and(|props| props.contains_key(key))
                || pattern_props.iter().any(|(regex, _)| regex.is_match(key));
            if covered {
                continue;
            }
            match additional {
                Value::Bool(false) => {
                    return Err(SchemaViolation::new(
                        "additionalProperties",
                        format!("unexpected property {key:?}"),
                    ));
                }
                Value::Bool(true) => {}
                subschema => check_value(property, subschema, ctx, depth)?,
            }
        }
    }

    if let Some(subschema) = map.get("propertyNames") {
        for key in object.keys() {
            let name = Value::String(key.clone());
            if check_value(&name, subschema, ctx, depth).is_err() {
                return Err(SchemaViolation::new(
                    "propertyNames",
                    format!("property name {key:?} is not allowed"),
                ));
            }
        }
    }
    Ok(())
}

fn check_composition(
    value: &Value,
    map: &serde_json::Map<String, Value>,
    ctx: &EvalContext<'_>,
    depth: usize,
) -> Result<(), SchemaViolation> {
    if let Some(Value::Array(members)) = map.get("allOf") {
        for member in members {
            check_value(value, member, ctx, depth)?;
        }
    }
    if let Some(Value::Array(members)) = map.get("anyOf") {
        if !members
            .iter()
            .any(|member| check_value(value, member, ctx, depth).is_ok())
        {
            return Err(SchemaViolation::new("anyOf", "no alternative matched"));
        }
    }
    if let Some(Value::Array(members)) = map.get("oneOf") {
        let matched = members
            .iter()
            .filter(|member| check_value(value, member, ctx, depth).is_ok())
            .count();
        if matched != 1 {
            return Err(SchemaViolation::new(
                "oneOf",
                format!("{matched} alternatives matched, expected exactly one"),
            ));
        }
    }
    if let Some(subschema) = map.get("not") {
        if check_value(value, subschema, ctx, depth).is_ok() {
            return Err(SchemaViolation::new("not", "must not match the schema"));
        }
    }
    if let Some(condition) = map.get("if") {
        let branch = if check_value(value, condition, ctx, depth).is_ok() {
            map.get("then")
        } else {
            map.get("else")
        };
        if let Some(branch) = branch {
            check_value(value, branch, ctx, depth)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(value: &Value, schema: &Value) -> Result<(), SchemaViolation> {
        let formats = FormatRegistry::with_defaults();
        let ctx = EvalContext {
            root: schema,
            formats: &formats,
        };
        check_value(value, schema, &ctx, 0)
    }

    fn keyword_of(value: &Value, schema: &Value) -> String {
        check(value, schema).expect_err("expected a violation").keyword
    }

    #[test]
    fn test_boolean_schemas() {
        assert!(check(&json!(42), &json!(true)).is_ok());
        assert!(check(&json!(null), &json!(true)).is_ok());
        assert!(check(&json!(42), &json!(false)).is_err());
        assert!(check(&json!({}), &json!(false)).is_err());
    }

    #[test]
    fn test_type_names() {
        assert!(check(&json!("x"), &json!({"type": "string"})).is_ok());
        assert_eq!(keyword_of(&json!(1), &json!({"type": "string"})), "type");
        assert!(check(&json!(null), &json!({"type": ["string", "null"]})).is_ok());
        assert!(check(&json!(3), &json!({"type": "integer"})).is_ok());
        assert!(check(&json!(3.0), &json!({"type": "integer"})).is_ok());
        assert_eq!(keyword_of(&json!(3.5), &json!({"type": "integer"})), "type");
    }

    #[test]
    fn test_const_and_enum_numeric_equality() {
        assert!(check(&json!(1), &json!({"const": 1.0})).is_ok());
        assert!(check(&json!(1.0), &json!({"enum": [1, 2]})).is_ok());
        assert_eq!(keyword_of(&json!(3), &json!({"enum": [1, 2]})), "enum");
        assert_eq!(keyword_of(&json!("b"), &json!({"const": "a"})), "const");
    }

    #[test]
    fn test_const_and_unique_items_keep_large_integers_distinct() {
        // 2^53 and 2^53 + 1 share an f64 representation.
        let big = 9007199254740992u64;
        assert!(check(&json!(big), &json!({"const": big})).is_ok());
        assert_eq!(keyword_of(&json!(big + 1), &json!({"const": big})), "const");
        assert_eq!(keyword_of(&json!(big), &json!({"enum": [big + 1]})), "enum");
        assert!(check(&json!([big, big + 1]), &json!({"uniqueItems": true})).is_ok());
        assert_eq!(
            keyword_of(&json!([big, big]), &json!({"uniqueItems": true})),
            "uniqueItems"
        );
        // The cross-representation rule still holds for small values.
        assert!(check(&json!(2), &json!({"const": 2.0})).is_ok());
    }

    #[test]
    fn test_string_keywords() {
        let schema = json!({"minLength": 2, "maxLength": 4});
        assert!(check(&json!("abc"), &schema).is_ok());
        assert_eq!(keyword_of(&json!("a"), &schema), "minLength");
        assert_eq!(keyword_of(&json!("abcde"), &schema), "maxLength");
        // Code points, not bytes.
        assert!(check(&json!("héllø"), &json!({"maxLength": 5})).is_ok());
    }

    #[test]
    fn test_pattern_is_search_not_full_match() {
        let schema = json!({"pattern": "\\d{3}"});
        assert!(check(&json!("order-123"), &schema).is_ok());
        assert_eq!(keyword_of(&json!("order-12"), &schema), "pattern");
    }

    #[test]
    fn test_invalid_pattern_fails_that_keyword() {
        assert_eq!(keyword_of(&json!("x"), &json!({"pattern": "[broken"})), "pattern");
        assert_eq!(
            keyword_of(
                &json!({"k": 1}),
                &json!({"patternProperties": {"[broken": true}})
            ),
            "patternProperties"
        );
    }

    #[test]
    fn test_format() {
        assert!(check(&json!("a@b.io"), &json!({"format": "email"})).is_ok());
        assert_eq!(keyword_of(&json!("nope"), &json!({"format": "email"})), "format");
        // Unknown format names are always valid.
        assert!(check(&json!("whatever"), &json!({"format": "no-such"})).is_ok());
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(check(&json!(5), &json!({"minimum": 0, "maximum": 10})).is_ok());
        assert_eq!(keyword_of(&json!(-1), &json!({"minimum": 0})), "minimum");
        assert_eq!(keyword_of(&json!(11), &json!({"maximum": 10})), "maximum");
    }

    #[test]
    fn test_exclusive_bounds_both_drafts() {
        // Numeric form.
        assert_eq!(keyword_of(&json!(0), &json!({"exclusiveMinimum": 0})), "exclusiveMinimum");
        assert!(check(&json!(1), &json!({"exclusiveMinimum": 0})).is_ok());
        assert_eq!(keyword_of(&json!(10), &json!({"exclusiveMaximum": 10})), "exclusiveMaximum");
        // Draft-04 boolean form.
        let schema = json!({"minimum": 0, "exclusiveMinimum": true});
        assert_eq!(keyword_of(&json!(0), &schema), "exclusiveMinimum");
        assert!(check(&json!(1), &schema).is_ok());
    }

    #[test]
    fn test_multiple_of_tolerance() {
        assert!(check(&json!(0.3), &json!({"multipleOf": 0.1})).is_ok());
        assert!(check(&json!(9), &json!({"multipleOf": 3})).is_ok());
        assert_eq!(keyword_of(&json!(10), &json!({"multipleOf": 3})), "multipleOf");
        // A non-positive factor can never be satisfied.
        assert_eq!(keyword_of(&json!(10), &json!({"multipleOf": 0})), "multipleOf");
    }

    #[test]
    fn test_array_keywords() {
        assert_eq!(keyword_of(&json!([1]), &json!({"minItems": 2})), "minItems");
        assert_eq!(keyword_of(&json!([1, 2, 3]), &json!({"maxItems": 2})), "maxItems");
        assert_eq!(
            keyword_of(&json!([1, 2, 1.0]), &json!({"uniqueItems": true})),
            "uniqueItems"
        );
        assert!(check(&json!([1, 2, 3]), &json!({"uniqueItems": true})).is_ok());
    }

    #[test]
    fn test_items_single_and_tuple() {
        let single = json!({"items": {"type": "number"}});
        assert!(check(&json!([1, 2.5]), &single).is_ok());
        assert_eq!(keyword_of(&json!([1, "x"]), &single), "type");

        let tuple = json!({
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": false
        });
        assert!(check(&json!(["a", 1]), &tuple).is_ok());
        assert_eq!(keyword_of(&json!(["a", 1, 2]), &tuple), "additionalItems");

        let tuple_schema_extra = json!({
            "items": [{"type": "string"}],
            "additionalItems": {"type": "number"}
        });
        assert!(check(&json!(["a", 1, 2]), &tuple_schema_extra).is_ok());
        assert_eq!(keyword_of(&json!(["a", "b"]), &tuple_schema_extra), "type");
    }

    #[test]
    fn test_contains_with_boolean_schemas() {
        assert!(check(&json!([1, "x"]), &json!({"contains": {"type": "string"}})).is_ok());
        assert_eq!(
            keyword_of(&json!([1, 2]), &json!({"contains": {"type": "string"}})),
            "contains"
        );
        assert!(check(&json!([1]), &json!({"contains": true})).is_ok());
        assert_eq!(keyword_of(&json!([1]), &json!({"contains": false})), "contains");
    }

    #[test]
    fn test_object_keywords() {
        assert_eq!(
            keyword_of(&json!({}), &json!({"required": ["name"]})),
            "required"
        );
        assert_eq!(
            keyword_of(&json!({"a": 1}), &json!({"minProperties": 2})),
            "minProperties"
        );
        let schema = json!({"properties": {"age": {"type": "integer"}}});
        assert!(check(&json!({"age": 3}), &schema).is_ok());
        assert_eq!(keyword_of(&json!({"age": "x"}), &schema), "type");
        // Absent properties are fine without required.
        assert!(check(&json!({}), &schema).is_ok());
    }

    #[test]
    fn test_additional_and_pattern_properties() {
        let schema = json!({
            "properties": {"name": true},
            "patternProperties": {"^x_": {"type": "number"}},
            "additionalProperties": false
        });
        assert!(check(&json!({"name": "a", "x_count": 1}), &schema).is_ok());
        assert_eq!(keyword_of(&json!({"x_count": "s"}), &schema), "type");
        assert_eq!(keyword_of(&json!({"other": 1}), &schema), "additionalProperties");
    }

    #[test]
    fn test_property_names() {
        let schema = json!({"propertyNames": {"pattern": "^[a-z]+$"}});
        assert!(check(&json!({"abc": 1}), &schema).is_ok());
        assert_eq!(keyword_of(&json!({"Bad": 1}), &schema), "propertyNames");
        // Boolean schema as the name schema.
        assert_eq!(keyword_of(&json!({"k": 1}), &json!({"propertyNames": false})), "propertyNames");
    }

    #[test]
    fn test_composition() {
        let all = json!({"allOf": [{"type": "number"}, {"minimum": 0}]});
        assert!(check(&json!(1), &all).is_ok());
        assert_eq!(keyword_of(&json!(-1), &all), "minimum");

        let any = json!({"anyOf": [{"type": "string"}, {"type": "number"}]});
        assert!(check(&json!(1), &any).is_ok());
        assert_eq!(keyword_of(&json!(true), &any), "anyOf");

        let one = json!({"oneOf": [{"minimum": 0}, {"maximum": 10}]});
        assert!(check(&json!(-5), &one).is_ok()); // only maximum matches
        assert_eq!(keyword_of(&json!(5), &one), "oneOf"); // both match

        assert_eq!(keyword_of(&json!(1), &json!({"not": {"type": "number"}})), "not");
        assert!(check(&json!(1), &json!({"allOf": [true, true]})).is_ok());
        assert_eq!(keyword_of(&json!(1), &json!({"allOf": [true, false]})), "schema");
    }

    #[test]
    fn test_if_then_else() {
        let schema = json!({
            "if": {"type": "string"},
            "then": {"minLength": 2},
            "else": {"minimum": 0}
        });
        assert!(check(&json!("ab"), &schema).is_ok());
        assert_eq!(keyword_of(&json!("a"), &schema), "minLength");
        assert!(check(&json!(1), &schema).is_ok());
        assert_eq!(keyword_of(&json!(-1), &schema), "minimum");
        // `if` alone is always valid.
        assert!(check(&json!("a"), &json!({"if": {"minLength": 2}})).is_ok());
    }

    #[test]
    fn test_ref_to_defs() {
        let schema = json!({
            "$defs": {"positive": {"type": "number", "minimum": 0}},
            "properties": {"count": {"$ref": "#/$defs/positive"}}
        });
        assert!(check(&json!({"count": 3}), &schema).is_ok());
        assert_eq!(keyword_of(&json!({"count": -1}), &schema), "minimum");

        let legacy = json!({
            "definitions": {"name": {"type": "string"}},
            "properties": {"n": {"$ref": "#/definitions/name"}}
        });
        assert!(check(&json!({"n": "x"}), &legacy).is_ok());
    }

    #[test]
    fn test_unresolved_ref() {
        assert_eq!(keyword_of(&json!(1), &json!({"$ref": "#/$defs/missing"})), "$ref");
    }

    #[test]
    fn test_ref_cycle_hits_depth_cap() {
        // `#` refers to the whole schema, which is itself a reference.
        let schema = json!({"$ref": "#"});
        assert_eq!(keyword_of(&json!(1), &schema), "$ref");
    }

    #[test]
    fn test_recursive_ref_with_terminating_data() {
        let schema = json!({
            "$defs": {
                "node": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "number"},
                        "next": {"anyOf": [{"type": "null"}, {"$ref": "#/$defs/node"}]}
                    }
                }
            },
            "$ref": "#/$defs/node"
        });
        let data = json!({"value": 1, "next": {"value": 2, "next": null}});
        assert!(check(&data, &schema).is_ok());
        let bad = json!({"value": 1, "next": {"value": "x", "next": null}});
        assert_eq!(keyword_of(&bad, &schema), "anyOf");
    }
}
