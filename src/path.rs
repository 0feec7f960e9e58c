//! Dot/wildcard path resolution with process-wide accessor caches
//!
//! Paths are interned: the same path string always resolves to the same
//! frozen segment sequence and the same accessor/setter closures, so a
//! compiled validator never recomputes them across repeated runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

/// Segment that marks "iterate the array here"
pub const WILDCARD: &str = "*";

/// Frozen, interned sequence of path segments
pub type PathSegments = Arc<[String]>;

/// Cached read accessor: maps a root value to the value at a path.
/// `None` is the "missing" sentinel; accessors never panic.
pub type Accessor = Arc<dyn for<'a> Fn(&'a Value) -> Option<&'a Value> + Send + Sync>;

/// Cached write accessor: writes a value at a path, creating intermediate
/// containers as needed.
pub type Setter = Arc<dyn Fn(&mut Value, Value) + Send + Sync>;

/// Cached wildcard-aware accessor producing a [`Resolved`] tree.
pub type NestedAccessor = Arc<dyn Fn(&Value) -> Resolved + Send + Sync>;

/// Result of resolving a path that may cross wildcard segments.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// An intermediate container was absent or of the wrong shape
    Missing,
    /// A plain value at the full path
    Value(Value),
    /// The path crossed a wildcard; one entry per array element
    Elements(ElementSet),
}

/// Per-element value bundle produced when a path crosses a wildcard.
///
/// `values` preserves the original array order and length; holes and failed
/// inner resolutions become [`Resolved::Missing`]. Nested wildcards recurse,
/// so a value may itself be an [`ElementSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSet {
    /// Path of the array that was iterated (as declared, wildcards kept)
    pub array_path: String,
    /// Extracted value per element, in array order
    pub values: Vec<Resolved>,
}

impl Resolved {
    /// Whether this resolution reached a plain value
    pub fn is_value(&self) -> bool {
        matches!(self, Resolved::Value(_))
    }

    /// Whether this resolution hit a missing container
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }
}

static SEGMENTS: Lazy<RwLock<HashMap<String, PathSegments>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));
static ACCESSORS: Lazy<RwLock<HashMap<String, Accessor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));
static SETTERS: Lazy<RwLock<HashMap<String, Setter>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));
static NESTED: Lazy<RwLock<HashMap<String, NestedAccessor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Return the interned segment sequence for a path.
///
/// Calling twice with the same path returns the same `Arc` (pointer-equal).
/// The empty path yields an empty sequence.
pub fn segments(path: &str) -> PathSegments {
    if let Some(cached) = SEGMENTS.read().unwrap_or_else(PoisonError::into_inner).get(path) {
        return cached.clone();
    }
    let built: PathSegments = if path.is_empty() {
        Arc::from(Vec::new().into_boxed_slice())
    } else {
        Arc::from(
            path.split('.')
                .map(str::to_string)
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        )
    };
    SEGMENTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_string())
        .or_insert(built)
        .clone()
}

/// Return the cached read accessor for a path.
pub fn accessor(path: &str) -> Accessor {
    if let Some(cached) = ACCESSORS.read().unwrap_or_else(PoisonError::into_inner).get(path) {
        return cached.clone();
    }
    let built = build_accessor(segments(path));
    ACCESSORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_string())
        .or_insert(built)
        .clone()
}

/// Return the cached write accessor for a path.
pub fn setter(path: &str) -> Setter {
    if let Some(cached) = SETTERS.read().unwrap_or_else(PoisonError::into_inner).get(path) {
        return cached.clone();
    }
    let segs = segments(path);
    let built: Setter = Arc::new(move |root, value| write_path(root, &segs, value));
    SETTERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_string())
        .or_insert(built)
        .clone()
}

/// Return the cached wildcard-aware accessor for a path.
///
/// For a path with no wildcard this behaves like [`accessor`], producing a
/// cloned [`Resolved::Value`] or [`Resolved::Missing`].
pub fn nested_accessor(path: &str) -> NestedAccessor {
    if let Some(cached) = NESTED.read().unwrap_or_else(PoisonError::into_inner).get(path) {
        return cached.clone();
    }
    let segs = segments(path);
    let built: NestedAccessor = Arc::new(move |root| resolve_nested(root, &segs, &[]));
    NESTED
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(path.to_string())
        .or_insert(built)
        .clone()
}

/// Clear every path cache. Rebuild is idempotent; intended for tests that
/// check cache behavior without cross-test leakage.
pub fn reset_caches() {
    SEGMENTS.write().unwrap_or_else(PoisonError::into_inner).clear();
    ACCESSORS.write().unwrap_or_else(PoisonError::into_inner).clear();
    SETTERS.write().unwrap_or_else(PoisonError::into_inner).clear();
    NESTED.write().unwrap_or_else(PoisonError::into_inner).clear();
}

/// Single resolution step. Objects resolve by key, arrays by numeric index,
/// everything else is missing. The engine's batched traversal walks group
/// prefixes through this same step so the two resolution paths cannot drift.
pub(crate) fn step<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

// Depth-specialized closures for the common shallow paths; 6+ segments fall
// back to a loop. Behaviorally all depths are equivalent.
fn build_accessor(segs: PathSegments) -> Accessor {
    match segs.len() {
        0 => Arc::new(|root| Some(root)),
        1 => {
            let k0 = segs[0].clone();
            Arc::new(move |root| step(root, &k0))
        }
        2 => {
            let (k0, k1) = (segs[0].clone(), segs[1].clone());
            Arc::new(move |root| step(step(root, &k0)?, &k1))
        }
        3 => {
            let (k0, k1, k2) = (segs[0].clone(), segs[1].clone(), segs[2].clone());
            Arc::new(move |root| step(step(step(root, &k0)?, &k1)?, &k2))
        }
        4 => {
            let (k0, k1, k2, k3) = (
                segs[0].clone(),
                segs[1].clone(),
                segs[2].clone(),
                segs[3].clone(),
            );
            Arc::new(move |root| step(step(step(step(root, &k0)?, &k1)?, &k2)?, &k3))
        }
        5 => {
            let (k0, k1, k2, k3, k4) = (
                segs[0].clone(),
                segs[1].clone(),
                segs[2].clone(),
                segs[3].clone(),
                segs[4].clone(),
            );
            Arc::new(move |root| step(step(step(step(step(root, &k0)?, &k1)?, &k2)?, &k3)?, &k4))
        }
        _ => Arc::new(move |root| {
            let mut current = root;
            for seg in segs.iter() {
                current = step(current, seg)?;
            }
            Some(current)
        }),
    }
}

/// Write a value at a concrete (wildcard-free) segment sequence without
/// going through the setter cache. Used for per-element write-backs where
/// caching one closure per array index would be wasteful.
pub(crate) fn write_at(root: &mut Value, segs: &[String], value: Value) {
    write_path(root, segs, value)
}

fn write_path(root: &mut Value, segs: &[String], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        *root = value;
        return;
    };

    if rest.is_empty() {
        match root {
            Value::Object(map) => {
                map.insert(head.clone(), value);
            }
            Value::Array(items) => {
                if let Ok(index) = head.parse::<usize>() {
                    if index >= items.len() {
                        items.resize(index + 1, Value::Null);
                    }
                    items[index] = value;
                }
            }
            other => {
                let mut map = serde_json::Map::new();
                map.insert(head.clone(), value);
                *other = Value::Object(map);
            }
        }
        return;
    }

    // Intermediate step: descend, creating a container when absent. The
    // created container is an array when the next segment is numeric.
    let next_is_index = rest[0].parse::<usize>().is_ok();
    let placeholder = || {
        if next_is_index {
            Value::Array(Vec::new())
        } else {
            Value::Object(serde_json::Map::new())
        }
    };

    match root {
        Value::Object(map) => {
            let entry = map.entry(head.clone()).or_insert_with(placeholder);
            if !entry.is_object() && !entry.is_array() {
                *entry = placeholder();
            }
            write_path(entry, rest, value);
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                if index >= items.len() {
                    items.resize(index + 1, Value::Null);
                }
                if !items[index].is_object() && !items[index].is_array() {
                    items[index] = placeholder();
                }
                write_path(&mut items[index], rest, value);
            }
        }
        other => {
            *other = Value::Object(serde_json::Map::new());
            write_path(other, segs, value);
        }
    }
}

fn resolve_nested(value: &Value, segs: &[String], consumed: &[String]) -> Resolved {
    let Some((head, rest)) = segs.split_first() else {
        return Resolved::Value(value.clone());
    };

    if head == WILDCARD {
        let Value::Array(items) = value else {
            return Resolved::Missing;
        };
        return Resolved::Elements(ElementSet {
            array_path: consumed.join("."),
            values: items
                .iter()
                .map(|element| {
                    let mut inner = consumed.to_vec();
                    inner.push(WILDCARD.to_string());
                    resolve_nested(element, rest, &inner)
                })
                .collect(),
        });
    }

    match step(value, head) {
        Some(next) => {
            let mut inner = consumed.to_vec();
            inner.push(head.clone());
            resolve_nested(next, rest, &inner)
        }
        None => Resolved::Missing,
    }
}
