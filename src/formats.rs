//! Named format checkers for string values
//!
//! The registry backs the JSON Schema `format` keyword and is caller
//! extensible: overrides replace defaults by name, and an unrecognized
//! format name is always valid.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// A named format checker
pub type FormatCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Basic email shape: ASCII local part and domain with a TLD, no leading,
/// trailing, or consecutive dots. Shared with the email rule.
pub(crate) static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9_%+-]+(?:\.[a-zA-Z0-9_%+-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$",
    )
    .unwrap()
});

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:[\x21-\x7e]*$").unwrap());
static IRI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:\S*$").unwrap());
static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s\\]*$").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d:([0-5]\d|60)(\.\d+)?([Zz]|[+-]([01]\d|2[0-3]):[0-5]\d)$")
        .unwrap()
});
static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .unwrap()
});
static JSON_POINTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(/([^/~]|~[01])*)*$").unwrap());
static RELATIVE_JSON_POINTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0|[1-9][0-9]*)(#|(/([^/~]|~[01])*)*)$").unwrap());

/// Mapping from format name to checker function.
#[derive(Clone)]
pub struct FormatRegistry {
    checks: HashMap<String, FormatCheck>,
}

impl FormatRegistry {
    /// An empty registry; every format name is valid until registered
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Registry preloaded with the standard JSON Schema format checkers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("email", |s| EMAIL_PATTERN.is_match(s));
        registry.register("uri", |s| URI.is_match(s));
        registry.register("uri-reference", |s| REFERENCE.is_match(s));
        registry.register("iri", |s| IRI.is_match(s));
        registry.register("iri-reference", |s| REFERENCE.is_match(s));
        registry.register("uri-template", is_uri_template);
        registry.register("uuid", |s| s.len() == 36 && Uuid::parse_str(s).is_ok());
        registry.register("date", |s| {
            s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        });
        registry.register("date-time", |s| {
            DateTime::parse_from_rfc3339(s).is_ok()
                || DateTime::parse_from_rfc3339(&s.to_ascii_uppercase()).is_ok()
        });
        registry.register("time", |s| TIME.is_match(s));
        registry.register("duration", is_duration);
        registry.register("ipv4", |s| s.parse::<Ipv4Addr>().is_ok());
        registry.register("ipv6", |s| s.parse::<Ipv6Addr>().is_ok());
        registry.register("hostname", |s| s.len() <= 253 && HOSTNAME.is_match(s));
        registry.register("json-pointer", |s| JSON_POINTER.is_match(s));
        registry.register("relative-json-pointer", |s| {
            RELATIVE_JSON_POINTER.is_match(s)
        });
        registry.register("regex", |s| Regex::new(s).is_ok());
        registry
    }

    /// Register or override a checker by name
    pub fn register<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.checks.insert(name.into(), Arc::new(check));
    }

    /// Whether a checker exists for the given name
    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Check a string against the named format.
    /// Unrecognized format names are treated as always valid.
    pub fn check(&self, name: &str, text: &str) -> bool {
        match self.checks.get(name) {
            Some(check) => check(text),
            None => true,
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FormatRegistry")
            .field("formats", &names)
            .finish()
    }
}

/// ISO 8601 duration: `P` followed by date components, optionally `T` and
/// time components, at least one component overall. Written as a scanner
/// because the regex crate has no lookahead.
fn is_duration(text: &str) -> bool {
    let Some(body) = text.strip_prefix('P') else {
        return false;
    };
    if body.is_empty() {
        return false;
    }

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };
    if let Some(time) = &time_part {
        if time.is_empty() {
            return false;
        }
    }

    let date_ok = if date_part.contains('W') {
        scan_components(date_part, &['W'], false)
    } else {
        scan_components(date_part, &['Y', 'M', 'D'], false)
    };
    let time_ok = match time_part {
        Some(time) => scan_components(time, &['H', 'M', 'S'], true),
        None => !date_part.is_empty(),
    };
    date_ok && time_ok
}

/// Scan `number designator` pairs in designator order; `allow_fraction`
/// permits a decimal number on the final (seconds) component.
fn scan_components(mut text: &str, designators: &[char], allow_fraction: bool) -> bool {
    let mut next_designator = 0;
    while !text.is_empty() {
        let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        let mut consumed = digits;
        let rest = &text[digits..];
        let rest = if allow_fraction && rest.starts_with('.') {
            let fraction = rest[1..].chars().take_while(|c| c.is_ascii_digit()).count();
            if fraction == 0 {
                return false;
            }
            consumed += 1 + fraction;
            &text[consumed..]
        } else {
            rest
        };
        let Some(designator) = rest.chars().next() else {
            return false;
        };
        let Some(position) = designators[next_designator..]
            .iter()
            .position(|d| *d == designator)
        else {
            return false;
        };
        if designator == 'S' && consumed > digits {
            // fraction only ever allowed on seconds
        } else if consumed > digits {
            return false;
        }
        next_designator += position + 1;
        text = &rest[1..];
    }
    true
}

fn is_uri_template(text: &str) -> bool {
    let mut in_expression = false;
    let mut expression_len = 0;
    for c in text.chars() {
        match c {
            '{' => {
                if in_expression {
                    return false;
                }
                in_expression = true;
                expression_len = 0;
            }
            '}' => {
                if !in_expression || expression_len == 0 {
                    return false;
                }
                in_expression = false;
            }
            _ if in_expression => expression_len += 1,
            c if c.is_whitespace() => return false,
            _ => {}
        }
    }
    !in_expression
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FormatRegistry {
        FormatRegistry::with_defaults()
    }

    #[test]
    fn test_unknown_format_is_always_valid() {
        let registry = defaults();
        assert!(registry.check("no-such-format", "anything at all"));
    }

    #[test]
    fn test_override_replaces_default() {
        let mut registry = defaults();
        registry.register("email", |s| s == "only@this.one");
        assert!(registry.check("email", "only@this.one"));
        assert!(!registry.check("email", "valid@example.com"));
    }

    #[test]
    fn test_email() {
        let registry = defaults();
        assert!(registry.check("email", "user@example.com"));
        assert!(registry.check("email", "first.last+tag@sub.example.org"));
        assert!(!registry.check("email", "no-at-sign"));
        assert!(!registry.check("email", "user@nodot"));
        assert!(!registry.check("email", ".leading@example.com"));
    }

    #[test]
    fn test_uri_and_reference() {
        let registry = defaults();
        assert!(registry.check("uri", "https://example.com/a?b=c"));
        assert!(registry.check("uri", "urn:isbn:0451450523"));
        assert!(!registry.check("uri", "not a uri"));
        assert!(!registry.check("uri", "/relative/only"));

        assert!(registry.check("uri-reference", "/relative/only"));
        assert!(registry.check("uri-reference", ""));
        assert!(!registry.check("uri-reference", "has space"));
        assert!(!registry.check("uri-reference", r"back\slash"));
    }

    #[test]
    fn test_uuid() {
        let registry = defaults();
        assert!(registry.check("uuid", "550e8400-e29b-41d4-a716-446655440000"));
        assert!(registry.check("uuid", "550E8400-E29B-41D4-A716-446655440000"));
        assert!(!registry.check("uuid", "550e8400e29b41d4a716446655440000"));
        assert!(!registry.check("uuid", "not-a-uuid"));
    }

    #[test]
    fn test_date_time_kinds() {
        let registry = defaults();
        assert!(registry.check("date", "2024-02-29"));
        assert!(!registry.check("date", "2023-02-29"));
        assert!(!registry.check("date", "2024-2-9"));

        assert!(registry.check("date-time", "2024-01-15T10:30:00Z"));
        assert!(registry.check("date-time", "2024-01-15t10:30:00+02:00"));
        assert!(!registry.check("date-time", "2024-01-15"));

        assert!(registry.check("time", "10:30:00Z"));
        assert!(registry.check("time", "23:59:60+01:00"));
        assert!(!registry.check("time", "10:30:00"));
        assert!(!registry.check("time", "24:00:00Z"));
    }

    #[test]
    fn test_duration() {
        let registry = defaults();
        assert!(registry.check("duration", "P1Y2M3D"));
        assert!(registry.check("duration", "PT1H30M"));
        assert!(registry.check("duration", "P1DT12H"));
        assert!(registry.check("duration", "P4W"));
        assert!(registry.check("duration", "PT0.5S"));
        assert!(!registry.check("duration", "P"));
        assert!(!registry.check("duration", "P1DT"));
        assert!(!registry.check("duration", "1Y"));
        assert!(!registry.check("duration", "P1H"));
        assert!(!registry.check("duration", "PT1.5H"));
    }

    #[test]
    fn test_ip_addresses() {
        let registry = defaults();
        assert!(registry.check("ipv4", "192.168.1.1"));
        assert!(!registry.check("ipv4", "256.1.1.1"));
        assert!(!registry.check("ipv4", "192.168.1"));

        assert!(registry.check("ipv6", "::1"));
        assert!(registry.check("ipv6", "2001:db8::8a2e:370:7334"));
        assert!(!registry.check("ipv6", "2001:db8::g"));
    }

    #[test]
    fn test_hostname() {
        let registry = defaults();
        assert!(registry.check("hostname", "example.com"));
        assert!(registry.check("hostname", "a-b.c-d.example"));
        assert!(!registry.check("hostname", "-leading.example"));
        assert!(!registry.check("hostname", "under_score.example"));
    }

    #[test]
    fn test_json_pointers() {
        let registry = defaults();
        assert!(registry.check("json-pointer", ""));
        assert!(registry.check("json-pointer", "/a/b/0"));
        assert!(registry.check("json-pointer", "/a~0b/~1c"));
        assert!(!registry.check("json-pointer", "a/b"));
        assert!(!registry.check("json-pointer", "/a~2"));

        assert!(registry.check("relative-json-pointer", "0"));
        assert!(registry.check("relative-json-pointer", "1/a/b"));
        assert!(registry.check("relative-json-pointer", "2#"));
        assert!(!registry.check("relative-json-pointer", "01"));
        assert!(!registry.check("relative-json-pointer", "#"));
    }

    #[test]
    fn test_regex_format() {
        let registry = defaults();
        assert!(registry.check("regex", r"^a+b*$"));
        assert!(!registry.check("regex", r"(unclosed"));
    }

    #[test]
    fn test_uri_template() {
        let registry = defaults();
        assert!(registry.check("uri-template", "https://example.com/{id}"));
        assert!(registry.check("uri-template", "/search{?q,lang}"));
        assert!(!registry.check("uri-template", "/bad/{unclosed"));
        assert!(!registry.check("uri-template", "/bad/{}"));
        assert!(!registry.check("uri-template", "has space"));
    }
}
