//! Array batch optimizer
//!
//! Without batching, N fields declared under the same array incur N
//! independent traversals of that array. The plan below groups declared
//! paths by their array-path prefix so the engine can walk each array once
//! and evaluate every member's relative rule chain per element.

use std::sync::Arc;

use crate::path::{self, PathSegments, WILDCARD};
use crate::rule::Rule;
use crate::rules::Rules;

/// Where a declared field ended up in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Wildcard-free path, validated directly
    Plain,
    /// Member of the batch group at this index
    Group(usize),
}

/// One field's share of a batch group: the path remainder after the
/// group's array path, plus its rule chain.
#[derive(Clone)]
pub struct BatchMember {
    /// The originally declared path, wildcards included
    pub full_path: String,
    /// Path remainder after the last wildcard; empty when the declared
    /// path ends at the wildcard itself
    pub relative_path: String,
    /// Interned segments of `relative_path`
    pub relative_segments: PathSegments,
    /// Rules in declaration order
    pub rules: Vec<Arc<dyn Rule>>,
}

/// Fields sharing one array-path prefix, executed in a single traversal.
#[derive(Clone)]
pub struct BatchGroup {
    /// Path of the array to iterate: everything before the declared path's
    /// last wildcard. May itself contain earlier wildcards; the engine
    /// recurses through those, extending the index pattern `[i][j]…`.
    pub array_path: String,
    /// Interned segments of `array_path`
    pub array_segments: PathSegments,
    /// Members in declaration order
    pub members: Vec<BatchMember>,
}

/// Derived execution plan for a rule collection.
///
/// Recomputable from the [`Rules`] at any time; built once per compiled
/// validator and immutable thereafter.
#[derive(Clone, Default)]
pub struct BatchPlan {
    slots: Vec<Slot>,
    groups: Vec<BatchGroup>,
}

impl std::fmt::Debug for BatchPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPlan")
            .field("plain_count", &self.slots.iter().filter(|s| **s == Slot::Plain).count())
            .field(
                "groups",
                &self
                    .groups
                    .iter()
                    .map(|g| (g.array_path.as_str(), g.members.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl BatchPlan {
    /// Analyze the declared field paths and derive the batch grouping.
    ///
    /// Every path containing a wildcard splits at its last wildcard into
    /// an array path and a relative remainder; paths sharing an array path
    /// form one group (singleton groups are fine). Wildcard-free paths
    /// stay plain.
    pub fn analyze(rules: &Rules) -> Self {
        let mut slots = Vec::with_capacity(rules.len());
        let mut groups: Vec<BatchGroup> = Vec::new();

        for field in rules.fields() {
            let last_wildcard = field
                .segments
                .iter()
                .rposition(|segment| segment == WILDCARD);
            let Some(split) = last_wildcard else {
                slots.push(Slot::Plain);
                continue;
            };

            let array_path = field.segments[..split].join(".");
            let relative_path = field.segments[split + 1..].join(".");
            let member = BatchMember {
                full_path: field.path.clone(),
                relative_segments: path::segments(&relative_path),
                relative_path,
                rules: field.rules.clone(),
            };

            let group_index = match groups.iter().position(|g| g.array_path == array_path) {
                Some(index) => {
                    groups[index].members.push(member);
                    index
                }
                None => {
                    groups.push(BatchGroup {
                        array_segments: path::segments(&array_path),
                        array_path,
                        members: vec![member],
                    });
                    groups.len() - 1
                }
            };
            slots.push(Slot::Group(group_index));
        }

        Self { slots, groups }
    }

    /// Slot of the declaration at the given index
    pub fn slot(&self, index: usize) -> Slot {
        self.slots[index]
    }

    /// All batch groups, in order of their first member's declaration
    pub fn groups(&self) -> &[BatchGroup] {
        &self.groups
    }
}

/// Render a concrete error path from a resolved array prefix, an element
/// index, and the relative remainder, e.g. `users` + 1 + `name` →
/// `users[1].name`.
pub(crate) fn indexed_path(rendered_array: &str, index: usize, relative: &str) -> String {
    if relative.is_empty() {
        format!("{rendered_array}[{index}]")
    } else {
        format!("{rendered_array}[{index}].{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{LengthValidator, RequiredValidator};

    fn declared(paths: &[&str]) -> Rules {
        let mut rules = Rules::new();
        for p in paths {
            rules = rules.rule(*p, RequiredValidator::new());
        }
        rules
    }

    #[test]
    fn test_sibling_fields_share_a_group() {
        let plan = BatchPlan::analyze(&declared(&["users.*.name", "users.*.age"]));
        assert_eq!(plan.groups().len(), 1);
        let group = &plan.groups()[0];
        assert_eq!(group.array_path, "users");
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.members[0].relative_path, "name");
        assert_eq!(group.members[1].relative_path, "age");
        assert_eq!(plan.slot(0), Slot::Group(0));
        assert_eq!(plan.slot(1), Slot::Group(0));
    }

    #[test]
    fn test_grouping_is_prefix_exact() {
        let plan = BatchPlan::analyze(&declared(&[
            "company.departments.*.employees.*.name",
            "company.departments.*.employees.*.badge",
            "company.departments.*.name",
        ]));

        assert_eq!(plan.groups().len(), 2);
        assert_eq!(plan.groups()[0].array_path, "company.departments.*.employees");
        assert_eq!(plan.groups()[0].members.len(), 2);
        assert_eq!(plan.groups()[1].array_path, "company.departments");
        assert_eq!(plan.groups()[1].members[0].relative_path, "name");
    }

    #[test]
    fn test_wildcard_free_paths_stay_plain() {
        let plan = BatchPlan::analyze(&declared(&["name", "users.*.email", "address.city"]));
        assert_eq!(plan.slot(0), Slot::Plain);
        assert_eq!(plan.slot(1), Slot::Group(0));
        assert_eq!(plan.slot(2), Slot::Plain);
        assert_eq!(plan.groups().len(), 1);
    }

    #[test]
    fn test_singleton_wildcard_is_a_valid_group() {
        let plan = BatchPlan::analyze(&declared(&["tags.*"]));
        assert_eq!(plan.groups().len(), 1);
        let group = &plan.groups()[0];
        assert_eq!(group.array_path, "tags");
        assert_eq!(group.members[0].relative_path, "");
        assert!(group.members[0].relative_segments.is_empty());
    }

    #[test]
    fn test_member_rules_keep_declaration_order() {
        let rules = Rules::new()
            .rule("users.*.name", RequiredValidator::new())
            .rule("users.*.name", LengthValidator::new().min(2));
        let plan = BatchPlan::analyze(&rules);
        let member = &plan.groups()[0].members[0];
        assert_eq!(member.rules.len(), 2);
        assert_eq!(member.rules[0].code(), "required");
        assert_eq!(member.rules[1].code(), "length");
    }

    #[test]
    fn test_indexed_path_rendering() {
        assert_eq!(indexed_path("users", 1, "name"), "users[1].name");
        assert_eq!(indexed_path("matrix[0]", 2, ""), "matrix[0][2]");
    }
}
