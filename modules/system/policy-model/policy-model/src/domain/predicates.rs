//! Attribute predicates used by the evaluator.

use std::collections::BTreeSet;

/// True when the two team sets share at least one team.
#[must_use]
pub fn teams_intersect(a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
    !a.is_disjoint(b)
}

/// True when `held` contains at least one of `required`.
#[must_use]
pub fn roles_satisfy(held: &BTreeSet<String>, required: &[String]) -> bool {
    required.iter().any(|r| held.contains(r))
}
