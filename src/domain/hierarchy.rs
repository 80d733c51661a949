//! Traversals over a [`RoleGraph`].
//!
//! The catalog does not enforce acyclic parent pointers, so every walk keeps a
//! visited set and stops at the first repeated id instead of looping.

use crate::domain::role_graph::RoleGraph;
use std::collections::{HashSet, VecDeque};

/// Parent chain of `role_id`, nearest parent first.
///
/// Stops at a root, at a parent id that is not in the graph, or when the walk
/// comes back to an id it has already seen. Unknown roles have no ancestors.
pub fn ancestors_of(graph: &RoleGraph, role_id: &str) -> Vec<String> {
    let mut ancestors = Vec::new();
    let Some(start) = graph.by_id(role_id) else {
        return ancestors;
    };

    let mut visited: HashSet<&str> = HashSet::from([start.id.as_str()]);
    let mut current = start;
    while let Some(parent_id) = current.parent_id.as_deref() {
        if !visited.insert(parent_id) {
            break;
        }
        let Some(parent) = graph.by_id(parent_id) else {
            break;
        };
        ancestors.push(parent.id.clone());
        current = parent;
    }
    ancestors
}

/// Every role below `role_id`, in breadth-first order. The role itself is never included.
pub fn descendants_of(graph: &RoleGraph, role_id: &str) -> Vec<String> {
    let mut descendants = Vec::new();
    if !graph.contains(role_id) {
        return descendants;
    }

    let mut visited: HashSet<String> = HashSet::from([role_id.to_string()]);
    let mut queue = VecDeque::from([role_id.to_string()]);
    while let Some(current) = queue.pop_front() {
        for child in graph.children_of(&current) {
            if visited.insert(child.id.clone()) {
                descendants.push(child.id.clone());
                queue.push_back(child.id.clone());
            }
        }
    }
    descendants
}

/// Roles sharing a parent with `role_id` or with any of its ancestors.
///
/// For the role and then each ancestor (nearest first), every child of that
/// node's parent is collected, skipping the role itself. The lookup goes
/// through the parent of each chain member, not the member itself, and that
/// reading is the intended one. The result is wide: ancestors appear as
/// children of their own parents, and cousins arbitrarily far apart are
/// pulled in once they share a grandparent somewhere up the chain. Order is
/// ancestor-then-child; each id appears once.
pub fn siblings_under_shared_ancestors(graph: &RoleGraph, role_id: &str) -> Vec<String> {
    let mut siblings = Vec::new();
    let Some(start) = graph.by_id(role_id) else {
        return siblings;
    };

    let chain = std::iter::once(start.id.clone()).chain(ancestors_of(graph, role_id));
    let mut seen: HashSet<String> = HashSet::from([role_id.to_string()]);
    for member in chain {
        let Some(parent_id) = graph.by_id(&member).and_then(|n| n.parent_id.as_deref()) else {
            continue;
        };
        for child in graph.children_of(parent_id) {
            if seen.insert(child.id.clone()) {
                siblings.push(child.id.clone());
            }
        }
    }
    siblings
}
