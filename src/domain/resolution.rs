//! Effective-permission resolution over a role snapshot.
//!
//! Two policies are supported side by side:
//!
//! * [`ResolutionPolicy::StrictAncestor`]: a role holds its own grants plus
//!   those of every ancestor. The nearest ancestor granting a key is recorded
//!   as its source.
//! * [`ResolutionPolicy::BroadHierarchy`]: additionally pulls in grants from
//!   descendants and from every role sharing a parent anywhere up the chain.
//!   This over-grants (a role "inherits" from its own children) and is kept
//!   for compatibility with data produced under it.
//!
//! In both cases the first source to supply a key wins; sources are visited
//! as: the role itself, ancestors nearest first, then (broad only)
//! descendants breadth-first, then shared-ancestor siblings.

use crate::domain::hierarchy::{ancestors_of, descendants_of, siblings_under_shared_ancestors};
use crate::domain::permission::PermissionKey;
use crate::domain::role_graph::RoleGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionPolicy {
    #[default]
    #[serde(rename = "strict")]
    StrictAncestor,
    #[serde(rename = "broad")]
    BroadHierarchy,
}

impl ResolutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPolicy::StrictAncestor => "strict",
            ResolutionPolicy::BroadHierarchy => "broad",
        }
    }
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resolution policy '{0}': expected 'strict' or 'broad'")]
pub struct ParsePolicyError(pub String);

impl FromStr for ResolutionPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "strict_ancestor" => Ok(ResolutionPolicy::StrictAncestor),
            "broad" | "broad_hierarchy" => Ok(ResolutionPolicy::BroadHierarchy),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Where a resolved key came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    Direct,
    InheritedFrom(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPermission {
    pub key: PermissionKey,
    pub provenance: Provenance,
}

/// Resolver output: one entry per key, in discovery order.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPermissions {
    pub role_id: String,
    pub policy: ResolutionPolicy,
    entries: Vec<ResolvedPermission>,
}

impl ResolvedPermissions {
    pub fn empty(role_id: impl Into<String>, policy: ResolutionPolicy) -> Self {
        Self {
            role_id: role_id.into(),
            policy,
            entries: vec![],
        }
    }

    pub fn entries(&self) -> &[ResolvedPermission] {
        &self.entries
    }

    pub fn get(&self, key: &PermissionKey) -> Option<&ResolvedPermission> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&ResolvedPermission) -> bool) {
        self.entries.retain(|entry| keep(entry));
    }
}

/// Collects entries while enforcing first-discovery-wins.
struct Collector {
    resolved: ResolvedPermissions,
    seen: HashSet<PermissionKey>,
}

impl Collector {
    fn new(role_id: &str, policy: ResolutionPolicy) -> Self {
        Self {
            resolved: ResolvedPermissions::empty(role_id, policy),
            seen: HashSet::new(),
        }
    }

    fn record_all<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a PermissionKey>,
        provenance: &Provenance,
    ) {
        for key in keys {
            if self.seen.insert(key.clone()) {
                self.resolved.entries.push(ResolvedPermission {
                    key: key.clone(),
                    provenance: provenance.clone(),
                });
            }
        }
    }
}

/// Computes the effective permissions of `role_id` under `policy`.
///
/// An unknown role resolves to an empty set. Traversal never revisits a
/// role, so cyclic parent pointers still produce a finite result.
pub fn resolve(graph: &RoleGraph, role_id: &str, policy: ResolutionPolicy) -> ResolvedPermissions {
    let mut collector = Collector::new(role_id, policy);
    let Some(role) = graph.by_id(role_id) else {
        return collector.resolved;
    };

    collector.record_all(&role.permissions, &Provenance::Direct);

    let mut sources = ancestors_of(graph, role_id);
    if policy == ResolutionPolicy::BroadHierarchy {
        sources.extend(descendants_of(graph, role_id));
        sources.extend(siblings_under_shared_ancestors(graph, role_id));
    }

    for source_id in sources {
        if source_id == role_id {
            continue;
        }
        if let Some(source) = graph.by_id(&source_id) {
            collector.record_all(&source.permissions, &Provenance::InheritedFrom(source_id.clone()));
        }
    }

    collector.resolved
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InheritedPermission {
    pub key: PermissionKey,
    pub source_role_id: String,
    pub source_role_name: String,
}

/// Caller-facing view of a resolution.
///
/// `direct` lists only keys assigned to the role itself; keys the role gets
/// through the hierarchy are in `inherited`. Use [`EffectivePermissions::granted`]
/// for the union. Both lists are sorted by key.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectivePermissions {
    pub role_id: String,
    pub role_name: Option<String>,
    pub policy: ResolutionPolicy,
    pub direct: Vec<PermissionKey>,
    pub inherited: Vec<InheritedPermission>,
}

impl EffectivePermissions {
    /// Result for a role that is not in the snapshot.
    pub fn empty(role_id: impl Into<String>, policy: ResolutionPolicy) -> Self {
        Self {
            role_id: role_id.into(),
            role_name: None,
            policy,
            direct: vec![],
            inherited: vec![],
        }
    }

    pub fn from_resolved(resolved: ResolvedPermissions, graph: &RoleGraph) -> Self {
        let mut direct = Vec::new();
        let mut inherited = Vec::new();
        for entry in resolved.entries {
            match entry.provenance {
                Provenance::Direct => direct.push(entry.key),
                Provenance::InheritedFrom(source_role_id) => {
                    let source_role_name = graph
                        .name_of(&source_role_id)
                        .unwrap_or(source_role_id.as_str())
                        .to_string();
                    inherited.push(InheritedPermission {
                        key: entry.key,
                        source_role_id,
                        source_role_name,
                    });
                }
            }
        }
        direct.sort();
        inherited.sort_by(|a, b| a.key.cmp(&b.key));

        Self {
            role_name: graph.name_of(&resolved.role_id).map(str::to_string),
            role_id: resolved.role_id,
            policy: resolved.policy,
            direct,
            inherited,
        }
    }

    /// Every key the role holds, direct or inherited, sorted.
    pub fn granted(&self) -> Vec<PermissionKey> {
        let mut keys: Vec<PermissionKey> = self
            .direct
            .iter()
            .cloned()
            .chain(self.inherited.iter().map(|i| i.key.clone()))
            .collect();
        keys.sort();
        keys
    }

    pub fn grants(&self, key: &PermissionKey) -> bool {
        self.direct.contains(key) || self.inherited.iter().any(|i| &i.key == key)
    }

    pub fn source_of(&self, key: &PermissionKey) -> Option<&InheritedPermission> {
        self.inherited.iter().find(|i| &i.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.inherited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role_graph::RoleNode;

    fn key(raw: &str) -> PermissionKey {
        raw.parse().unwrap()
    }

    fn inherited(key_raw: &str, source: &str) -> ResolvedPermission {
        ResolvedPermission {
            key: key(key_raw),
            provenance: Provenance::InheritedFrom(source.to_string()),
        }
    }

    fn direct(key_raw: &str) -> ResolvedPermission {
        ResolvedPermission {
            key: key(key_raw),
            provenance: Provenance::Direct,
        }
    }

    // guest <- user <- editor <- admin
    fn blog_graph() -> RoleGraph {
        RoleGraph::from_nodes(vec![
            RoleNode::new("guest", "guest").with_permission(key("read:post")),
            RoleNode::new("user", "user")
                .with_parent("guest")
                .with_permission(key("write:post")),
            RoleNode::new("editor", "editor").with_parent("user"),
            RoleNode::new("admin", "admin")
                .with_parent("editor")
                .with_permission(key("delete:post"))
                .with_permission(key("manage:users")),
        ])
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("strict".parse(), Ok(ResolutionPolicy::StrictAncestor));
        assert_eq!("BROAD".parse(), Ok(ResolutionPolicy::BroadHierarchy));
        assert!("lateral".parse::<ResolutionPolicy>().is_err());
        assert_eq!(ResolutionPolicy::BroadHierarchy.to_string(), "broad");
        assert_eq!(ResolutionPolicy::default(), ResolutionPolicy::StrictAncestor);
    }

    #[test]
    fn test_strict_collects_ancestors_nearest_first() {
        let resolved = resolve(&blog_graph(), "admin", ResolutionPolicy::StrictAncestor);
        assert_eq!(
            resolved.entries(),
            &[
                direct("delete:post"),
                direct("manage:users"),
                inherited("write:post", "user"),
                inherited("read:post", "guest"),
            ]
        );
    }

    #[test]
    fn test_strict_ignores_descendants() {
        let resolved = resolve(&blog_graph(), "guest", ResolutionPolicy::StrictAncestor);
        assert_eq!(resolved.entries(), &[direct("read:post")]);
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("a", "a").with_permission(key("read:post")),
            RoleNode::new("b", "b")
                .with_parent("a")
                .with_permission(key("read:post")),
            RoleNode::new("c", "c").with_parent("b"),
        ]);
        let resolved = resolve(&graph, "c", ResolutionPolicy::StrictAncestor);
        assert_eq!(resolved.entries(), &[inherited("read:post", "b")]);

        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("a", "a").with_permission(key("read:post")),
            RoleNode::new("b", "b").with_parent("a"),
            RoleNode::new("c", "c").with_parent("b"),
        ]);
        let resolved = resolve(&graph, "c", ResolutionPolicy::StrictAncestor);
        assert_eq!(resolved.entries(), &[inherited("read:post", "a")]);
    }

    #[test]
    fn test_direct_beats_inherited() {
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("a", "a").with_permission(key("read:post")),
            RoleNode::new("b", "b")
                .with_parent("a")
                .with_permission(key("read:post")),
        ]);
        for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
            let resolved = resolve(&graph, "b", policy);
            assert_eq!(resolved.entries(), &[direct("read:post")]);
        }
    }

    #[test]
    fn test_broad_pulls_in_descendants() {
        let resolved = resolve(&blog_graph(), "guest", ResolutionPolicy::BroadHierarchy);
        assert_eq!(
            resolved.entries(),
            &[
                direct("read:post"),
                inherited("write:post", "user"),
                inherited("delete:post", "admin"),
                inherited("manage:users", "admin"),
            ]
        );
    }

    #[test]
    fn test_broad_pulls_in_cousins_through_shared_grandparent() {
        //        root
        //       /    \
        //      a      b (export:report)
        //      |      |
        //      c      d (approve:invoice)
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("root", "root"),
            RoleNode::new("a", "a").with_parent("root"),
            RoleNode::new("b", "b")
                .with_parent("root")
                .with_permission(key("export:report")),
            RoleNode::new("c", "c").with_parent("a"),
            RoleNode::new("d", "d")
                .with_parent("b")
                .with_permission(key("approve:invoice")),
        ]);

        let strict = resolve(&graph, "c", ResolutionPolicy::StrictAncestor);
        assert!(strict.is_empty());

        // b is a sibling of c's parent; d only sits under that sibling and is not reached.
        let broad = resolve(&graph, "c", ResolutionPolicy::BroadHierarchy);
        assert_eq!(broad.entries(), &[inherited("export:report", "b")]);
    }

    #[test]
    fn test_broad_provenance_prefers_ancestor_over_descendant() {
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("top", "top").with_permission(key("read:post")),
            RoleNode::new("mid", "mid").with_parent("top"),
            RoleNode::new("low", "low")
                .with_parent("mid")
                .with_permission(key("read:post"))
                .with_permission(key("write:post")),
        ]);
        let resolved = resolve(&graph, "mid", ResolutionPolicy::BroadHierarchy);
        assert_eq!(
            resolved.entries(),
            &[inherited("read:post", "top"), inherited("write:post", "low")]
        );
    }

    #[test]
    fn test_unknown_role_resolves_empty() {
        for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
            let resolved = resolve(&blog_graph(), "ghost", policy);
            assert!(resolved.is_empty());
            assert_eq!(resolved.role_id, "ghost");
        }
    }

    #[test]
    fn test_isolated_role_gets_only_direct() {
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("solo", "solo").with_permission(key("read:post")),
            RoleNode::new("other", "other").with_permission(key("write:post")),
        ]);
        for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
            let resolved = resolve(&graph, "solo", policy);
            assert_eq!(resolved.entries(), &[direct("read:post")]);
        }
    }

    #[test]
    fn test_cycle_resolves_finitely() {
        let graph = RoleGraph::from_nodes(vec![
            RoleNode::new("x", "x")
                .with_parent("y")
                .with_permission(key("read:post")),
            RoleNode::new("y", "y")
                .with_parent("x")
                .with_permission(key("write:post")),
        ]);
        for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
            let resolved = resolve(&graph, "x", policy);
            assert_eq!(
                resolved.entries(),
                &[direct("read:post"), inherited("write:post", "y")]
            );
        }
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let graph = blog_graph();
        for policy in [ResolutionPolicy::StrictAncestor, ResolutionPolicy::BroadHierarchy] {
            assert_eq!(resolve(&graph, "editor", policy), resolve(&graph, "editor", policy));
        }
    }

    #[test]
    fn test_effective_view_splits_direct_and_inherited() {
        let graph = blog_graph();
        let effective = EffectivePermissions::from_resolved(
            resolve(&graph, "admin", ResolutionPolicy::StrictAncestor),
            &graph,
        );

        assert_eq!(effective.role_name.as_deref(), Some("admin"));
        assert_eq!(effective.direct, vec![key("delete:post"), key("manage:users")]);
        assert_eq!(
            effective.inherited,
            vec![
                InheritedPermission {
                    key: key("read:post"),
                    source_role_id: "guest".to_string(),
                    source_role_name: "guest".to_string(),
                },
                InheritedPermission {
                    key: key("write:post"),
                    source_role_id: "user".to_string(),
                    source_role_name: "user".to_string(),
                },
            ]
        );
        assert_eq!(effective.granted().len(), 4);
        assert!(effective.grants(&key("read:post")));
        assert!(!effective.grants(&key("publish:post")));
        assert_eq!(effective.source_of(&key("write:post")).unwrap().source_role_id, "user");
        assert!(effective.source_of(&key("delete:post")).is_none());
    }

    #[test]
    fn test_effective_view_for_unknown_role() {
        let graph = blog_graph();
        let effective = EffectivePermissions::from_resolved(
            resolve(&graph, "ghost", ResolutionPolicy::StrictAncestor),
            &graph,
        );
        assert_eq!(effective, EffectivePermissions::empty("ghost", ResolutionPolicy::StrictAncestor));
        assert!(effective.is_empty());
    }
}
