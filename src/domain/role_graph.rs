//! In-memory snapshot of the role catalog.
//!
//! A [`RoleGraph`] is built once per resolution (or once per batch) and then
//! only read. Lookups by role id and by parent id are O(1); children keep the
//! order in which roles were supplied so every traversal is deterministic.

use crate::domain::permission::{Permission, PermissionKey};
use crate::domain::role::Role;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// A role as seen by the resolution engine: its parent pointer and the keys it grants directly.
#[derive(Clone, Debug, PartialEq)]
pub struct RoleNode {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub permissions: Vec<PermissionKey>,
}

impl RoleNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            permissions: vec![],
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_permission(mut self, key: PermissionKey) -> Self {
        if !self.permissions.contains(&key) {
            self.permissions.push(key);
        }
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct RoleGraph {
    nodes: Vec<RoleNode>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl RoleGraph {
    /// Builds a graph from already-resolved nodes. A repeated id keeps its first occurrence.
    pub fn from_nodes(nodes: impl IntoIterator<Item = RoleNode>) -> Self {
        let mut graph = RoleGraph::default();
        for mut node in nodes {
            if graph.index.contains_key(&node.id) {
                warn!(role_id = %node.id, "Duplicate role id in catalog, keeping first");
                continue;
            }
            let mut seen = HashSet::new();
            node.permissions.retain(|key| seen.insert(key.clone()));

            let position = graph.nodes.len();
            graph.index.insert(node.id.clone(), position);
            if let Some(parent_id) = &node.parent_id {
                graph
                    .children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(position);
            }
            graph.nodes.push(node);
        }
        graph
    }

    /// Builds a graph from the role catalog, translating each role's permission
    /// ids into keys through the permission catalog. Ids without a catalog
    /// record are dropped.
    pub fn from_catalog(roles: &[Role], permissions: &[Permission]) -> Self {
        let keys_by_id: HashMap<&str, PermissionKey> = permissions
            .iter()
            .map(|p| (p.id.as_str(), p.key()))
            .collect();

        let nodes = roles.iter().map(|role| {
            let mut node = RoleNode::new(role.id.clone(), role.name.clone());
            node.parent_id = role.parent_role_id.clone();
            for permission_id in &role.permissions {
                match keys_by_id.get(permission_id.as_str()) {
                    Some(key) => node.permissions.push(key.clone()),
                    None => debug!(
                        role_id = %role.id,
                        permission_id = %permission_id,
                        "Skipping assignment to unknown permission"
                    ),
                }
            }
            node
        });

        Self::from_nodes(nodes)
    }

    pub fn by_id(&self, role_id: &str) -> Option<&RoleNode> {
        self.index.get(role_id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, role_id: &str) -> bool {
        self.index.contains_key(role_id)
    }

    /// Name of the role, if it is part of the snapshot.
    pub fn name_of(&self, role_id: &str) -> Option<&str> {
        self.by_id(role_id).map(|node| node.name.as_str())
    }

    /// Direct children of `parent_id`, in catalog order.
    pub fn children_of<'a>(
        &'a self,
        parent_id: &str,
    ) -> impl Iterator<Item = &'a RoleNode> + use<'a> {
        self.children
            .get(parent_id)
            .into_iter()
            .flatten()
            .map(|&i| &self.nodes[i])
    }

    /// All roles in catalog order.
    pub fn roles(&self) -> impl Iterator<Item = &RoleNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
