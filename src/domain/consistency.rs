use crate::domain::permission::{Permission, PermissionKey};
use crate::domain::resolution::ResolvedPermissions;
use std::collections::HashSet;
use tracing::debug;

/// The set of keys that currently exist in the permission catalog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PermissionCatalog {
    keys: HashSet<PermissionKey>,
}

impl PermissionCatalog {
    pub fn from_permissions<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Self {
        Self {
            keys: permissions.into_iter().map(Permission::key).collect(),
        }
    }

    pub fn contains(&self, key: &PermissionKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<PermissionKey> for PermissionCatalog {
    fn from_iter<I: IntoIterator<Item = PermissionKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Drops every resolved entry whose key is no longer in `catalog`.
///
/// Missing keys are not an error: they come from assignments to permissions
/// deleted after the snapshot was taken, or from keys that never existed.
pub fn validate(mut resolved: ResolvedPermissions, catalog: &PermissionCatalog) -> ResolvedPermissions {
    let before = resolved.len();
    resolved.retain(|entry| catalog.contains(&entry.key));
    let dropped = before - resolved.len();
    if dropped > 0 {
        debug!(role_id = %resolved.role_id, dropped, "Dropped stale permission references");
    }
    resolved
}
