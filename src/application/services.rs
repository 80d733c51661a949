use crate::application::queries::{
    GrantStatus, PermissionMatrixEntry, PermissionMatrixGroup, PermissionMatrixReadModel,
    RoleHierarchyReadModel, RoleSummary,
};
use crate::application::role_graph_loader::{RoleGraphSnapshot, load_role_graph};
use crate::application::validators::ValidationError;
use crate::domain::hierarchy::{ancestors_of, descendants_of, siblings_under_shared_ancestors};
use crate::domain::permission::{ParsePermissionKeyError, PermissionKey};
use crate::domain::permission_group::PermissionGroup;
use crate::domain::resolution::{EffectivePermissions, ResolutionPolicy};
use crate::domain::role_graph::RoleGraph;
use crate::infrastructure::{PermissionRepository, RoleRepository};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The only failure that aborts a resolution. Missing roles, stale
/// permission references and cyclic hierarchies all degrade to smaller results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Errors surfaced by the RBAC command and query handlers.
#[derive(Debug, thiserror::Error)]
pub enum RbacError {
    #[error("Role not found: {0}")]
    RoleNotFound(String),
    #[error(transparent)]
    InvalidPermissionKey(#[from] ParsePermissionKeyError),
    #[error("Validation failed: {0}")]
    Validation(ValidationError),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<ResolutionError> for RbacError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::StorageUnavailable(message) => RbacError::StorageUnavailable(message),
        }
    }
}

impl From<ValidationError> for RbacError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::RoleNotFound(role_id) => RbacError::RoleNotFound(role_id),
            ValidationError::StorageUnavailable(message) => RbacError::StorageUnavailable(message),
            other => RbacError::Validation(other),
        }
    }
}

/// Entry point for effective-permission lookups.
///
/// Every call reads a fresh snapshot, so it observes whatever the role and
/// permission stores hold at that moment. A `resolve_all` batch shares one
/// snapshot across its roles and drops it when the batch ends.
pub struct PermissionResolutionService {
    role_repo: Arc<dyn RoleRepository>,
    permission_repo: Arc<dyn PermissionRepository>,
    policy: ResolutionPolicy,
}

impl PermissionResolutionService {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        permission_repo: Arc<dyn PermissionRepository>,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            role_repo,
            permission_repo,
            policy,
        }
    }

    /// Policy used when a caller does not ask for one.
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    pub async fn load_snapshot(&self) -> Result<RoleGraphSnapshot, ResolutionError> {
        load_role_graph(self.role_repo.as_ref(), self.permission_repo.as_ref()).await
    }

    /// Effective permissions of one role under the configured policy.
    pub async fn resolve_effective_permissions(
        &self,
        role_id: &str,
    ) -> Result<EffectivePermissions, ResolutionError> {
        self.resolve_effective_permissions_with(role_id, self.policy)
            .await
    }

    #[instrument(name = "resolve_effective_permissions", skip(self))]
    pub async fn resolve_effective_permissions_with(
        &self,
        role_id: &str,
        policy: ResolutionPolicy,
    ) -> Result<EffectivePermissions, ResolutionError> {
        let snapshot = self.load_snapshot().await?;
        if !snapshot.graph.contains(role_id) {
            warn!(role_id = %role_id, "Role not found, resolving to no permissions");
            return Ok(EffectivePermissions::empty(role_id, policy));
        }

        let effective = snapshot.effective_permissions(role_id, policy);
        info!(
            role_id = %role_id,
            %policy,
            direct = effective.direct.len(),
            inherited = effective.inherited.len(),
            "Resolved effective permissions"
        );
        Ok(effective)
    }

    /// Effective permissions of every role, in catalog order, from one shared snapshot.
    #[instrument(name = "resolve_all_effective_permissions", skip(self))]
    pub async fn resolve_all(
        &self,
        policy: ResolutionPolicy,
    ) -> Result<Vec<EffectivePermissions>, ResolutionError> {
        let snapshot = self.load_snapshot().await?;

        let results: Vec<EffectivePermissions> = snapshot
            .graph
            .roles()
            .map(|role| snapshot.effective_permissions(&role.id, policy))
            .collect();
        info!(roles = results.len(), %policy, "Resolved effective permissions for all roles");
        Ok(results)
    }

    /// Whether `role_id` holds `permission`, directly or through the hierarchy.
    pub async fn check_permission(
        &self,
        role_id: &str,
        permission: &PermissionKey,
    ) -> Result<bool, ResolutionError> {
        let effective = self.resolve_effective_permissions(role_id).await?;
        Ok(effective.grants(permission))
    }

    /// The role's parent chain, subtree and siblings, or `None` for an unknown role.
    pub async fn role_hierarchy(
        &self,
        role_id: &str,
    ) -> Result<Option<RoleHierarchyReadModel>, ResolutionError> {
        let snapshot = self.load_snapshot().await?;
        let graph = &snapshot.graph;
        let Some(role) = graph.by_id(role_id) else {
            return Ok(None);
        };

        Ok(Some(RoleHierarchyReadModel {
            role_id: role.id.clone(),
            role_name: role.name.clone(),
            parent_role_id: role.parent_id.clone(),
            ancestors: summarize(graph, ancestors_of(graph, role_id)),
            descendants: summarize(graph, descendants_of(graph, role_id)),
            siblings: summarize(graph, siblings_under_shared_ancestors(graph, role_id)),
        }))
    }

    /// Every catalog permission bucketed by `groups`, marked with how the role holds it.
    ///
    /// Groups keep the given order. Permissions without a group, or whose group
    /// is not in `groups`, land in a trailing "ungrouped" bucket that is only
    /// present when non-empty.
    pub async fn permission_matrix(
        &self,
        role_id: &str,
        groups: &[PermissionGroup],
    ) -> Result<Option<PermissionMatrixReadModel>, ResolutionError> {
        let snapshot = self.load_snapshot().await?;
        if !snapshot.graph.contains(role_id) {
            return Ok(None);
        }
        let effective = snapshot.effective_permissions(role_id, self.policy);

        let mut buckets: Vec<PermissionMatrixGroup> = groups
            .iter()
            .map(|g| PermissionMatrixGroup {
                group_id: g.id.clone(),
                group_name: g.name.clone(),
                permissions: vec![],
            })
            .collect();
        let ungrouped = PermissionGroup::ungrouped();
        let mut ungrouped_entries = Vec::new();

        for permission in &snapshot.permissions {
            let key = permission.key();
            let status = if effective.direct.contains(&key) {
                GrantStatus::Direct
            } else if let Some(source) = effective.source_of(&key) {
                GrantStatus::Inherited {
                    source_role_id: source.source_role_id.clone(),
                    source_role_name: source.source_role_name.clone(),
                }
            } else {
                GrantStatus::NotGranted
            };
            let entry = PermissionMatrixEntry {
                permission_id: permission.id.clone(),
                name: permission.display_name(),
                key,
                status,
            };

            let bucket = permission
                .group_id
                .as_deref()
                .and_then(|group_id| buckets.iter_mut().find(|b| b.group_id == group_id));
            match bucket {
                Some(bucket) => bucket.permissions.push(entry),
                None => ungrouped_entries.push(entry),
            }
        }

        if !ungrouped_entries.is_empty() {
            buckets.push(PermissionMatrixGroup {
                group_id: ungrouped.id,
                group_name: ungrouped.name,
                permissions: ungrouped_entries,
            });
        }

        Ok(Some(PermissionMatrixReadModel {
            role_id: effective.role_id,
            role_name: effective.role_name,
            policy: effective.policy,
            groups: buckets,
        }))
    }
}

fn summarize(graph: &RoleGraph, role_ids: Vec<String>) -> Vec<RoleSummary> {
    role_ids
        .into_iter()
        .map(|id| RoleSummary {
            name: graph.name_of(&id).unwrap_or(&id).to_string(),
            id,
        })
        .collect()
}
