use super::queries::{
    CheckRolePermissionQuery, GetEffectivePermissionsQuery, GetRoleHierarchyQuery,
    GetRolePermissionMatrixQuery, ListEffectivePermissionsQuery, PermissionCheckReadModel,
    PermissionMatrixReadModel, RoleHierarchyReadModel,
};
use super::query_bus::QueryHandler;
use super::services::{PermissionResolutionService, RbacError};
use crate::domain::resolution::EffectivePermissions;
use crate::infrastructure::PermissionGroupRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, instrument};

// ============================================================================
// QUERY HANDLERS
// ============================================================================

pub struct GetEffectivePermissionsQueryHandler {
    resolution_service: Arc<PermissionResolutionService>,
}

impl GetEffectivePermissionsQueryHandler {
    pub fn new(resolution_service: Arc<PermissionResolutionService>) -> Self {
        Self { resolution_service }
    }
}

#[async_trait]
impl QueryHandler<GetEffectivePermissionsQuery> for GetEffectivePermissionsQueryHandler {
    type Result = EffectivePermissions;
    type Error = RbacError;

    #[instrument(name = "get_effective_permissions_query_handler", skip(self, query))]
    async fn handle(
        &self,
        query: GetEffectivePermissionsQuery,
    ) -> Result<Self::Result, Self::Error> {
        let policy = query
            .policy
            .unwrap_or_else(|| self.resolution_service.policy());
        Ok(self
            .resolution_service
            .resolve_effective_permissions_with(&query.role_id, policy)
            .await?)
    }
}

/// Admin overview: every role resolved against one shared snapshot.
pub struct ListEffectivePermissionsQueryHandler {
    resolution_service: Arc<PermissionResolutionService>,
}

impl ListEffectivePermissionsQueryHandler {
    pub fn new(resolution_service: Arc<PermissionResolutionService>) -> Self {
        Self { resolution_service }
    }
}

#[async_trait]
impl QueryHandler<ListEffectivePermissionsQuery> for ListEffectivePermissionsQueryHandler {
    type Result = Vec<EffectivePermissions>;
    type Error = RbacError;

    #[instrument(name = "list_effective_permissions_query_handler", skip(self, query))]
    async fn handle(
        &self,
        query: ListEffectivePermissionsQuery,
    ) -> Result<Self::Result, Self::Error> {
        let policy = query
            .policy
            .unwrap_or_else(|| self.resolution_service.policy());
        Ok(self.resolution_service.resolve_all(policy).await?)
    }
}

pub struct CheckRolePermissionQueryHandler {
    resolution_service: Arc<PermissionResolutionService>,
}

impl CheckRolePermissionQueryHandler {
    pub fn new(resolution_service: Arc<PermissionResolutionService>) -> Self {
        Self { resolution_service }
    }
}

#[async_trait]
impl QueryHandler<CheckRolePermissionQuery> for CheckRolePermissionQueryHandler {
    type Result = PermissionCheckReadModel;
    type Error = RbacError;

    #[instrument(name = "check_role_permission_query_handler", skip(self, query))]
    async fn handle(&self, query: CheckRolePermissionQuery) -> Result<Self::Result, Self::Error> {
        let granted = self
            .resolution_service
            .check_permission(&query.role_id, &query.permission)
            .await?;
        Ok(PermissionCheckReadModel {
            role_id: query.role_id,
            permission: query.permission,
            granted,
        })
    }
}

pub struct GetRoleHierarchyQueryHandler {
    resolution_service: Arc<PermissionResolutionService>,
}

impl GetRoleHierarchyQueryHandler {
    pub fn new(resolution_service: Arc<PermissionResolutionService>) -> Self {
        Self { resolution_service }
    }
}

#[async_trait]
impl QueryHandler<GetRoleHierarchyQuery> for GetRoleHierarchyQueryHandler {
    type Result = RoleHierarchyReadModel;
    type Error = RbacError;

    #[instrument(name = "get_role_hierarchy_query_handler", skip(self, query))]
    async fn handle(&self, query: GetRoleHierarchyQuery) -> Result<Self::Result, Self::Error> {
        self.resolution_service
            .role_hierarchy(&query.role_id)
            .await?
            .ok_or(RbacError::RoleNotFound(query.role_id))
    }
}

pub struct GetRolePermissionMatrixQueryHandler {
    resolution_service: Arc<PermissionResolutionService>,
    permission_group_repo: Arc<dyn PermissionGroupRepository>,
}

impl GetRolePermissionMatrixQueryHandler {
    pub fn new(
        resolution_service: Arc<PermissionResolutionService>,
        permission_group_repo: Arc<dyn PermissionGroupRepository>,
    ) -> Self {
        Self {
            resolution_service,
            permission_group_repo,
        }
    }
}

#[async_trait]
impl QueryHandler<GetRolePermissionMatrixQuery> for GetRolePermissionMatrixQueryHandler {
    type Result = PermissionMatrixReadModel;
    type Error = RbacError;

    #[instrument(name = "get_role_permission_matrix_query_handler", skip(self, query))]
    async fn handle(
        &self,
        query: GetRolePermissionMatrixQuery,
    ) -> Result<Self::Result, Self::Error> {
        let groups = self.permission_group_repo.list_groups().await.map_err(|e| {
            error!(error = %e, "Failed to list permission groups");
            RbacError::StorageUnavailable(e.to_string())
        })?;

        self.resolution_service
            .permission_matrix(&query.role_id, &groups)
            .await?
            .ok_or(RbacError::RoleNotFound(query.role_id))
    }
}
