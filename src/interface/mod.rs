// Interface layer: HTTP APIs, DTOs

use crate::application::queries::{
    GrantStatus, PermissionCheckReadModel, PermissionMatrixEntry, PermissionMatrixGroup,
    PermissionMatrixReadModel, RoleHierarchyReadModel, RoleSummary,
};
use crate::domain::resolution::{EffectivePermissions, InheritedPermission};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PolicyParams {
    /// `strict` (default) or `broad`
    pub policy: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckParams {
    /// Permission key in `action:resource` form
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetRolePermissionsRequest {
    pub permission_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InheritedPermissionDto {
    pub permission: String,
    pub source_role_id: String,
    pub source_role_name: String,
}

impl From<InheritedPermission> for InheritedPermissionDto {
    fn from(inherited: InheritedPermission) -> Self {
        Self {
            permission: inherited.key.to_string(),
            source_role_id: inherited.source_role_id,
            source_role_name: inherited.source_role_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EffectivePermissionsResponse {
    pub role_id: String,
    pub role_name: Option<String>,
    pub policy: String,
    /// Keys assigned to the role itself
    pub direct: Vec<String>,
    /// Keys obtained through the hierarchy, with the role that supplied them
    pub inherited: Vec<InheritedPermissionDto>,
    /// Union of `direct` and `inherited`, sorted
    pub granted: Vec<String>,
}

impl From<EffectivePermissions> for EffectivePermissionsResponse {
    fn from(effective: EffectivePermissions) -> Self {
        let granted = effective.granted().iter().map(|k| k.to_string()).collect();
        Self {
            role_id: effective.role_id,
            role_name: effective.role_name,
            policy: effective.policy.to_string(),
            direct: effective.direct.iter().map(|k| k.to_string()).collect(),
            inherited: effective.inherited.into_iter().map(Into::into).collect(),
            granted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EffectivePermissionsListResponse {
    pub roles: Vec<EffectivePermissionsResponse>,
}

impl From<Vec<EffectivePermissions>> for EffectivePermissionsListResponse {
    fn from(all: Vec<EffectivePermissions>) -> Self {
        Self {
            roles: all.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub role_id: String,
    pub permission: String,
    pub granted: bool,
}

impl From<PermissionCheckReadModel> for PermissionCheckResponse {
    fn from(check: PermissionCheckReadModel) -> Self {
        Self {
            role_id: check.role_id,
            permission: check.permission.to_string(),
            granted: check.granted,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleSummaryDto {
    pub id: String,
    pub name: String,
}

impl From<RoleSummary> for RoleSummaryDto {
    fn from(role: RoleSummary) -> Self {
        Self {
            id: role.id,
            name: role.name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleHierarchyResponse {
    pub role_id: String,
    pub role_name: String,
    pub parent_role_id: Option<String>,
    pub ancestors: Vec<RoleSummaryDto>,
    pub descendants: Vec<RoleSummaryDto>,
    pub siblings: Vec<RoleSummaryDto>,
}

impl From<RoleHierarchyReadModel> for RoleHierarchyResponse {
    fn from(hierarchy: RoleHierarchyReadModel) -> Self {
        Self {
            role_id: hierarchy.role_id,
            role_name: hierarchy.role_name,
            parent_role_id: hierarchy.parent_role_id,
            ancestors: hierarchy.ancestors.into_iter().map(Into::into).collect(),
            descendants: hierarchy.descendants.into_iter().map(Into::into).collect(),
            siblings: hierarchy.siblings.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionMatrixEntryDto {
    pub permission_id: String,
    pub permission: String,
    pub name: String,
    /// `direct`, `inherited` or `not_granted`
    pub status: String,
    pub source_role_id: Option<String>,
    pub source_role_name: Option<String>,
}

impl From<PermissionMatrixEntry> for PermissionMatrixEntryDto {
    fn from(entry: PermissionMatrixEntry) -> Self {
        let (status, source_role_id, source_role_name) = match entry.status {
            GrantStatus::Direct => ("direct", None, None),
            GrantStatus::Inherited {
                source_role_id,
                source_role_name,
            } => ("inherited", Some(source_role_id), Some(source_role_name)),
            GrantStatus::NotGranted => ("not_granted", None, None),
        };
        Self {
            permission_id: entry.permission_id,
            permission: entry.key.to_string(),
            name: entry.name,
            status: status.to_string(),
            source_role_id,
            source_role_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionMatrixGroupDto {
    pub group_id: String,
    pub group_name: String,
    pub permissions: Vec<PermissionMatrixEntryDto>,
}

impl From<PermissionMatrixGroup> for PermissionMatrixGroupDto {
    fn from(group: PermissionMatrixGroup) -> Self {
        Self {
            group_id: group.group_id,
            group_name: group.group_name,
            permissions: group.permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionMatrixResponse {
    pub role_id: String,
    pub role_name: Option<String>,
    pub policy: String,
    pub groups: Vec<PermissionMatrixGroupDto>,
}

impl From<PermissionMatrixReadModel> for PermissionMatrixResponse {
    fn from(matrix: PermissionMatrixReadModel) -> Self {
        Self {
            role_id: matrix.role_id,
            role_name: matrix.role_name,
            policy: matrix.policy.to_string(),
            groups: matrix.groups.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub mod app_state;
pub mod http_handlers;

pub use app_state::AppState;
pub use http_handlers::{
    check_role_permission_handler, get_effective_permissions_handler,
    get_role_hierarchy_handler, get_role_permission_matrix_handler,
    list_effective_permissions_handler, rbac_routes, set_role_permissions_handler,
};
