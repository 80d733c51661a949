use crate::domain::permission::Permission;
use crate::domain::permission_group::PermissionGroup;
use crate::domain::role::Role;
use async_trait::async_trait;
use sqlx::Error;
use tokio::sync::RwLock;
pub type RepoResult<T> = Result<T, Error>;

// Infrastructure layer: database, external services, adapters
pub mod permission_group_repository;
pub mod permission_repository;
pub mod role_repository;
pub use permission_group_repository::PostgresPermissionGroupRepository;
pub use permission_repository::PostgresPermissionRepository;
pub use role_repository::PostgresRoleRepository;

/// Role catalog. Each returned role carries its directly assigned permission ids.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>>;
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;
    /// Replaces the role's direct assignments with `permission_ids`.
    async fn set_direct_permissions(&self, role_id: &str, permission_ids: &[String])
    -> RepoResult<()>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list_permissions(&self) -> RepoResult<Vec<Permission>>;
}

#[async_trait]
pub trait PermissionGroupRepository: Send + Sync {
    async fn list_groups(&self) -> RepoResult<Vec<PermissionGroup>>;
}

pub struct InMemoryRoleRepository {
    pub roles: RwLock<Vec<Role>>,
}

impl InMemoryRoleRepository {
    pub fn new(roles: Vec<Role>) -> Self {
        Self {
            roles: RwLock::new(roles),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>> {
        Ok(self.roles.read().await.iter().find(|r| r.id == role_id).cloned())
    }
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        Ok(self.roles.read().await.clone())
    }
    async fn set_direct_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> RepoResult<()> {
        let mut roles = self.roles.write().await;
        let role = roles
            .iter_mut()
            .find(|r| r.id == role_id)
            .ok_or(Error::RowNotFound)?;
        role.set_permissions(permission_ids.to_vec());
        Ok(())
    }
}

/// Permission catalog kept apart from the role store: deleting a permission
/// leaves any role assignment pointing at it in place.
pub struct InMemoryPermissionRepository {
    pub permissions: RwLock<Vec<Permission>>,
}

impl InMemoryPermissionRepository {
    pub fn new(permissions: Vec<Permission>) -> Self {
        Self {
            permissions: RwLock::new(permissions),
        }
    }

    /// Removes a permission from the catalog, as an external admin would.
    pub async fn delete_permission(&self, permission_id: &str) {
        self.permissions
            .write()
            .await
            .retain(|p| p.id != permission_id);
    }
}

impl Default for InMemoryPermissionRepository {
    fn default() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn list_permissions(&self) -> RepoResult<Vec<Permission>> {
        Ok(self.permissions.read().await.clone())
    }
}

pub struct InMemoryPermissionGroupRepository {
    pub groups: RwLock<Vec<PermissionGroup>>,
}

impl InMemoryPermissionGroupRepository {
    pub fn new(groups: Vec<PermissionGroup>) -> Self {
        Self {
            groups: RwLock::new(groups),
        }
    }
}

impl Default for InMemoryPermissionGroupRepository {
    fn default() -> Self {
        Self::new(vec![])
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionGroupRepository {
    async fn list_groups(&self) -> RepoResult<Vec<PermissionGroup>> {
        Ok(self.groups.read().await.clone())
    }
}
