//! Loading role snapshots from the repositories.

use crate::application::services::ResolutionError;
use crate::domain::consistency::{PermissionCatalog, validate};
use crate::domain::permission::Permission;
use crate::domain::resolution::{EffectivePermissions, ResolutionPolicy, resolve};
use crate::domain::role_graph::RoleGraph;
use crate::infrastructure::{PermissionRepository, RoleRepository};
use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument};

/// Everything one resolution pass reads: the role graph and the permission
/// catalog, taken from the same load.
#[derive(Clone, Debug)]
pub struct RoleGraphSnapshot {
    pub graph: RoleGraph,
    pub catalog: PermissionCatalog,
    pub permissions: Vec<Permission>,
    pub loaded_at: DateTime<Utc>,
}

impl RoleGraphSnapshot {
    pub fn new(graph: RoleGraph, permissions: Vec<Permission>) -> Self {
        Self {
            catalog: PermissionCatalog::from_permissions(&permissions),
            graph,
            permissions,
            loaded_at: Utc::now(),
        }
    }

    /// Resolves, validates against this snapshot's catalog, and shapes the result.
    pub fn effective_permissions(
        &self,
        role_id: &str,
        policy: ResolutionPolicy,
    ) -> EffectivePermissions {
        let resolved = validate(resolve(&self.graph, role_id, policy), &self.catalog);
        EffectivePermissions::from_resolved(resolved, &self.graph)
    }
}

/// Reads the full role and permission catalogs and builds a snapshot.
///
/// Both reads run concurrently. Any repository failure aborts the load; no
/// partial graph is ever returned.
#[instrument(name = "load_role_graph", skip_all)]
pub async fn load_role_graph(
    role_repo: &dyn RoleRepository,
    permission_repo: &dyn PermissionRepository,
) -> Result<RoleGraphSnapshot, ResolutionError> {
    let (roles, permissions) =
        futures::try_join!(role_repo.list_roles(), permission_repo.list_permissions()).map_err(
            |e| {
                error!(error = %e, "Failed to load role graph");
                ResolutionError::StorageUnavailable(e.to_string())
            },
        )?;

    let graph = RoleGraph::from_catalog(&roles, &permissions);
    debug!(roles = graph.len(), permissions = permissions.len(), "Role graph loaded");
    Ok(RoleGraphSnapshot::new(graph, permissions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission::PermissionKey;
    use crate::domain::role::Role;
    use crate::infrastructure::{InMemoryPermissionRepository, InMemoryRoleRepository, RepoResult};
    use async_trait::async_trait;

    struct FailingRoleRepository;

    #[async_trait]
    impl RoleRepository for FailingRoleRepository {
        async fn get_role(&self, _: &str) -> RepoResult<Option<Role>> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn list_roles(&self) -> RepoResult<Vec<Role>> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn set_direct_permissions(&self, _: &str, _: &[String]) -> RepoResult<()> {
            Err(sqlx::Error::PoolTimedOut)
        }
    }

    fn catalog() -> (InMemoryRoleRepository, InMemoryPermissionRepository) {
        let mut guest = Role::new("guest".to_string(), "guest".to_string());
        guest.permissions = vec!["p1".to_string()];
        let permissions = vec![Permission::new(
            "p1".to_string(),
            "read".to_string(),
            "post".to_string(),
        )];
        (
            InMemoryRoleRepository::new(vec![guest]),
            InMemoryPermissionRepository::new(permissions),
        )
    }

    #[tokio::test]
    async fn test_load_role_graph() {
        let (roles, permissions) = catalog();

        let snapshot = load_role_graph(&roles, &permissions).await.unwrap();

        assert_eq!(snapshot.graph.len(), 1);
        assert_eq!(snapshot.catalog.len(), 1);
        let effective = snapshot.effective_permissions("guest", ResolutionPolicy::StrictAncestor);
        assert_eq!(effective.direct, vec![PermissionKey::new("read", "post")]);
    }

    #[tokio::test]
    async fn test_load_role_graph_reports_storage_failure() {
        let (_, permissions) = catalog();

        let result = load_role_graph(&FailingRoleRepository, &permissions).await;

        assert!(matches!(result, Err(ResolutionError::StorageUnavailable(_))));
    }
}
