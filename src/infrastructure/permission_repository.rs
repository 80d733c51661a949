use crate::domain::permission::Permission;
use crate::infrastructure::PermissionRepository;
use crate::infrastructure::RepoResult;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, instrument};

#[derive(Debug)]
pub struct PostgresPermissionRepository {
    pub pool: PgPool,
}

impl PostgresPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PostgresPermissionRepository {
    #[instrument]
    async fn list_permissions(&self) -> RepoResult<Vec<Permission>> {
        let res = sqlx::query_as::<_, Permission>(
            "SELECT id, action, resource, name, description, group_id FROM permissions ORDER BY action, resource",
        )
        .fetch_all(&self.pool)
        .await;
        if let Err(ref e) = res {
            error!(error = %e, "Failed to list permissions");
        }
        res
    }
}
