use crate::domain::permission_group::PermissionGroup;
use crate::infrastructure::PermissionGroupRepository;
use crate::infrastructure::RepoResult;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct PostgresPermissionGroupRepository {
    pub pool: PgPool,
}

impl PostgresPermissionGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionGroupRepository for PostgresPermissionGroupRepository {
    #[instrument]
    async fn list_groups(&self) -> RepoResult<Vec<PermissionGroup>> {
        sqlx::query_as::<_, PermissionGroup>(
            r#"
            SELECT id, name, description
            FROM permission_groups
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
