use crate::domain::role::Role;
use crate::infrastructure::RepoResult;
use crate::infrastructure::RoleRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{error, instrument};

#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pub pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn permission_ids_for(&self, role_id: &str) -> RepoResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    name: String,
    parent_role_id: Option<String>,
}

impl RoleRow {
    fn into_role(self, permissions: Vec<String>) -> Role {
        Role {
            id: self.id,
            name: self.name,
            permissions,
            parent_role_id: self.parent_role_id,
        }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    #[instrument]
    async fn get_role(&self, role_id: &str) -> RepoResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, parent_role_id FROM roles WHERE id = $1",
        )
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to get role");
            e
        })?;

        match row {
            Some(row) => {
                let permissions = self.permission_ids_for(role_id).await?;
                Ok(Some(row.into_role(permissions)))
            }
            None => Ok(None),
        }
    }

    #[instrument]
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, parent_role_id FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list roles");
            e
        })?;

        let links = sqlx::query_as::<_, (String, String)>(
            "SELECT role_id, permission_id FROM role_permissions ORDER BY role_id, permission_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list role permissions");
            e
        })?;

        let mut by_role: HashMap<String, Vec<String>> = HashMap::new();
        for (role_id, permission_id) in links {
            by_role.entry(role_id).or_default().push(permission_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let permissions = by_role.remove(&row.id).unwrap_or_default();
                row.into_role(permissions)
            })
            .collect())
    }

    #[instrument]
    async fn set_direct_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for permission_id in permission_ids {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(error = %e, permission_id = %permission_id, "Failed to assign permission");
                e
            })?;
        }

        tx.commit().await?;
        Ok(())
    }
}
