pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod test_utils;

use application::{
    command_bus::CommandBus,
    command_handlers::SetDirectPermissionsCommandHandler,
    commands::SetDirectPermissionsCommand,
    queries::{
        CheckRolePermissionQuery, GetEffectivePermissionsQuery, GetRoleHierarchyQuery,
        GetRolePermissionMatrixQuery, ListEffectivePermissionsQuery,
    },
    query_bus::QueryBus,
    query_handlers::{
        CheckRolePermissionQueryHandler, GetEffectivePermissionsQueryHandler,
        GetRoleHierarchyQueryHandler, GetRolePermissionMatrixQueryHandler,
        ListEffectivePermissionsQueryHandler,
    },
    services::PermissionResolutionService,
};
use domain::resolution::ResolutionPolicy;
use infrastructure::{
    PermissionGroupRepository, PermissionRepository, PostgresPermissionGroupRepository,
    PostgresPermissionRepository, PostgresRoleRepository, RoleRepository,
};
use interface::AppState;
use sqlx::PgPool;
use std::sync::Arc;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Application configuration with all environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub http_host: String,
    pub http_port: u16,
    pub resolution_policy: ResolutionPolicy,
}

impl AppConfig {
    /// Creates a new AppConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?;

        let http_host = lookup("HTTP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let http_port = match lookup("HTTP_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid(format!("HTTP_PORT '{port}' is not a port")))?,
            None => 8080,
        };
        let resolution_policy = match lookup("RESOLUTION_POLICY") {
            Some(policy) => policy
                .parse::<ResolutionPolicy>()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            None => ResolutionPolicy::default(),
        };

        Ok(AppConfig {
            database_url,
            http_host,
            http_port,
            resolution_policy,
        })
    }

    /// Creates an AppConfig with custom values (useful for testing)
    pub fn new(database_url: String, http_host: String, http_port: u16) -> Self {
        Self {
            database_url,
            http_host,
            http_port,
            resolution_policy: ResolutionPolicy::default(),
        }
    }

    pub fn with_resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// Creates the HTTP address string from host and port
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingRequired(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// APPLICATION BUILDER
// ============================================================================

#[derive(Clone)]
struct Repositories {
    role_repo: Arc<dyn RoleRepository>,
    permission_repo: Arc<dyn PermissionRepository>,
    permission_group_repo: Arc<dyn PermissionGroupRepository>,
}

/// Builder for creating application state with better testability
#[derive(Default)]
pub struct AppStateBuilder {
    pool: Option<PgPool>,
    config: Option<AppConfig>,
    repositories: Option<Repositories>,
}

impl AppStateBuilder {
    /// Creates a new AppStateBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database pool; Postgres repositories are built from it
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Uses the given repositories instead of building Postgres ones
    pub fn with_repositories(
        mut self,
        role_repo: Arc<dyn RoleRepository>,
        permission_repo: Arc<dyn PermissionRepository>,
        permission_group_repo: Arc<dyn PermissionGroupRepository>,
    ) -> Self {
        self.repositories = Some(Repositories {
            role_repo,
            permission_repo,
            permission_group_repo,
        });
        self
    }

    /// Sets the configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the application state
    pub async fn build(self) -> Result<Arc<AppState>, AppError> {
        let Repositories {
            role_repo,
            permission_repo,
            permission_group_repo,
        } = match self.repositories {
            Some(repositories) => repositories,
            None => {
                let pool = self.pool.ok_or(AppError::MissingPool)?;
                Repositories {
                    role_repo: Arc::new(PostgresRoleRepository::new(pool.clone())),
                    permission_repo: Arc::new(PostgresPermissionRepository::new(pool.clone())),
                    permission_group_repo: Arc::new(PostgresPermissionGroupRepository::new(pool)),
                }
            }
        };
        let policy = self
            .config
            .map(|config| config.resolution_policy)
            .unwrap_or_default();

        // Create services
        let resolution_service = Arc::new(PermissionResolutionService::new(
            role_repo.clone(),
            permission_repo.clone(),
            policy,
        ));

        // Create CQRS buses
        let command_bus = Arc::new(CommandBus::new());
        let query_bus = Arc::new(QueryBus::new());

        Self::register_command_handlers(&command_bus, &role_repo, &resolution_service).await;
        Self::register_query_handlers(&query_bus, &resolution_service, &permission_group_repo)
            .await;

        tracing::info!(%policy, "Application state initialized");
        Ok(Arc::new(AppState {
            role_repo,
            permission_repo,
            permission_group_repo,
            resolution_service,
            command_bus,
            query_bus,
        }))
    }

    /// Registers all command handlers
    async fn register_command_handlers(
        command_bus: &Arc<CommandBus>,
        role_repo: &Arc<dyn RoleRepository>,
        resolution_service: &Arc<PermissionResolutionService>,
    ) {
        command_bus
            .register_handler::<SetDirectPermissionsCommand, _>(
                SetDirectPermissionsCommandHandler::new(
                    role_repo.clone(),
                    resolution_service.clone(),
                ),
            )
            .await;
    }

    /// Registers all query handlers
    async fn register_query_handlers(
        query_bus: &Arc<QueryBus>,
        resolution_service: &Arc<PermissionResolutionService>,
        permission_group_repo: &Arc<dyn PermissionGroupRepository>,
    ) {
        query_bus
            .register_handler::<GetEffectivePermissionsQuery, _>(
                GetEffectivePermissionsQueryHandler::new(resolution_service.clone()),
            )
            .await;

        query_bus
            .register_handler::<ListEffectivePermissionsQuery, _>(
                ListEffectivePermissionsQueryHandler::new(resolution_service.clone()),
            )
            .await;

        query_bus
            .register_handler::<CheckRolePermissionQuery, _>(CheckRolePermissionQueryHandler::new(
                resolution_service.clone(),
            ))
            .await;

        query_bus
            .register_handler::<GetRoleHierarchyQuery, _>(GetRoleHierarchyQueryHandler::new(
                resolution_service.clone(),
            ))
            .await;

        query_bus
            .register_handler::<GetRolePermissionMatrixQuery, _>(
                GetRolePermissionMatrixQueryHandler::new(
                    resolution_service.clone(),
                    permission_group_repo.clone(),
                ),
            )
            .await;
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Missing database pool")]
    MissingPool,
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
