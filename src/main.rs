use axum::Router;
use dotenvy::dotenv;
use role_hierarchy_service::interface::{
    EffectivePermissionsListResponse, EffectivePermissionsResponse, ErrorResponse,
    InheritedPermissionDto, PermissionCheckResponse, PermissionMatrixEntryDto,
    PermissionMatrixGroupDto, PermissionMatrixResponse, RoleHierarchyResponse, RoleSummaryDto,
    SetRolePermissionsRequest, rbac_routes,
};
use role_hierarchy_service::{AppConfig, AppStateBuilder};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        role_hierarchy_service::interface::http_handlers::list_effective_permissions_handler,
        role_hierarchy_service::interface::http_handlers::get_effective_permissions_handler,
        role_hierarchy_service::interface::http_handlers::set_role_permissions_handler,
        role_hierarchy_service::interface::http_handlers::check_role_permission_handler,
        role_hierarchy_service::interface::http_handlers::get_role_hierarchy_handler,
        role_hierarchy_service::interface::http_handlers::get_role_permission_matrix_handler,
    ),
    components(schemas(
        SetRolePermissionsRequest, EffectivePermissionsResponse, EffectivePermissionsListResponse,
        InheritedPermissionDto, PermissionCheckResponse, RoleSummaryDto, RoleHierarchyResponse,
        PermissionMatrixEntryDto, PermissionMatrixGroupDto, PermissionMatrixResponse, ErrorResponse
    )),
    tags(
        (name = "RBAC", description = "Role hierarchy and effective permission endpoints")
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Failed to parse environment variables");

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to DB");

    let app_state = AppStateBuilder::new()
        .with_pool(pool)
        .with_config(config.clone())
        .build()
        .await
        .expect("Failed to setup application");

    let http_addr = config.http_address();
    let openapi = ApiDoc::openapi();

    let app = Router::new()
        .nest("/v1", rbac_routes())
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", openapi))
        .with_state(app_state);

    let listener = TcpListener::bind(&http_addr).await.expect("Failed to bind");
    tracing::info!(address = %http_addr, policy = %config.resolution_policy, "HTTP server running");
    axum::serve(listener, app).await.expect("HTTP server failed");
}
