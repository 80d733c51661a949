use crate::application::commands::CommandFactory;
use crate::application::queries::{
    PermissionCheckReadModel, PermissionMatrixReadModel, QueryFactory, RoleHierarchyReadModel,
};
use crate::application::services::RbacError;
use crate::domain::permission::PermissionKey;
use crate::domain::resolution::{EffectivePermissions, ResolutionPolicy};
use crate::interface::app_state::AppState;
use crate::interface::{
    EffectivePermissionsListResponse, EffectivePermissionsResponse, ErrorResponse,
    PermissionCheckParams, PermissionCheckResponse, PermissionMatrixResponse, PolicyParams,
    RoleHierarchyResponse, SetRolePermissionsRequest,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use tracing::{error, warn};

/// RBAC routes, relative to the API version prefix.
pub fn rbac_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/rbac/roles/effective-permissions",
            get(list_effective_permissions_handler),
        )
        .route(
            "/rbac/roles/{role_id}/effective-permissions",
            get(get_effective_permissions_handler),
        )
        .route(
            "/rbac/roles/{role_id}/permissions",
            put(set_role_permissions_handler),
        )
        .route(
            "/rbac/roles/{role_id}/permissions/check",
            get(check_role_permission_handler),
        )
        .route(
            "/rbac/roles/{role_id}/hierarchy",
            get(get_role_hierarchy_handler),
        )
        .route(
            "/rbac/roles/{role_id}/permission-matrix",
            get(get_role_permission_matrix_handler),
        )
}

fn error_body(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn rbac_error_response(error: &RbacError) -> Response {
    let status = match error {
        RbacError::RoleNotFound(_) => StatusCode::NOT_FOUND,
        RbacError::InvalidPermissionKey(_) | RbacError::Validation(_) => StatusCode::BAD_REQUEST,
        RbacError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_body(status, error.to_string())
}

fn dispatch_error_response(error: Box<dyn std::error::Error + Send + Sync>) -> Response {
    match error.downcast::<RbacError>() {
        Ok(rbac_error) => rbac_error_response(&rbac_error),
        Err(other) => {
            error!(error = %other, "Unhandled dispatch error");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Unboxes a handler result of type `T` and renders it as `R`.
fn respond<T, R>(result: Box<dyn Any + Send + Sync>) -> Response
where
    T: 'static,
    R: From<T> + Serialize,
{
    match result.downcast::<T>() {
        Ok(value) => Json(R::from(*value)).into_response(),
        Err(_) => {
            error!(
                expected = std::any::type_name::<T>(),
                "Unexpected handler result type"
            );
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

fn parse_policy(params: &PolicyParams) -> Result<Option<ResolutionPolicy>, Response> {
    params
        .policy
        .as_deref()
        .map(str::parse::<ResolutionPolicy>)
        .transpose()
        .map_err(|e| error_body(StatusCode::BAD_REQUEST, e.to_string()))
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/rbac/roles/effective-permissions",
    params(PolicyParams),
    responses(
        (status = 200, description = "Effective permissions of every role", body = EffectivePermissionsListResponse),
        (status = 400, description = "Unknown policy", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Resolve the effective permissions of every role from one shared snapshot."
)]
pub async fn list_effective_permissions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PolicyParams>,
) -> Response {
    let policy = match parse_policy(&params) {
        Ok(policy) => policy,
        Err(response) => return response,
    };

    match state
        .query_bus
        .execute(QueryFactory::list_effective_permissions(policy))
        .await
    {
        Ok(result) => respond::<Vec<EffectivePermissions>, EffectivePermissionsListResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/rbac/roles/{role_id}/effective-permissions",
    params(
        ("role_id" = String, Path, description = "Role id"),
        PolicyParams,
    ),
    responses(
        (status = 200, description = "Effective permissions of the role; empty for an unknown role", body = EffectivePermissionsResponse),
        (status = 400, description = "Unknown policy", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Resolve the direct and inherited permissions of a role."
)]
pub async fn get_effective_permissions_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    Query(params): Query<PolicyParams>,
) -> Response {
    let policy = match parse_policy(&params) {
        Ok(policy) => policy,
        Err(response) => return response,
    };

    match state
        .query_bus
        .execute(QueryFactory::get_effective_permissions(role_id, policy))
        .await
    {
        Ok(result) => respond::<EffectivePermissions, EffectivePermissionsResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    put,
    path = "/v1/rbac/roles/{role_id}/permissions",
    params(("role_id" = String, Path, description = "Role id")),
    request_body = SetRolePermissionsRequest,
    responses(
        (status = 200, description = "Direct permissions replaced; body is the new effective set", body = EffectivePermissionsResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Replace the permissions assigned directly to a role."
)]
pub async fn set_role_permissions_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    payload: Result<Json<SetRolePermissionsRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected role permissions payload");
            return error_body(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let command = CommandFactory::set_direct_permissions(role_id, payload.permission_ids);
    match state.command_bus.execute(command).await {
        Ok(result) => respond::<EffectivePermissions, EffectivePermissionsResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/rbac/roles/{role_id}/permissions/check",
    params(
        ("role_id" = String, Path, description = "Role id"),
        PermissionCheckParams,
    ),
    responses(
        (status = 200, description = "Whether the role holds the permission", body = PermissionCheckResponse),
        (status = 400, description = "Malformed permission key", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Check one `action:resource` key against a role's effective permissions."
)]
pub async fn check_role_permission_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    params: Result<Query<PermissionCheckParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return error_body(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let permission = match params.permission.parse::<PermissionKey>() {
        Ok(key) => key,
        Err(e) => return rbac_error_response(&RbacError::from(e)),
    };

    match state
        .query_bus
        .execute(QueryFactory::check_role_permission(role_id, permission))
        .await
    {
        Ok(result) => respond::<PermissionCheckReadModel, PermissionCheckResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/rbac/roles/{role_id}/hierarchy",
    params(("role_id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Ancestors, descendants and siblings of the role", body = RoleHierarchyResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Describe where a role sits in the hierarchy."
)]
pub async fn get_role_hierarchy_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> Response {
    match state
        .query_bus
        .execute(QueryFactory::get_role_hierarchy(role_id))
        .await
    {
        Ok(result) => respond::<RoleHierarchyReadModel, RoleHierarchyResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}

#[axum::debug_handler]
#[utoipa::path(
    get,
    path = "/v1/rbac/roles/{role_id}/permission-matrix",
    params(("role_id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Every permission, grouped, with the role's grant status", body = PermissionMatrixResponse),
        (status = 404, description = "Role not found", body = ErrorResponse),
        (status = 503, description = "Role or permission catalog unavailable", body = ErrorResponse),
    ),
    tags = ["RBAC"],
    description = "Grouped permission matrix used by the role management screen."
)]
pub async fn get_role_permission_matrix_handler(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
) -> Response {
    match state
        .query_bus
        .execute(QueryFactory::get_role_permission_matrix(role_id))
        .await
    {
        Ok(result) => respond::<PermissionMatrixReadModel, PermissionMatrixResponse>(result),
        Err(e) => dispatch_error_response(e),
    }
}
