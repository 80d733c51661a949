use crate::application::command_bus::CommandBus;
use crate::application::query_bus::QueryBus;
use crate::application::services::PermissionResolutionService;
use crate::infrastructure::{PermissionGroupRepository, PermissionRepository, RoleRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub role_repo: Arc<dyn RoleRepository>,
    pub permission_repo: Arc<dyn PermissionRepository>,
    pub permission_group_repo: Arc<dyn PermissionGroupRepository>,
    pub resolution_service: Arc<PermissionResolutionService>,
    pub command_bus: Arc<CommandBus>,
    pub query_bus: Arc<QueryBus>,
}
