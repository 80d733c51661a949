use super::command_bus::CommandHandler;
use super::commands::SetDirectPermissionsCommand;
use super::events::EventFactory;
use super::services::{PermissionResolutionService, RbacError};
use super::validators::{CommandValidator, SetDirectPermissionsCommandValidator};
use crate::domain::resolution::EffectivePermissions;
use crate::infrastructure::RoleRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, instrument};

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Replaces a role's direct permissions and returns its new effective set.
pub struct SetDirectPermissionsCommandHandler {
    role_repo: Arc<dyn RoleRepository>,
    resolution_service: Arc<PermissionResolutionService>,
    validator: SetDirectPermissionsCommandValidator,
}

impl SetDirectPermissionsCommandHandler {
    pub fn new(
        role_repo: Arc<dyn RoleRepository>,
        resolution_service: Arc<PermissionResolutionService>,
    ) -> Self {
        Self {
            validator: SetDirectPermissionsCommandValidator::new(role_repo.clone()),
            role_repo,
            resolution_service,
        }
    }
}

#[async_trait]
impl CommandHandler<SetDirectPermissionsCommand> for SetDirectPermissionsCommandHandler {
    type Result = EffectivePermissions;
    type Error = RbacError;

    #[instrument(
        name = "set_direct_permissions_command_handler",
        skip(self, command),
        fields(role_id = %command.role_id)
    )]
    async fn handle(
        &self,
        command: SetDirectPermissionsCommand,
    ) -> Result<Self::Result, Self::Error> {
        self.validator.validate(&command).await?;

        let permission_ids = command.unique_permission_ids();
        self.role_repo
            .set_direct_permissions(&command.role_id, &permission_ids)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => RbacError::RoleNotFound(command.role_id.clone()),
                other => {
                    error!(error = %other, "Failed to replace role permissions");
                    RbacError::StorageUnavailable(other.to_string())
                }
            })?;

        let replaced_event =
            EventFactory::role_permissions_replaced(command.role_id.clone(), permission_ids);
        tracing::info!(
            event_id = %replaced_event.event_id,
            permissions = replaced_event.permission_ids.len(),
            "Role permissions replaced event published"
        );

        Ok(self
            .resolution_service
            .resolve_effective_permissions(&command.role_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::CommandFactory;
    use crate::domain::permission::{Permission, PermissionKey};
    use crate::domain::resolution::ResolutionPolicy;
    use crate::domain::role::Role;
    use crate::infrastructure::{InMemoryPermissionRepository, InMemoryRoleRepository};

    fn setup() -> (SetDirectPermissionsCommandHandler, Arc<PermissionResolutionService>) {
        let mut guest = Role::new("guest".to_string(), "guest".to_string());
        guest.permissions = vec!["p1".to_string()];
        let mut user = Role::new("user".to_string(), "user".to_string());
        user.parent_role_id = Some("guest".to_string());

        let role_repo: Arc<dyn RoleRepository> =
            Arc::new(InMemoryRoleRepository::new(vec![guest, user]));
        let permission_repo = Arc::new(InMemoryPermissionRepository::new(vec![
            Permission::new("p1".to_string(), "read".to_string(), "post".to_string()),
            Permission::new("p2".to_string(), "write".to_string(), "comment".to_string()),
        ]));
        let service = Arc::new(PermissionResolutionService::new(
            role_repo.clone(),
            permission_repo,
            ResolutionPolicy::StrictAncestor,
        ));
        (
            SetDirectPermissionsCommandHandler::new(role_repo, service.clone()),
            service,
        )
    }

    #[tokio::test]
    async fn test_set_direct_permissions_returns_new_effective_set() {
        let (handler, _) = setup();

        let command = CommandFactory::set_direct_permissions(
            "user".to_string(),
            vec!["p2".to_string(), "p2".to_string()],
        );
        let effective = handler.handle(command).await.unwrap();

        assert_eq!(effective.direct, vec![PermissionKey::new("write", "comment")]);
        assert_eq!(effective.inherited.len(), 1);
        assert_eq!(effective.inherited[0].key, PermissionKey::new("read", "post"));
    }

    #[tokio::test]
    async fn test_set_direct_permissions_visible_to_next_batch() {
        let (handler, service) = setup();

        let before = service.resolve_all(ResolutionPolicy::StrictAncestor).await.unwrap();
        assert!(!before[0].is_empty());

        let command = CommandFactory::set_direct_permissions("guest".to_string(), vec![]);
        handler.handle(command).await.unwrap();

        let all = service.resolve_all(ResolutionPolicy::StrictAncestor).await.unwrap();
        assert!(all.iter().all(|e| e.is_empty()));
    }

    #[tokio::test]
    async fn test_set_direct_permissions_unknown_role() {
        let (handler, _) = setup();

        let command =
            CommandFactory::set_direct_permissions("ghost".to_string(), vec!["p1".to_string()]);
        let result = handler.handle(command).await;

        assert!(matches!(result, Err(RbacError::RoleNotFound(id)) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_set_direct_permissions_rejects_blank_ids() {
        let (handler, _) = setup();

        let command =
            CommandFactory::set_direct_permissions("user".to_string(), vec!["".to_string()]);
        let result = handler.handle(command).await;

        assert!(matches!(result, Err(RbacError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_permission_ids_are_stored_but_not_resolved() {
        let (handler, _) = setup();

        let command = CommandFactory::set_direct_permissions(
            "user".to_string(),
            vec!["p2".to_string(), "deleted".to_string()],
        );
        let effective = handler.handle(command).await.unwrap();

        assert_eq!(effective.direct, vec![PermissionKey::new("write", "comment")]);
    }
}
