use crate::application::commands::SetDirectPermissionsCommand;
use crate::infrastructure::RoleRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    FieldValidation { field: String, message: String },
    RoleNotFound(String),
    StorageUnavailable(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::FieldValidation { field, message } => {
                write!(f, "Field validation failed: {field} - {message}")
            }
            ValidationError::RoleNotFound(role_id) => write!(f, "Role not found: {role_id}"),
            ValidationError::StorageUnavailable(message) => {
                write!(f, "Storage unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Base trait for command validation
#[async_trait]
pub trait CommandValidator<C>: Send + Sync {
    async fn validate(&self, command: &C) -> Result<(), ValidationError>;
}

/// Role command validation rules
pub struct RoleCommandValidator;

impl RoleCommandValidator {
    pub fn validate_role_id(role_id: &str) -> Result<(), ValidationError> {
        if role_id.trim().is_empty() {
            return Err(ValidationError::FieldValidation {
                field: "role_id".to_string(),
                message: "Role ID cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Permission ids must be non-blank. Unknown ids are accepted here.
    pub fn validate_permission_ids(permission_ids: &[String]) -> Result<(), ValidationError> {
        if let Some(index) = permission_ids.iter().position(|id| id.trim().is_empty()) {
            return Err(ValidationError::FieldValidation {
                field: format!("permission_ids[{index}]"),
                message: "Permission ID cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Set direct permissions command validation
pub struct SetDirectPermissionsCommandValidator {
    role_repo: Arc<dyn RoleRepository>,
}

impl SetDirectPermissionsCommandValidator {
    pub fn new(role_repo: Arc<dyn RoleRepository>) -> Self {
        Self { role_repo }
    }
}

#[async_trait]
impl CommandValidator<SetDirectPermissionsCommand> for SetDirectPermissionsCommandValidator {
    async fn validate(&self, command: &SetDirectPermissionsCommand) -> Result<(), ValidationError> {
        RoleCommandValidator::validate_role_id(&command.role_id)?;
        RoleCommandValidator::validate_permission_ids(&command.permission_ids)?;

        let role = self.role_repo.get_role(&command.role_id).await.map_err(|e| {
            error!(error = %e, role_id = %command.role_id, "Failed to look up role");
            ValidationError::StorageUnavailable(e.to_string())
        })?;
        if role.is_none() {
            return Err(ValidationError::RoleNotFound(command.role_id.clone()));
        }

        Ok(())
    }
}
