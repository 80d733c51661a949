use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to replace the directly assigned permissions of a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDirectPermissionsCommand {
    pub command_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    pub permission_ids: Vec<String>,
}

impl SetDirectPermissionsCommand {
    /// Permission ids with duplicates collapsed, first occurrence kept.
    pub fn unique_permission_ids(&self) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(self.permission_ids.len());
        for id in &self.permission_ids {
            if !unique.contains(id) {
                unique.push(id.clone());
            }
        }
        unique
    }
}

/// Command factory for creating commands with proper defaults
pub struct CommandFactory;

impl CommandFactory {
    pub fn set_direct_permissions(
        role_id: String,
        permission_ids: Vec<String>,
    ) -> SetDirectPermissionsCommand {
        SetDirectPermissionsCommand {
            command_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            permission_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_direct_permissions_command_creation() {
        let command = CommandFactory::set_direct_permissions(
            "role1".to_string(),
            vec!["p1".to_string(), "p2".to_string()],
        );

        assert_eq!(command.role_id, "role1");
        assert_eq!(command.permission_ids.len(), 2);
        assert!(!command.command_id.is_empty());
    }

    #[test]
    fn test_unique_permission_ids_keeps_first_occurrence() {
        let command = CommandFactory::set_direct_permissions(
            "role1".to_string(),
            vec![
                "p2".to_string(),
                "p1".to_string(),
                "p2".to_string(),
                "p3".to_string(),
            ],
        );

        assert_eq!(command.unique_permission_ids(), vec!["p2", "p1", "p3"]);
    }
}
