use crate::domain::permission::PermissionKey;
use crate::domain::resolution::ResolutionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for all queries
pub trait Query: Send + Sync {
    fn query_id(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
    fn role_id(&self) -> Option<&str>;
}

/// Query to resolve the effective permissions of one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetEffectivePermissionsQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    /// Falls back to the configured policy when absent.
    pub policy: Option<ResolutionPolicy>,
}

/// Query to resolve every role in one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEffectivePermissionsQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub policy: Option<ResolutionPolicy>,
}

/// Query to check one permission key against a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRolePermissionQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
    pub permission: PermissionKey,
}

/// Query to describe where a role sits in the hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRoleHierarchyQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
}

/// Query to build the grouped grant matrix of a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRolePermissionMatrixQuery {
    pub query_id: String,
    pub timestamp: DateTime<Utc>,
    pub role_id: String,
}

impl Query for GetEffectivePermissionsQuery {
    fn query_id(&self) -> &str {
        &self.query_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn role_id(&self) -> Option<&str> {
        Some(&self.role_id)
    }
}

impl Query for ListEffectivePermissionsQuery {
    fn query_id(&self) -> &str {
        &self.query_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn role_id(&self) -> Option<&str> {
        None
    }
}

impl Query for CheckRolePermissionQuery {
    fn query_id(&self) -> &str {
        &self.query_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn role_id(&self) -> Option<&str> {
        Some(&self.role_id)
    }
}

impl Query for GetRoleHierarchyQuery {
    fn query_id(&self) -> &str {
        &self.query_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn role_id(&self) -> Option<&str> {
        Some(&self.role_id)
    }
}

impl Query for GetRolePermissionMatrixQuery {
    fn query_id(&self) -> &str {
        &self.query_id
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
    fn role_id(&self) -> Option<&str> {
        Some(&self.role_id)
    }
}

/// Query factory for creating queries with proper defaults
pub struct QueryFactory;

impl QueryFactory {
    pub fn get_effective_permissions(
        role_id: String,
        policy: Option<ResolutionPolicy>,
    ) -> GetEffectivePermissionsQuery {
        GetEffectivePermissionsQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            policy,
        }
    }

    pub fn list_effective_permissions(
        policy: Option<ResolutionPolicy>,
    ) -> ListEffectivePermissionsQuery {
        ListEffectivePermissionsQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            policy,
        }
    }

    pub fn check_role_permission(
        role_id: String,
        permission: PermissionKey,
    ) -> CheckRolePermissionQuery {
        CheckRolePermissionQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
            permission,
        }
    }

    pub fn get_role_hierarchy(role_id: String) -> GetRoleHierarchyQuery {
        GetRoleHierarchyQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
        }
    }

    pub fn get_role_permission_matrix(role_id: String) -> GetRolePermissionMatrixQuery {
        GetRolePermissionMatrixQuery {
            query_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            role_id,
        }
    }
}

// ============================================================================
// READ MODELS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionCheckReadModel {
    pub role_id: String,
    pub permission: PermissionKey,
    pub granted: bool,
}

/// A role and its relatives, each list ordered the way the resolver walks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleHierarchyReadModel {
    pub role_id: String,
    pub role_name: String,
    pub parent_role_id: Option<String>,
    pub ancestors: Vec<RoleSummary>,
    pub descendants: Vec<RoleSummary>,
    pub siblings: Vec<RoleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GrantStatus {
    Direct,
    Inherited {
        source_role_id: String,
        source_role_name: String,
    },
    NotGranted,
}

impl GrantStatus {
    pub fn is_granted(&self) -> bool {
        !matches!(self, GrantStatus::NotGranted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionMatrixEntry {
    pub permission_id: String,
    pub key: PermissionKey,
    pub name: String,
    #[serde(flatten)]
    pub status: GrantStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionMatrixGroup {
    pub group_id: String,
    pub group_name: String,
    pub permissions: Vec<PermissionMatrixEntry>,
}

/// Every catalog permission, grouped for display, marked with how the role holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionMatrixReadModel {
    pub role_id: String,
    pub role_name: Option<String>,
    pub policy: ResolutionPolicy,
    pub groups: Vec<PermissionMatrixGroup>,
}

impl PermissionMatrixReadModel {
    pub fn entry(&self, key: &PermissionKey) -> Option<&PermissionMatrixEntry> {
        self.groups
            .iter()
            .flat_map(|g| g.permissions.iter())
            .find(|e| &e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_effective_permissions_query_creation() {
        let query = QueryFactory::get_effective_permissions(
            "role1".to_string(),
            Some(ResolutionPolicy::BroadHierarchy),
        );

        assert_eq!(query.role_id, "role1");
        assert_eq!(query.policy, Some(ResolutionPolicy::BroadHierarchy));
        assert!(!query.query_id.is_empty());
    }

    #[test]
    fn test_query_trait_implementation() {
        let query = QueryFactory::get_role_hierarchy("role1".to_string());

        assert!(!query.query_id().is_empty());
        assert!(query.timestamp() <= Utc::now());
        assert_eq!(query.role_id(), Some("role1"));

        let list = QueryFactory::list_effective_permissions(None);
        assert_eq!(list.role_id(), None);
    }

    #[test]
    fn test_check_role_permission_query_creation() {
        let query = QueryFactory::check_role_permission(
            "role1".to_string(),
            PermissionKey::new("read", "post"),
        );

        assert_eq!(query.permission.to_string(), "read:post");
    }

    #[test]
    fn test_grant_status_serializes_with_status_tag() {
        let entry = PermissionMatrixEntry {
            permission_id: "p1".to_string(),
            key: PermissionKey::new("read", "post"),
            name: "Read posts".to_string(),
            status: GrantStatus::Inherited {
                source_role_id: "r1".to_string(),
                source_role_name: "guest".to_string(),
            },
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["key"], "read:post");
        assert_eq!(json["status"], "inherited");
        assert_eq!(json["source_role_name"], "guest");

        let json = serde_json::to_value(GrantStatus::NotGranted).unwrap();
        assert_eq!(json["status"], "not_granted");
        assert!(!GrantStatus::NotGranted.is_granted());
    }
}
