use serde::{Deserialize, Serialize};

/// PermissionGroup: categorization of permissions for display. Resolution never reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PermissionGroup {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl PermissionGroup {
    /// Id of the synthetic bucket holding permissions without a known group.
    pub const UNGROUPED_ID: &'static str = "ungrouped";

    /// Creates a new PermissionGroup.
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
        }
    }

    /// Creates a new PermissionGroup with description.
    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn ungrouped() -> Self {
        Self::new(Self::UNGROUPED_ID.to_string(), "Ungrouped".to_string())
    }
}
