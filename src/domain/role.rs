/// Role entity: represents a role in the RBAC system.
#[derive(Clone, Debug, PartialEq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<String>,       // directly assigned permission IDs
    pub parent_role_id: Option<String>, // for role inheritance
}

impl Role {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            permissions: vec![],
            parent_role_id: None,
        }
    }

    /// Adds a permission to the role (if not already present).
    pub fn add_permission(&mut self, permission_id: String) {
        if !self.permissions.contains(&permission_id) {
            self.permissions.push(permission_id);
        }
    }

    /// Replaces the direct assignments, collapsing duplicates in first-seen order.
    pub fn set_permissions(&mut self, permission_ids: Vec<String>) {
        self.permissions.clear();
        for permission_id in permission_ids {
            self.add_permission(permission_id);
        }
    }

    /// Sets the parent role for inheritance.
    pub fn set_parent_role(&mut self, parent_role_id: Option<String>) {
        self.parent_role_id = parent_role_id;
    }
}
