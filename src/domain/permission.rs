use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Permission value object: an `(action, resource)` grant registered in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: String,
    pub action: String,
    pub resource: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub group_id: Option<String>,
}

impl Permission {
    /// Creates a new Permission value object.
    pub fn new(id: String, action: String, resource: String) -> Self {
        Self {
            id,
            action,
            resource,
            name: None,
            description: None,
            group_id: None,
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_group(mut self, group_id: String) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// The semantic identity of this permission.
    pub fn key(&self) -> PermissionKey {
        PermissionKey::new(self.action.clone(), self.resource.clone())
    }

    /// Display name, falling back to `action:resource` when none was given.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.key().to_string())
    }
}

/// Identity of a permission during resolution. Two permissions with the same
/// action and resource are the same grant regardless of their storage ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey {
    action: String,
    resource: String,
}

impl PermissionKey {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            resource: resource.into(),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid permission key '{0}': expected 'action:resource'")]
pub struct ParsePermissionKeyError(pub String);

impl FromStr for PermissionKey {
    type Err = ParsePermissionKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((action, resource)) if !action.is_empty() && !resource.is_empty() => {
                Ok(PermissionKey::new(action, resource))
            }
            _ => Err(ParsePermissionKeyError(s.to_string())),
        }
    }
}

impl Serialize for PermissionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PermissionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
