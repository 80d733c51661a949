use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync {
    fn event_id(&self) -> &str;
    fn aggregate_id(&self) -> &str;
    fn occurred_at(&self) -> DateTime<Utc>;
    fn event_type(&self) -> &str;
}

/// A role's direct permission assignments were replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermissionsReplacedEvent {
    pub event_id: String,
    pub aggregate_id: String,
    pub occurred_at: DateTime<Utc>,
    pub role_id: String,
    pub permission_ids: Vec<String>,
}

impl DomainEvent for RolePermissionsReplacedEvent {
    fn event_id(&self) -> &str {
        &self.event_id
    }
    fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &str {
        "RolePermissionsReplaced"
    }
}

pub struct EventFactory;

impl EventFactory {
    pub fn role_permissions_replaced(
        role_id: String,
        permission_ids: Vec<String>,
    ) -> RolePermissionsReplacedEvent {
        RolePermissionsReplacedEvent {
            event_id: Uuid::new_v4().to_string(),
            aggregate_id: role_id.clone(),
            occurred_at: Utc::now(),
            role_id,
            permission_ids,
        }
    }
}
