// Domain layer: entities, value objects and the permission resolution engine
pub mod consistency;
pub mod hierarchy;
pub mod permission;
pub mod permission_group;
pub mod resolution;
pub mod role;
pub mod role_graph;
