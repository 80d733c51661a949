// Application layer: use cases, CQRS buses and handlers, the resolution service
pub mod command_bus;
pub mod command_handlers;
pub mod commands;
pub mod events;
pub mod queries;
pub mod query_bus;
pub mod query_handlers;
pub mod role_graph_loader;
pub mod services;
pub mod validators;
