use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type BoxedResult = Result<Box<dyn Any + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>;

/// Command handler trait
#[async_trait]
pub trait CommandHandler<C>: Send + Sync {
    type Result: Send + Sync;
    type Error: std::error::Error + Send + Sync;

    async fn handle(&self, command: C) -> Result<Self::Result, Self::Error>;
}

/// Command bus for handling commands
pub struct CommandBus {
    handlers: Arc<RwLock<HashMap<TypeId, Box<dyn CommandHandlerBox + Send + Sync>>>>,
}

/// Boxed command handler for type erasure
#[async_trait]
trait CommandHandlerBox: Send + Sync {
    async fn handle(&self, command: Box<dyn Any + Send + Sync>) -> BoxedResult;
}

impl CommandBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a command handler
    pub async fn register_handler<C, H>(&self, handler: H)
    where
        C: 'static + Send + Sync,
        H: CommandHandler<C> + 'static + Send + Sync,
    {
        let boxed_handler = Box::new(HandlerWrapper::new(handler));
        let type_id = TypeId::of::<C>();

        let mut handlers = self.handlers.write().await;
        handlers.insert(type_id, boxed_handler);
    }

    /// Execute a command
    pub async fn execute<C>(&self, command: C) -> BoxedResult
    where
        C: 'static + Send + Sync,
    {
        let type_id = TypeId::of::<C>();
        let handlers = self.handlers.read().await;

        if let Some(handler) = handlers.get(&type_id) {
            let boxed_command = Box::new(command);
            handler.handle(boxed_command).await
        } else {
            Err(format!("No handler registered for command type: {type_id:?}").into())
        }
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapper for command handlers to enable type erasure
struct HandlerWrapper<C, H> {
    handler: H,
    _phantom: std::marker::PhantomData<C>,
}

impl<C, H> HandlerWrapper<C, H> {
    fn new(handler: H) -> Self {
        Self {
            handler,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<C, H> CommandHandlerBox for HandlerWrapper<C, H>
where
    C: 'static + Send + Sync,
    H: CommandHandler<C> + Send + Sync,
    <H as CommandHandler<C>>::Result: 'static,
    <H as CommandHandler<C>>::Error: 'static,
{
    async fn handle(&self, command: Box<dyn Any + Send + Sync>) -> BoxedResult {
        let command = command
            .downcast::<C>()
            .map_err(|_| "Failed to downcast command")?;

        let result = self
            .handler
            .handle(*command)
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        Ok(Box::new(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::{CommandFactory, SetDirectPermissionsCommand};
    use crate::application::validators::ValidationError;

    // Echoes the deduplicated ids back, rejecting one reserved role id.
    struct EchoHandler;

    #[async_trait]
    impl CommandHandler<SetDirectPermissionsCommand> for EchoHandler {
        type Result = Vec<String>;
        type Error = ValidationError;

        async fn handle(
            &self,
            command: SetDirectPermissionsCommand,
        ) -> Result<Self::Result, Self::Error> {
            if command.role_id == "locked" {
                return Err(ValidationError::RoleNotFound(command.role_id));
            }
            Ok(command.unique_permission_ids())
        }
    }

    #[tokio::test]
    async fn test_command_bus_registration_and_execution() {
        let command_bus = CommandBus::new();
        command_bus.register_handler(EchoHandler).await;

        let command = CommandFactory::set_direct_permissions(
            "role1".to_string(),
            vec!["p1".to_string(), "p1".to_string()],
        );
        let result = command_bus.execute(command).await.unwrap();

        let ids = result.downcast::<Vec<String>>().unwrap();
        assert_eq!(*ids, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_command_bus_propagates_handler_error() {
        let command_bus = CommandBus::new();
        command_bus.register_handler(EchoHandler).await;

        let command = CommandFactory::set_direct_permissions("locked".to_string(), vec![]);
        let err = command_bus.execute(command).await.unwrap_err();

        let err = err.downcast::<ValidationError>().unwrap();
        assert_eq!(*err, ValidationError::RoleNotFound("locked".to_string()));
    }

    #[tokio::test]
    async fn test_command_bus_no_handler() {
        let command_bus = CommandBus::new();

        let command = CommandFactory::set_direct_permissions("role1".to_string(), vec![]);

        let result = command_bus.execute(command).await;
        assert!(result.is_err());
    }
}
