use crate::{errors::ServiceError, events::EventSender, store::local::LocalStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Command trait for implementing the Command Pattern
///
/// Each business operation is encapsulated in a single object that can be
/// validated, executed against the store, and produce events.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    /// Execute the command with the given dependencies
    ///
    /// # Arguments
    /// * `store` - Local table store for persistence operations
    /// * `event_sender` - Channel to publish domain events
    async fn execute(
        &self,
        store: Arc<LocalStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}

pub mod requisitions;
