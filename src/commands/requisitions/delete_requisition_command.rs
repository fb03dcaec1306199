use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    store::local::LocalStore,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteRequisitionCommand {
    #[validate(length(min = 1, message = "requisition id is required"))]
    pub id: String,
}

#[async_trait]
impl Command for DeleteRequisitionCommand {
    type Result = ();

    #[instrument(skip(self, store, event_sender))]
    async fn execute(
        &self,
        store: Arc<LocalStore>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            let msg = format!("Invalid input: {}", e);
            error!("{}", msg);
            ServiceError::ValidationError(msg)
        })?;

        let mut table = store.load().await;
        if table.remove(&self.id).is_none() {
            return Err(ServiceError::NotFound(format!(
                "requisition {} not found",
                self.id
            )));
        }
        store.save(&table).await?;

        info!(requisition_id = %self.id, "requisition deleted");
        event_sender
            .send(Event::RequisitionDeleted(self.id.clone()))
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for deleted requisition: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })
    }
}
