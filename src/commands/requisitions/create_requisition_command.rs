use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{ItemLine, Requisition, RequisitionStatus},
    store::{id_allocator, local::LocalStore},
};
use async_trait::async_trait;
use chrono::{Local, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRequisitionCommand {
    #[validate(length(min = 1, message = "requester is required"))]
    pub requester: String,
    #[validate(length(min = 1, message = "cost center is required"))]
    pub cost_center: String,
    #[validate(length(min = 1, message = "justification is required"))]
    pub justification: String,
    #[validate(length(min = 1, message = "delivery location is required"))]
    pub delivery_location: String,
    #[validate(length(min = 1, message = "approver is required"))]
    pub approver: String,
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<RequisitionItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequisitionItemRequest {
    pub description: String,
    /// Decimal-as-string, validated before the record is built
    pub quantity: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRequisitionResult {
    pub id: String,
    pub status: RequisitionStatus,
    pub requested_at: String,
}

#[async_trait]
impl Command for CreateRequisitionCommand {
    type Result = CreateRequisitionResult;

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
        self.validate_items()?;

        // Allocate against the freshest snapshot, right before appending.
        let mut table = store.load().await;
        let id = id_allocator::next_id(&table, Utc::now());
        let requested_at = Local::now().format("%d/%m/%Y %H:%M").to_string();

        table.rows.push(Requisition {
            id: id.clone(),
            status: RequisitionStatus::Pending,
            requested_at: requested_at.clone(),
            requester: self.requester.trim().to_string(),
            cost_center: self.cost_center.trim().to_string(),
            justification: self.justification.trim().to_string(),
            delivery_location: self.delivery_location.trim().to_string(),
            approver: self.approver.trim().to_string(),
            items: self
                .items
                .iter()
                .map(|item| ItemLine {
                    description: item.description.trim().to_string(),
                    quantity: item.quantity.trim().to_string(),
                })
                .collect(),
            buyer: String::new(),
            quotes: Vec::new(),
        });
        store.save(&table).await?;

        info!(
            requisition_id = %id,
            requester = %self.requester,
            items_count = %self.items.len(),
            "requisition created"
        );
        event_sender
            .send(Event::RequisitionCreated(id.clone()))
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for created requisition: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        Ok(CreateRequisitionResult {
            id,
            status: RequisitionStatus::Pending,
            requested_at,
        })
    }
}

impl CreateRequisitionCommand {
    fn validate_items(&self) -> Result<(), ServiceError> {
        let mut problems = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                problems.push(format!("item {} is missing a description", index + 1));
            }
            // ';' is the on-disk sub-value separator.
            if item.description.contains(';') {
                problems.push(format!("item {} description must not contain ';'", index + 1));
            }
            if Decimal::from_str(item.quantity.trim()).is_err() {
                problems.push(format!(
                    "item {} has a non-numeric quantity '{}'",
                    index + 1,
                    item.quantity
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationError(format!(
                "Invalid input: {}",
                problems.join("; ")
            )))
        }
    }
}
