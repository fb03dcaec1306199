use crate::{
    commands::Command,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{QuoteLine, RequisitionStatus},
    store::local::LocalStore,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use validator::Validate;

/// Transitions a pending requisition to completed, recording the buyer and
/// the supplier quotes. Completing an already-completed requisition is
/// rejected: the quotes chosen at completion time are final.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CompleteRequisitionCommand {
    #[validate(length(min = 1, message = "requisition id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "buyer is required"))]
    pub buyer: String,
    #[validate(length(min = 1, message = "at least one supplier quote is required"))]
    pub quotes: Vec<SupplierQuoteRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierQuoteRequest {
    pub supplier: String,
    /// Decimal-as-string; the quote total is derived from it
    pub unit_price: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteRequisitionResult {
    pub id: String,
    pub status: RequisitionStatus,
    pub quotes: Vec<QuoteLine>,
}

#[async_trait]
impl Command for CompleteRequisitionCommand {
    type Result = CompleteRequisitionResult;

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
        let unit_prices = self.validate_quotes()?;

        let mut table = store.load().await;
        let requisition = table.find_mut(&self.id).ok_or_else(|| {
            ServiceError::NotFound(format!("requisition {} not found", self.id))
        })?;
        if requisition.status != RequisitionStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "requisition {} is already {}",
                self.id, requisition.status
            )));
        }

        let total_quantity = requisition.total_quantity()?;
        let quotes: Vec<QuoteLine> = self
            .quotes
            .iter()
            .zip(unit_prices)
            .map(|(quote, unit_price)| QuoteLine {
                supplier: quote.supplier.trim().to_string(),
                unit_price: quote.unit_price.trim().to_string(),
                total_price: (unit_price * total_quantity).to_string(),
            })
            .collect();

        requisition.buyer = self.buyer.trim().to_string();
        requisition.quotes = quotes.clone();
        requisition.status = RequisitionStatus::Completed;
        store.save(&table).await?;

        info!(
            requisition_id = %self.id,
            buyer = %self.buyer,
            quotes_count = %quotes.len(),
            "requisition completed"
        );
        event_sender
            .send(Event::RequisitionCompleted(self.id.clone()))
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for completed requisition: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        Ok(CompleteRequisitionResult {
            id: self.id.clone(),
            status: RequisitionStatus::Completed,
            quotes,
        })
    }
}

impl CompleteRequisitionCommand {
    fn validate_quotes(&self) -> Result<Vec<Decimal>, ServiceError> {
        let mut problems = Vec::new();
        let mut unit_prices = Vec::with_capacity(self.quotes.len());
        for (index, quote) in self.quotes.iter().enumerate() {
            if quote.supplier.trim().is_empty() {
                problems.push(format!("quote {} is missing a supplier", index + 1));
            }
            // ';' is the on-disk sub-value separator.
            if quote.supplier.contains(';') {
                problems.push(format!("quote {} supplier must not contain ';'", index + 1));
            }
            match Decimal::from_str(quote.unit_price.trim()) {
                Ok(price) => unit_prices.push(price),
                Err(_) => problems.push(format!(
                    "quote {} has a non-numeric unit price '{}'",
                    index + 1,
                    quote.unit_price
                )),
            }
        }
        if problems.is_empty() {
            Ok(unit_prices)
        } else {
            Err(ServiceError::ValidationError(format!(
                "Invalid input: {}",
                problems.join("; ")
            )))
        }
    }
}
