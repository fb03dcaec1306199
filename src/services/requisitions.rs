//! Workflow entry points consumed by the presentation layer. Every method
//! returns a value or a typed `ServiceError`; nothing panics across this
//! boundary.

use std::sync::Arc;

use tracing::instrument;

use crate::{
    commands::{
        requisitions::{
            CompleteRequisitionCommand, CompleteRequisitionResult, CreateRequisitionCommand,
            CreateRequisitionResult, DeleteRequisitionCommand,
        },
        Command,
    },
    errors::ServiceError,
    events::EventSender,
    models::{Requisition, RequisitionTable},
    queries::requisitions::{search, RequisitionFilters},
    store::local::LocalStore,
};

/// Service for managing purchase requisitions
#[derive(Clone)]
pub struct RequisitionService {
    store: Arc<LocalStore>,
    event_sender: Arc<EventSender>,
}

impl RequisitionService {
    /// Creates a new requisition service instance
    pub fn new(store: Arc<LocalStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Creates a new requisition with a freshly allocated id
    #[instrument(skip(self))]
    pub async fn create_requisition(
        &self,
        command: CreateRequisitionCommand,
    ) -> Result<CreateRequisitionResult, ServiceError> {
        command
            .execute(self.store.clone(), self.event_sender.clone())
            .await
    }

    /// Completes a pending requisition with buyer and supplier quotes
    #[instrument(skip(self))]
    pub async fn complete_requisition(
        &self,
        command: CompleteRequisitionCommand,
    ) -> Result<CompleteRequisitionResult, ServiceError> {
        command
            .execute(self.store.clone(), self.event_sender.clone())
            .await
    }

    /// Removes a requisition row
    #[instrument(skip(self))]
    pub async fn delete_requisition(&self, id: &str) -> Result<(), ServiceError> {
        DeleteRequisitionCommand { id: id.to_string() }
            .execute(self.store.clone(), self.event_sender.clone())
            .await
    }

    /// Filters the current table snapshot; never mutates
    #[instrument(skip(self))]
    pub async fn search_requisitions(&self, filters: &RequisitionFilters) -> Vec<Requisition> {
        let table = self.store.load().await;
        search(&table, filters)
    }

    /// Loads the full table for display
    #[instrument(skip(self))]
    pub async fn load_requisitions(&self) -> RequisitionTable {
        self.store.load().await
    }
}
