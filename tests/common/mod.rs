use std::path::PathBuf;
use std::sync::Arc;

use requisition_store::events;
use requisition_store::prelude::*;
use requisition_store::store::local::DEFAULT_MAX_TABLE_BYTES;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub struct TestContext {
    pub service: RequisitionService,
    pub store: Arc<LocalStore>,
    pub table_path: PathBuf,
    /// Kept alive so event sends never fail.
    pub events: mpsc::Receiver<Event>,
    _dir: TempDir,
}

pub fn setup() -> TestContext {
    let dir = tempfile::tempdir().expect("tempdir");
    let table_path = dir.path().join("compras.csv");
    let backups = BackupManager::new(dir.path().join("backups"), 5);
    let (sender, receiver) = events::channel(64);
    let store = Arc::new(LocalStore::new(
        &table_path,
        DEFAULT_MAX_TABLE_BYTES,
        backups,
        Some(sender.clone()),
    ));
    let service = RequisitionService::new(store.clone(), Arc::new(sender));
    TestContext {
        service,
        store,
        table_path,
        events: receiver,
        _dir: dir,
    }
}

pub fn create_command(requester: &str, items: Vec<(&str, &str)>) -> CreateRequisitionCommand {
    CreateRequisitionCommand {
        requester: requester.to_string(),
        cost_center: "CC1".to_string(),
        justification: "reposição de estoque".to_string(),
        delivery_location: "Matriz".to_string(),
        approver: "Bob".to_string(),
        items: items
            .into_iter()
            .map(|(description, quantity)| RequisitionItemRequest {
                description: description.to_string(),
                quantity: quantity.to_string(),
            })
            .collect(),
    }
}

pub fn complete_command(id: &str, buyer: &str, quotes: Vec<(&str, &str)>) -> CompleteRequisitionCommand {
    CompleteRequisitionCommand {
        id: id.to_string(),
        buyer: buyer.to_string(),
        quotes: quotes
            .into_iter()
            .map(|(supplier, unit_price)| SupplierQuoteRequest {
                supplier: supplier.to_string(),
                unit_price: unit_price.to_string(),
            })
            .collect(),
    }
}
