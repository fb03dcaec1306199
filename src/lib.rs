//! Purchase-requisition record store.
//!
//! A flat table file is the single source of truth: every mutation runs a
//! full load-mutate-save cycle with a pre-save backup snapshot and an atomic
//! rename. An optional GitHub-backed mirror replicates the table off-host
//! with last-writer-wins reconciliation; the mirror is best effort and never
//! blocks the local write path.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod commands;
pub mod config;
pub mod errors;
pub mod events;
pub mod models;
pub mod queries;
pub mod services;
pub mod store;
pub mod sync;

use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::services::RequisitionService;
use crate::store::{BackupManager, LocalStore};
use crate::sync::{GitHubMirror, RemoteMirror, SyncEngine};

/// Public re-exports for convenient access to commonly used items
pub mod prelude {
    pub use crate::commands::requisitions::{
        CompleteRequisitionCommand, CreateRequisitionCommand, DeleteRequisitionCommand,
        RequisitionItemRequest, SupplierQuoteRequest,
    };
    pub use crate::config::{AppConfig, BackupConfig, RemoteConfig, StoreConfig};
    pub use crate::errors::ServiceError;
    pub use crate::events::{Event, EventSender};
    pub use crate::models::{ItemLine, QuoteLine, Requisition, RequisitionStatus, RequisitionTable};
    pub use crate::queries::requisitions::RequisitionFilters;
    pub use crate::services::RequisitionService;
    pub use crate::store::{BackupManager, LocalStore};
    pub use crate::sync::{
        GitHubMirror, KeepReason, MirrorError, PullOutcome, RemoteFile, RemoteMirror, SyncEngine,
    };
}

/// Fully wired application state: the workflow service plus the sync engine
/// when a remote mirror is configured.
pub struct App {
    pub service: RequisitionService,
    pub sync: Option<Arc<SyncEngine>>,
}

/// Wires store, backups, events and (optionally) the sync engine from a
/// loaded configuration, runs the startup pull, and spawns the event
/// processor that pushes after every save.
pub async fn bootstrap(config: &AppConfig) -> Result<App, ServiceError> {
    let (event_sender, event_receiver) = events::channel(64);

    let backups = BackupManager::new(&config.backup.dir, config.backup.retention);
    let store = Arc::new(LocalStore::new(
        &config.store.table_path,
        config.store.max_table_bytes,
        backups.clone(),
        Some(event_sender.clone()),
    ));

    let sync = match &config.remote {
        Some(remote) => {
            let mirror: Arc<dyn RemoteMirror> = Arc::new(GitHubMirror::new(remote)?);
            let engine = Arc::new(SyncEngine::new(&config.store.table_path, mirror, backups));
            let outcome = engine.pull().await?;
            info!(?outcome, "startup reconciliation finished");
            tokio::spawn(Arc::clone(&engine).run(event_receiver));
            Some(engine)
        }
        None => {
            // Keep the channel serviced so senders never block.
            tokio::spawn(events::drain(event_receiver));
            None
        }
    };

    Ok(App {
        service: RequisitionService::new(store, Arc::new(event_sender)),
        sync,
    })
}
