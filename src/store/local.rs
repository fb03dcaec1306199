//! The on-disk table file, single source of truth.
//!
//! Every mutation is a full load-mutate-save cycle; there is no row-level
//! write path. Saves snapshot the previous file contents first (best
//! effort), then write temp-then-rename so an interrupted process never
//! leaves a torn live file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::RequisitionTable;
use crate::store::{backup::BackupManager, codec};

/// Files above this are treated as corrupt rather than loaded.
pub const DEFAULT_MAX_TABLE_BYTES: u64 = 5 * 1024 * 1024;

pub struct LocalStore {
    path: PathBuf,
    max_bytes: u64,
    backups: BackupManager,
    events: Option<EventSender>,
}

impl LocalStore {
    pub fn new(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        backups: BackupManager,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            backups,
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Loads the table. Never fails upward: an absent, unreadable or
    /// unparseable file degrades to an empty canonical table with a logged
    /// warning. Oversized files are backed up and reset.
    pub async fn load(&self) -> RequisitionTable {
        let metadata = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "table file absent; starting empty");
                return RequisitionTable::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to stat table file; treating as empty");
                return RequisitionTable::default();
            }
        };

        if metadata.len() > self.max_bytes {
            warn!(
                size = metadata.len(),
                cap = self.max_bytes,
                "table file exceeds the size cap; backing it up and resetting"
            );
            if let Err(e) = self.backups.snapshot(&self.path).await {
                error!(error = %e, "failed to snapshot oversized table before reset");
            }
            let empty = RequisitionTable::default();
            if let Err(e) = write_atomic(&self.path, codec::encode(&empty).as_bytes()).await {
                error!(error = %e, "failed to reset oversized table file");
            }
            return empty;
        }

        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read table file; treating as empty");
                return RequisitionTable::default();
            }
        };

        let (table, diagnostics) = codec::decode(&raw);
        for diagnostic in &diagnostics {
            warn!(path = %self.path.display(), "{}", diagnostic);
        }
        table
    }

    /// Persists the table: best-effort snapshot, then an atomic write, then
    /// a `TableSaved` event for the sync layer. Snapshot failure is logged
    /// and does not block the save; write failure aborts the operation with
    /// the previous file intact.
    pub async fn save(&self, table: &RequisitionTable) -> Result<(), ServiceError> {
        if let Err(e) = self.backups.snapshot(&self.path).await {
            warn!(error = %e, "pre-save snapshot failed; continuing with the save");
        }

        write_atomic(&self.path, codec::encode(table).as_bytes()).await?;
        info!(rows = table.len(), path = %self.path.display(), "table saved");

        if let Some(events) = &self.events {
            if let Err(e) = events.send(Event::TableSaved).await {
                warn!(error = %e, "table-saved event dropped");
            }
        }
        Ok(())
    }
}

/// Writes bytes to a sibling temp file and renames it over the target, so
/// readers observe either the old or the new contents, never a torn file.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| {
            ServiceError::InternalError(format!("path '{}' has no file name", path.display()))
        })?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
