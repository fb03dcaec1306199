//! Rotating snapshots of the table file.
//!
//! Every snapshot is an immutable timestamped copy named
//! `<table-filename>.<timestamp>.bak`. Retention is FIFO: once the cap is
//! exceeded the oldest snapshots are deleted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::debug;

use crate::errors::ServiceError;
use crate::store::local::write_atomic;

pub const DEFAULT_RETENTION: usize = 5;

const BACKUP_SUFFIX: &str = ".bak";

#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
    retention: usize,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, retention: usize) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Copies the live file into the backup directory and prunes snapshots
    /// beyond the retention cap. Returns `None` when the source file does
    /// not exist yet (nothing to snapshot before the first save).
    pub async fn snapshot(&self, path: &Path) -> Result<Option<PathBuf>, ServiceError> {
        match fs::metadata(path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.dir).await?;

        let file_name = base_file_name(path)?;
        // Nanosecond stamp keeps names unique and lexically ordered by
        // creation time.
        let stamp = Utc::now().format("%Y%m%d%H%M%S%f");
        let backup_path = self
            .dir
            .join(format!("{file_name}.{stamp}{BACKUP_SUFFIX}"));
        fs::copy(path, &backup_path).await?;
        debug!(backup = %backup_path.display(), "table snapshot written");

        self.prune(&file_name).await?;
        Ok(Some(backup_path))
    }

    /// Backups for the given base file, oldest first.
    pub async fn list(&self, path: &Path) -> Result<Vec<PathBuf>, ServiceError> {
        let file_name = base_file_name(path)?;
        self.list_by_name(&file_name).await
    }

    /// Overwrites the live file with the named backup's bytes.
    pub async fn restore(&self, backup_id: &str, target: &Path) -> Result<(), ServiceError> {
        let backup_path = self.dir.join(backup_id);
        let bytes = match fs::read(&backup_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ServiceError::NotFound(format!(
                    "backup '{}' not found",
                    backup_id
                )));
            }
            Err(e) => return Err(e.into()),
        };
        write_atomic(target, &bytes).await
    }

    async fn prune(&self, file_name: &str) -> Result<(), ServiceError> {
        let backups = self.list_by_name(file_name).await?;
        if backups.len() <= self.retention {
            return Ok(());
        }
        for stale in &backups[..backups.len() - self.retention] {
            fs::remove_file(stale).await?;
            debug!(backup = %stale.display(), "stale snapshot removed");
        }
        Ok(())
    }

    async fn list_by_name(&self, file_name: &str) -> Result<Vec<PathBuf>, ServiceError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let prefix = format!("{file_name}.");
        let mut backups = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) && name.ends_with(BACKUP_SUFFIX) {
                backups.push(entry.path());
            }
        }
        backups.sort();
        Ok(backups)
    }
}

fn base_file_name(path: &Path) -> Result<String, ServiceError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            ServiceError::InternalError(format!("path '{}' has no file name", path.display()))
        })
}
