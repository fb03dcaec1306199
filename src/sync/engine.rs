//! Last-writer-wins reconciliation between the local table file and the
//! remote mirror.
//!
//! The local copy is authoritative: push failures never roll back a save,
//! and a pull only overwrites local state after a backup snapshot and a
//! validation pass over the remote payload. There is no merge; the backup
//! history is the recovery path when two hosts clobber each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::events::Event;
use crate::store::{backup::BackupManager, codec, local::write_atomic};

use super::remote::{MirrorError, RemoteMirror};

/// Result of a reconciliation pull, for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote content was adopted and now backs the local file.
    AdoptedRemote,
    KeptLocal(KeepReason),
    /// The remote file does not exist yet; the next push creates it.
    RemoteMissing,
    /// Remote unreachable or credential rejected; local-only mode.
    Degraded(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    LocalNewer,
    RemoteInvalid,
}

pub struct SyncEngine {
    table_path: PathBuf,
    mirror: Arc<dyn RemoteMirror>,
    backups: BackupManager,
    /// Hash last observed on the remote, supplied back on updates.
    last_hash: Mutex<Option<String>>,
}

impl SyncEngine {
    pub fn new(
        table_path: impl Into<PathBuf>,
        mirror: Arc<dyn RemoteMirror>,
        backups: BackupManager,
    ) -> Self {
        Self {
            table_path: table_path.into(),
            mirror,
            backups,
            last_hash: Mutex::new(None),
        }
    }

    pub fn table_path(&self) -> &Path {
        &self.table_path
    }

    /// Reconciles local state with the remote copy. Used at startup and for
    /// manual resync; both follow the same rules:
    ///
    /// - no local file: adopt remote unconditionally;
    /// - local strictly newer than remote: keep local;
    /// - otherwise: snapshot local, validate the remote payload, overwrite.
    ///
    /// Remote failures degrade to local-only mode instead of failing.
    pub async fn pull(&self) -> Result<PullOutcome, ServiceError> {
        let remote = match self.mirror.fetch().await {
            Ok(remote) => remote,
            Err(MirrorError::NotFound) => {
                info!("remote table absent; keeping local copy");
                return Ok(PullOutcome::RemoteMissing);
            }
            Err(e) => {
                warn!(error = %e, "remote unreachable; continuing in local-only mode");
                return Ok(PullOutcome::Degraded(e.to_string()));
            }
        };
        *self.last_hash.lock().await = Some(remote.hash.clone());

        let local_modified = match fs::metadata(&self.table_path).await {
            Ok(metadata) => metadata.modified().ok().map(DateTime::<Utc>::from),
            Err(_) => None,
        };

        let Some(local_modified) = local_modified else {
            write_atomic(&self.table_path, remote.content.as_bytes()).await?;
            info!("adopted remote table; no local copy existed");
            return Ok(PullOutcome::AdoptedRemote);
        };

        if local_modified > remote.last_modified {
            info!(
                local = %local_modified,
                remote = %remote.last_modified,
                "local table is newer; keeping it"
            );
            return Ok(PullOutcome::KeptLocal(KeepReason::LocalNewer));
        }

        if !codec::is_well_formed(&remote.content) {
            warn!("remote table failed validation; keeping local copy");
            return Ok(PullOutcome::KeptLocal(KeepReason::RemoteInvalid));
        }

        if let Err(e) = self.backups.snapshot(&self.table_path).await {
            warn!(error = %e, "pre-pull snapshot failed; adopting remote anyway");
        }
        write_atomic(&self.table_path, remote.content.as_bytes()).await?;
        info!("adopted remote table");
        Ok(PullOutcome::AdoptedRemote)
    }

    /// Explicit user-triggered reconciliation; same rules as the startup
    /// pull.
    pub async fn resync(&self) -> Result<PullOutcome, ServiceError> {
        self.pull().await
    }

    /// Uploads the full current local file, creating the remote file when
    /// absent. A stale-hash conflict is resolved by refetching the current
    /// hash and overwriting: last writer wins.
    pub async fn push(&self) -> Result<(), ServiceError> {
        let content = fs::read_to_string(&self.table_path).await?;

        let prior = {
            let guard = self.last_hash.lock().await;
            guard.clone()
        };
        let prior = match prior {
            Some(hash) => Some(hash),
            None => match self.mirror.fetch().await {
                Ok(remote) => Some(remote.hash),
                Err(MirrorError::NotFound) => None,
                Err(e) => return Err(e.into()),
            },
        };

        match self.mirror.put(&content, prior.as_deref()).await {
            Ok(hash) => {
                *self.last_hash.lock().await = Some(hash);
                info!("table pushed to remote");
                Ok(())
            }
            Err(MirrorError::Conflict) => {
                warn!("remote changed since last fetch; refetching and overwriting");
                let remote = self.mirror.fetch().await?;
                let hash = self.mirror.put(&content, Some(&remote.hash)).await?;
                *self.last_hash.lock().await = Some(hash);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Event loop: pushes after every save signal. Push failures are logged
    /// and swallowed; the local save stays authoritative.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            if matches!(event, Event::TableSaved) {
                if let Err(e) = self.push().await {
                    error!(error = %e, "post-save push failed; local save remains authoritative");
                }
            }
        }
    }
}
