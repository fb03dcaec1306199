//! Abstraction over the remote content-addressed file API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A remote copy of the table file with the metadata the sync engine needs.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: String,
    pub last_modified: DateTime<Utc>,
    /// Content hash the remote expects back on the next update.
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("remote file not found")]
    NotFound,

    #[error("remote authentication failed: {0}")]
    Auth(String),

    #[error("remote content changed since last fetch")]
    Conflict,

    #[error("remote unreachable: {0}")]
    Network(String),
}

/// Thin client over a remote file keyed by (repository, path, credential).
///
/// `put` must supply the hash last observed when the remote file already
/// exists; a mismatch yields `Conflict`, which callers resolve by
/// refetching. Conflict policy lives in the sync engine, not here.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn fetch(&self) -> Result<RemoteFile, MirrorError>;

    /// Uploads the full content, creating the file when `prior_hash` is
    /// `None`. Returns the new content hash.
    async fn put(&self, content: &str, prior_hash: Option<&str>) -> Result<String, MirrorError>;
}
