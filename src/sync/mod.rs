pub mod engine;
pub mod github;
pub mod remote;

pub use engine::{KeepReason, PullOutcome, SyncEngine};
pub use github::GitHubMirror;
pub use remote::{MirrorError, RemoteFile, RemoteMirror};
