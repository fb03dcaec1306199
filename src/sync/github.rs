//! GitHub contents-API implementation of [`RemoteMirror`].
//!
//! The table lives as a single file inside a repository; updates go through
//! the contents endpoint with the blob sha observed on the last fetch, which
//! is what turns concurrent remote edits into `Conflict` instead of silent
//! clobbering at this layer.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::config::RemoteConfig;

use super::remote::{MirrorError, RemoteFile, RemoteMirror};

const ACCEPT_HEADER: &str = "application/vnd.github+json";

pub struct GitHubMirror {
    client: Client,
    api_base: String,
    repository: String,
    path: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: CommitSignature,
}

#[derive(Deserialize)]
struct CommitSignature {
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

impl GitHubMirror {
    pub fn new(config: &RemoteConfig) -> Result<Self, MirrorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("requisition-store")
            .build()
            .map_err(|e| MirrorError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            path: config.path.clone(),
            token: config.token.clone(),
        })
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base, self.repository, self.path
        )
    }

    fn commits_url(&self) -> String {
        format!("{}/repos/{}/commits", self.api_base, self.repository)
    }

    /// Timestamp of the newest commit touching the mirrored path. The
    /// contents endpoint carries no modification time, so this is a second
    /// request; when it fails or the file has no history the epoch is
    /// reported, which makes the sync engine keep the local copy.
    async fn last_modified(&self) -> DateTime<Utc> {
        let response = self
            .client
            .get(self.commits_url())
            .query(&[("path", self.path.as_str()), ("per_page", "1")])
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await;
        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<Vec<CommitEntry>>().await {
                    Ok(commits) if !commits.is_empty() => {
                        return commits[0].commit.committer.date;
                    }
                    Ok(_) => warn!(path = %self.path, "no commit history for mirrored file"),
                    Err(e) => warn!(error = %e, "malformed commit listing"),
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "commit listing failed");
            }
            Err(e) => warn!(error = %e, "commit listing unreachable"),
        }
        DateTime::<Utc>::UNIX_EPOCH
    }
}

fn map_status(status: StatusCode) -> MirrorError {
    match status {
        StatusCode::NOT_FOUND => MirrorError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            MirrorError::Auth(format!("remote API returned {status}"))
        }
        // The contents endpoint answers a stale sha with 409 or 422.
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => MirrorError::Conflict,
        other => MirrorError::Network(format!("remote API returned {other}")),
    }
}

#[async_trait]
impl RemoteMirror for GitHubMirror {
    async fn fetch(&self) -> Result<RemoteFile, MirrorError> {
        let response = self
            .client
            .get(self.contents_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| MirrorError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(map_status(response.status()));
        }
        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| MirrorError::Network(format!("malformed contents response: {e}")))?;

        // GitHub wraps base64 payloads in newlines.
        let encoded: String = body
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| MirrorError::Network(format!("invalid base64 content: {e}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| MirrorError::Network(format!("remote content is not UTF-8: {e}")))?;

        let last_modified = self.last_modified().await;
        Ok(RemoteFile {
            content,
            last_modified,
            hash: body.sha,
        })
    }

    async fn put(&self, content: &str, prior_hash: Option<&str>) -> Result<String, MirrorError> {
        let mut body = json!({
            "message": format!("Update {}", self.path),
            "content": BASE64.encode(content.as_bytes()),
        });
        if let Some(sha) = prior_hash {
            body["sha"] = json!(sha);
        }
        let response = self
            .client
            .put(self.contents_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT_HEADER)
            .json(&body)
            .send()
            .await
            .map_err(|e| MirrorError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(map_status(response.status()));
        }
        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| MirrorError::Network(format!("malformed update response: {e}")))?;
        Ok(body.content.sha)
    }
}
