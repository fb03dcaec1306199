//! GitHub contents-API client tests against a wiremock server: payload
//! decoding, status-code mapping and prior-sha updates.

use assert_matches::assert_matches;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{TimeZone, Utc};
use requisition_store::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        repository: "acme/compras".to_string(),
        path: "data/compras.csv".to_string(),
        token: "token-123".to_string(),
        api_base: server.uri(),
        timeout_secs: 5,
    }
}

/// Base64 the way GitHub serves it: wrapped in newlines.
fn wrapped_base64(content: &str) -> String {
    let encoded = BASE64.encode(content.as_bytes());
    encoded
        .as_bytes()
        .chunks(16)
        .map(|chunk| std::str::from_utf8(chunk).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn fetch_decodes_content_and_metadata() {
    let server = MockServer::start().await;
    let table = "ID,Status\n0001-2025,Pendente\n";

    Mock::given(method("GET"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .and(header("Authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": wrapped_base64(table),
            "sha": "abc123",
            "encoding": "base64",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/compras/commits"))
        .and(query_param("path", "data/compras.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "commit": { "committer": { "date": "2025-01-02T03:04:05Z" } } }
        ])))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    let remote = mirror.fetch().await.unwrap();

    assert_eq!(remote.content, table);
    assert_eq!(remote.hash, "abc123");
    assert_eq!(
        remote.last_modified,
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    );
}

#[tokio::test]
async fn fetch_without_commit_history_reports_the_epoch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": wrapped_base64("ID,Status\n"),
            "sha": "abc123",
        })))
        .mount(&server)
        .await;
    // No commits endpoint mocked: the lookup 404s.

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    let remote = mirror.fetch().await.unwrap();
    assert_eq!(remote.last_modified, chrono::DateTime::<Utc>::UNIX_EPOCH);
}

#[tokio::test]
async fn fetch_maps_missing_file_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    assert_matches!(mirror.fetch().await, Err(MirrorError::NotFound));
}

#[tokio::test]
async fn fetch_maps_rejected_credentials_to_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    assert_matches!(mirror.fetch().await, Err(MirrorError::Auth(_)));
}

#[tokio::test]
async fn put_creates_the_file_and_returns_the_new_hash() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .and(header("Authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "created-sha" }
        })))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    let hash = mirror.put("ID,Status\n", None).await.unwrap();
    assert_eq!(hash, "created-sha");
}

#[tokio::test]
async fn put_update_sends_the_prior_hash() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .and(body_partial_json(json!({ "sha": "abc123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "updated-sha" }
        })))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    let hash = mirror.put("ID,Status\n", Some("abc123")).await.unwrap();
    assert_eq!(hash, "updated-sha");
}

#[tokio::test]
async fn put_with_a_stale_hash_is_a_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/compras/contents/data/compras.csv"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let mirror = GitHubMirror::new(&remote_config(&server)).unwrap();
    assert_matches!(
        mirror.put("ID,Status\n", Some("stale")).await,
        Err(MirrorError::Conflict)
    );
}
