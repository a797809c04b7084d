#![allow(clippy::unwrap_used, clippy::expect_used)]

use harness_http::HttpClientConfig;
use harness_security::SecurityContext;
use httpmock::prelude::*;
use policy_model_sdk::{Operation, ResourceDescriptor, ResourceKind};
use resource_probe::{Outcome, ProbeRegistry, ProbeRequest, ResourceProbeConfig};
use serde_json::json;

fn registry(server: &MockServer) -> ProbeRegistry {
    let cfg = ResourceProbeConfig {
        api_url: server.base_url(),
        ..ResourceProbeConfig::default()
    };
    let http = HttpClientConfig {
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        ..HttpClientConfig::default()
    };
    ProbeRegistry::from_config(&cfg, &http).unwrap()
}

fn developer() -> SecurityContext {
    SecurityContext::builder()
        .username("developer")
        .roles(["developer"])
        .teams(["ml-team"])
        .bearer_token("tok-dev".to_owned())
        .build()
}

#[tokio::test]
async fn list_models_sends_bearer_token() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/models")
                .header("authorization", "Bearer tok-dev");
            then.status(200)
                .json_body(json!({"data": [{"identifier": "openai/gpt-4o-mini"}]}));
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::Model),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;

    mock.assert_async().await;
    assert!(outcome.is_success());
}

#[tokio::test]
async fn anonymous_listing_is_forbidden() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/models");
            then.status(401).json_body(json!({"detail": "Not authenticated"}));
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::Model),
    );
    let outcome = registry(&server)
        .perform(&SecurityContext::anonymous(), &request)
        .await;

    assert_eq!(outcome, Outcome::Forbidden { status: 401 });
}

#[tokio::test]
async fn chat_completion_denied_by_marker() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(400)
                .json_body(json!({"detail": "Access denied to model openai/gpt-4o-mini"}));
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::item(ResourceKind::Model, "openai/gpt-4o-mini"),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;

    mock.assert_async().await;
    assert_eq!(outcome, Outcome::Forbidden { status: 400 });
}

#[tokio::test]
async fn file_upload_returns_created_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/files");
            then.status(200)
                .json_body(json!({"id": "file-abc", "filename": "test-rbac.txt"}));
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Create,
        ResourceDescriptor::collection(ResourceKind::File),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;

    assert_eq!(outcome.resource_id().as_deref(), Some("file-abc"));
}

#[tokio::test]
async fn vector_store_lookup_by_name() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/vector_stores");
            then.status(200).json_body(json!({"data": [
                {"id": "vs_1", "name": "vs_mlteam_team"}
            ]}));
        })
        .await;
    let probes = registry(&server);

    let present = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::item(ResourceKind::VectorStore, "vs_mlteam_team"),
    );
    let found = probes.perform(&developer(), &present).await;
    assert_eq!(found.resource_id().as_deref(), Some("vs_1"));

    let absent = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::item(ResourceKind::VectorStore, "vs_dataeng_team"),
    );
    assert_eq!(
        probes.perform(&developer(), &absent).await,
        Outcome::NotFound
    );
}

#[tokio::test]
async fn dataset_rows_use_iterrows_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/datasetio/iterrows/ds_mlteam_team");
            then.status(403).body("");
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::item(ResourceKind::Dataset, "ds_mlteam_team"),
    )
    .rows();
    let outcome = registry(&server).perform(&developer(), &request).await;

    mock.assert_async().await;
    assert_eq!(outcome, Outcome::Forbidden { status: 403 });
}

#[tokio::test]
async fn server_errors_are_retried_twice_then_inconclusive() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/toolgroups");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::ToolGroup),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;

    assert!(matches!(
        outcome,
        Outcome::TransportError { ref message } if message.contains("503")
    ));
    assert_eq!(outcome.decision(), None);
    mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn forbidden_is_never_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/toolgroups");
            then.status(403).json_body(json!({"detail": "forbidden"}));
        })
        .await;

    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::ToolGroup),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;

    assert_eq!(outcome, Outcome::Forbidden { status: 403 });
    mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn vector_store_file_without_store_is_not_sent() {
    let server = MockServer::start_async().await;
    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::VectorStoreFile),
    );
    let outcome = registry(&server).perform(&developer(), &request).await;
    assert!(matches!(outcome, Outcome::TransportError { .. }));
}

#[tokio::test]
async fn unregistered_kind_is_inconclusive() {
    let request = ProbeRequest::new(
        Operation::Read,
        ResourceDescriptor::collection(ResourceKind::SqlRecord),
    );
    let outcome = ProbeRegistry::default()
        .perform(&developer(), &request)
        .await;
    assert!(matches!(
        outcome,
        Outcome::TransportError { ref message } if message.contains("sql_record")
    ));
}
