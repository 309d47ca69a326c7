use super::*;
use crate::tests::test_client;
use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_organization_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "login": "acme" })))
        .mount(&mock_server)
        .await;

    let probe = GitHubOwnerKindProbe::new(test_client(&mock_server));

    assert_eq!(probe.owner_kind("acme").await, OwnerKind::Organization);
}

#[tokio::test]
async fn test_missing_organization_is_user() {
    let mock_server = MockServer::start().await;

    let probe = GitHubOwnerKindProbe::new(test_client(&mock_server));

    assert_eq!(probe.owner_kind("octocat").await, OwnerKind::User);
}

#[tokio::test]
#[traced_test]
async fn test_inconclusive_probe_assumes_organization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Forbidden" })))
        .mount(&mock_server)
        .await;

    let probe = GitHubOwnerKindProbe::new(test_client(&mock_server));

    assert_eq!(probe.owner_kind("acme").await, OwnerKind::Organization);
    assert!(logs_contain("Could not determine owner kind"));
}

#[tokio::test]
async fn test_fixed_owner_kind_makes_no_calls() {
    let probe = FixedOwnerKind(OwnerKind::User);

    assert_eq!(probe.owner_kind("anything").await, OwnerKind::User);
}
