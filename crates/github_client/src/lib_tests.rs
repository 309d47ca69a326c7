//! Unit tests for the github_client crate.

use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a client that talks to the given mock server with a dummy token.
pub(crate) fn test_client(server: &MockServer) -> GitHubClient {
    let token = SecretString::from("test-token".to_string());
    let octocrab =
        create_token_client(&token, Some(&server.uri())).expect("Failed to build test client");
    GitHubClient::new(octocrab)
}

fn repository_json(name: &str) -> serde_json::Value {
    json!({
        "id": 123456,
        "name": name,
        "full_name": format!("test-org/{name}"),
        "html_url": format!("https://github.com/test-org/{name}"),
        "private": true,
        "default_branch": "main"
    })
}

#[tokio::test]
async fn test_get_repository_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-org/test-repo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_json("test-repo")))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .get_repository("test-org", "test-repo")
        .await
        .expect("Failed to get repository")
        .expect("repository should exist");

    assert_eq!(repo.full_name, "test-org/test-repo");
    assert!(repo.private);
}

#[tokio::test]
async fn test_get_repository_not_found_is_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-org/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .get_repository("test-org", "missing")
        .await
        .expect("404 is not an error");

    assert!(repo.is_none());
}

#[tokio::test]
async fn test_get_repository_server_error_is_unexpected_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-org/test-repo"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .get_repository("test-org", "test-repo")
        .await
        .expect_err("500 must be an error");

    match err {
        Error::UnexpectedStatus { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "no response body");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_requests_carry_api_version_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/test-org"))
        .and(header("x-github-api-version", GITHUB_API_VERSION))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 7, "login": "test-org" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let org = client
        .get_organization("test-org")
        .await
        .expect("Failed to get organization");

    assert_eq!(org.map(|o| o.login), Some("test-org".to_string()));
}

#[tokio::test]
async fn test_get_organization_missing_is_none() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server);

    let org = client
        .get_organization("some-user")
        .await
        .expect("404 is not an error");

    assert!(org.is_none());
}

#[tokio::test]
async fn test_create_org_repository_success() {
    let mock_server = MockServer::start().await;
    let payload = RepositoryCreatePayload {
        name: "test-repo".to_string(),
        private: Some(true),
        auto_init: Some(true),
        ..Default::default()
    };

    Mock::given(method("POST"))
        .and(path("/orgs/test-org/repos"))
        .and(body_json(json!({ "name": "test-repo", "private": true, "auto_init": true })))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_json("test-repo")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let repo = client
        .create_org_repository("test-org", &payload)
        .await
        .expect("Failed to create repository");

    assert_eq!(repo.name, "test-repo");
}

#[tokio::test]
async fn test_create_user_repository_failure_reports_message() {
    let mock_server = MockServer::start().await;
    let payload = RepositoryCreatePayload {
        name: "taken".to_string(),
        ..Default::default()
    };

    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Repository creation failed."
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .create_user_repository(&payload)
        .await
        .expect_err("422 must be an error");

    assert_eq!(
        err.to_string(),
        "GitHub returned HTTP 422: Repository creation failed."
    );
}

#[test]
fn test_create_token_client_rejects_invalid_base_uri() {
    let token = SecretString::from("test-token".to_string());

    let result = create_token_client(&token, Some("not a uri"));

    assert!(matches!(result, Err(Error::AuthError(_))));
}

#[test]
fn test_segment_encodes_spaces_and_slashes() {
    assert_eq!(segment("QA Env"), "QA%20Env");
    assert_eq!(segment("ops/team"), "ops%2Fteam");
    assert_eq!(segment("prod"), "prod");
}

#[test]
fn test_slash_path_keeps_separators() {
    assert_eq!(slash_path("docs/My Notes.md"), "docs/My%20Notes.md");
    assert_eq!(slash_path("release/v1.0"), "release/v1.0");
    assert_eq!(slash_path("feature/a+b"), "feature/a%2Bb");
}
