use super::*;
use crate::tests::test_client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_team_not_found() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server);

    let team = client
        .get_team("test-org", "ghosts")
        .await
        .expect("404 is not an error");

    assert!(team.is_none());
}

#[tokio::test]
async fn test_list_repository_teams_includes_permission() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-org/test-repo/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "slug": "qa-team", "name": "QA Team", "permission": "pull" },
            { "id": 2, "slug": "core", "name": "Core", "permission": "admin" }
        ])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let teams = client
        .list_repository_teams("test-org", "test-repo")
        .await
        .expect("Failed to list teams");

    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].slug, "qa-team");
    assert_eq!(teams[0].permission.as_deref(), Some("pull"));
}

#[tokio::test]
async fn test_set_team_permission() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/orgs/test-org/teams/qa-team/repos/test-org/test-repo"))
        .and(body_json(json!({ "permission": "push" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .set_team_permission("test-org", "qa-team", "test-org", "test-repo", "push")
        .await
        .expect("Failed to set team permission");
}

#[tokio::test]
async fn test_get_collaborator_permission_prefers_role_name_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/test-org/test-repo/collaborators/octocat/permission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permission": "write",
            "role_name": "maintain",
            "user": { "login": "octocat", "id": 1 }
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let permission = client
        .get_collaborator_permission("test-org", "test-repo", "octocat")
        .await
        .expect("Failed to get permission")
        .expect("permission should be present");

    assert_eq!(permission.permission, "write");
    assert_eq!(permission.role_name.as_deref(), Some("maintain"));
}

#[tokio::test]
async fn test_set_collaborator_permission_accepts_invitation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/test-org/test-repo/collaborators/octocat"))
        .and(body_json(json!({ "permission": "triage" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client
        .set_collaborator_permission("test-org", "test-repo", "octocat", "triage")
        .await
        .expect("Failed to set collaborator permission");
}

#[tokio::test]
async fn test_set_collaborator_permission_reports_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/repos/test-org/test-repo/collaborators/ghost"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation Failed" })),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client
        .set_collaborator_permission("test-org", "test-repo", "ghost", "pull")
        .await
        .expect_err("422 must be an error");

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "GitHub returned HTTP 422: Validation Failed");
}

#[tokio::test]
async fn test_list_teams_follows_pages_until_short_page() {
    let mock_server = MockServer::start().await;

    let first_page: Vec<_> = (1..=100)
        .map(|i| json!({ "id": i, "slug": format!("team-{}", i), "name": format!("Team {}", i) }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/orgs/test-org/teams"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/test-org/teams"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 101, "slug": "platform", "name": "Platform" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let teams = client
        .list_teams("test-org")
        .await
        .expect("Failed to list teams");

    assert_eq!(teams.len(), 101);
    assert_eq!(teams[100].slug, "platform");
}

#[tokio::test]
async fn test_list_collaborators_missing_repository_is_not_found() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server);

    let result = client.list_collaborators("test-org", "gone").await;

    assert!(matches!(result, Err(Error::NotFound)));
}
