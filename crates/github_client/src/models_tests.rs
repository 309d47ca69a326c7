use super::*;
use serde_json::json;

#[test]
fn test_repository_deserialization_ignores_unknown_fields() {
    let repo: Repository = serde_json::from_value(json!({
        "id": 1296269,
        "name": "hello-world",
        "full_name": "octocat/hello-world",
        "html_url": "https://github.com/octocat/hello-world",
        "private": false,
        "visibility": "public",
        "default_branch": "trunk",
        "owner": { "login": "octocat", "id": 1 }
    }))
    .expect("Failed to deserialize Repository");

    assert_eq!(repo.name, "hello-world");
    assert_eq!(repo.full_name, "octocat/hello-world");
    assert_eq!(
        repo.html_url.as_str(),
        "https://github.com/octocat/hello-world"
    );
    assert_eq!(repo.visibility.as_deref(), Some("public"));
    assert_eq!(repo.default_branch(), "trunk");
}

#[test]
fn test_repository_default_branch_falls_back_to_main() {
    let repo: Repository = serde_json::from_value(json!({
        "name": "empty",
        "full_name": "octocat/empty",
        "html_url": "https://github.com/octocat/empty"
    }))
    .expect("Failed to deserialize Repository");

    assert!(!repo.private);
    assert_eq!(repo.default_branch(), "main");
}

#[test]
fn test_create_payload_omits_unset_fields() {
    let payload = RepositoryCreatePayload {
        name: "svc".to_string(),
        visibility: Some("internal".to_string()),
        auto_init: Some(true),
        ..Default::default()
    };

    let value = serde_json::to_value(&payload).expect("Failed to serialize payload");

    assert_eq!(
        value,
        json!({ "name": "svc", "visibility": "internal", "auto_init": true })
    );
}

#[test]
fn test_user_round_trip_fields() {
    let user: User = serde_json::from_value(json!({
        "id": 583231,
        "login": "octocat",
        "node_id": "MDQ6VXNlcjU4MzIzMQ==",
        "type": "User"
    }))
    .expect("Failed to deserialize User");

    assert_eq!(user.id, 583231);
    assert_eq!(user.login, "octocat");
}
