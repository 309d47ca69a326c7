use super::*;
use repo_steward_core::{Category, CategoryReport, StewardError, Target};
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_document(suffix: &str, text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(text.as_bytes())
        .expect("Failed to write temp file");
    file
}

fn args(config: &NamedTempFile, token: Option<&str>) -> ApplyArgs {
    ApplyArgs {
        config: config.path().to_path_buf(),
        token: token.map(str::to_string),
        api_url: None,
        settle_delay_secs: 2,
        owner_kind: None,
    }
}

fn sample_report() -> ReconcileReport {
    let mut report = ReconcileReport::new(
        Target::parse("acme", "svc").expect("valid target"),
        "https://github.com/acme/svc",
        false,
    );
    let mut files = CategoryReport::new(Category::Files);
    files.record_created();
    let mut users = CategoryReport::new(Category::UserAccess);
    users.record_failure("mallory", "GitHub returned HTTP 422: Validation Failed");
    report.categories.push(files);
    report.categories.push(users);
    report
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let config = write_document(".json", r#"{ "repository": { "name": "svc", "owner": "acme" } }"#);
    let called = Mutex::new(false);

    let result = handle_apply_command(&args(&config, Some("  ")), |_request| {
        *called.lock().unwrap() = true;
        async { Ok(sample_report()) }
    })
    .await;

    assert!(matches!(result, Err(Error::InvalidArguments(_))));
    assert!(!*called.lock().unwrap());
}

#[tokio::test]
async fn test_toml_document_is_passed_to_engine() {
    let config = write_document(
        ".toml",
        r#"
[repository]
name = "svc"
owner = "acme"
visibility = "private"

[variables]
REGION = "eu-west-1"
"#,
    );
    let captured = Mutex::new(None);

    let mut arguments = args(&config, Some("ghp_test"));
    arguments.api_url = Some("https://ghe.example.com/api/v3".to_string());
    arguments.settle_delay_secs = 5;
    arguments.owner_kind = Some(OwnerKindArg::User);

    let report = handle_apply_command(&arguments, |request| {
        *captured.lock().unwrap() = Some(request);
        async { Ok(sample_report()) }
    })
    .await
    .expect("apply succeeds");

    assert_eq!(report.target.to_string(), "acme/svc");
    let request = captured
        .lock()
        .unwrap()
        .take()
        .expect("engine was called");
    assert_eq!(request.desired.repository.name, "svc");
    assert_eq!(request.desired.variables["REGION"], "eu-west-1");
    assert_eq!(request.api_url.as_deref(), Some("https://ghe.example.com/api/v3"));
    assert_eq!(request.settings.creation_settle_delay, Duration::from_secs(5));
    assert_eq!(request.owner_kind, Some(OwnerKind::User));
}

#[tokio::test]
async fn test_unreadable_document_is_fatal() {
    let config = write_document(".json", "{ not json");

    let err = handle_apply_command(&args(&config, Some("ghp_test")), |_request| async {
        Ok(sample_report())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Engine(StewardError::Configuration(_))));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_invalid_api_url_is_reported_as_engine_error() {
    let config = write_document(
        ".json",
        r#"{ "repository": { "name": "svc", "owner": "acme" } }"#,
    );
    let mut arguments = args(&config, Some("ghp_test"));
    arguments.api_url = Some("http://bad host".to_string());

    let err = handle_apply_command(&arguments, apply_desired_state)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Engine(StewardError::GitHub(github_client::Error::AuthError(_)))
    ));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_apply_against_mock_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "svc",
            "full_name": "acme/svc",
            "html_url": "https://github.com/acme/svc",
            "default_branch": "main"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/contents/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "README.md",
            "sha": "abc123",
            "content": "IyBzdmMK",
            "encoding": "base64"
        })))
        .mount(&mock_server)
        .await;

    let config = write_document(
        ".json",
        r#"{
            "repository": { "name": "svc", "owner": "acme" },
            "files": { "gitignore_template": "" }
        }"#,
    );
    let mut arguments = args(&config, Some("ghp_test"));
    arguments.api_url = Some(mock_server.uri());
    arguments.owner_kind = Some(OwnerKindArg::Organization);

    let report = handle_apply_command(&arguments, apply_desired_state)
        .await
        .expect("apply succeeds");

    assert!(!report.created);
    assert_eq!(exit_code(&report), 0);
    assert!(mock_server
        .received_requests()
        .await
        .expect("recording enabled")
        .iter()
        .all(|r| r.method.as_str() == "GET"));
}

#[test]
fn test_exit_code_reflects_category_failures() {
    let mut report = sample_report();
    assert_eq!(exit_code(&report), 1);

    report.categories.pop();
    assert_eq!(exit_code(&report), 0);
}

#[test]
fn test_render_report_lists_categories_and_diagnostics() {
    colored::control::set_override(false);

    let rendered = render_report(&sample_report());

    assert_eq!(
        rendered,
        [
            "Reconciled acme/svc (https://github.com/acme/svc)",
            "  files: 1 created, 0 updated, 0 unchanged, 0 skipped, 0 failed",
            "  user access: 0 created, 0 updated, 0 unchanged, 0 skipped, 1 failed",
            "    - mallory: GitHub returned HTTP 422: Validation Failed",
            "1 failure(s)",
        ]
        .join("\n")
    );
}
