use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn document(text: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(text.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn test_plan_lists_managed_categories() {
    let file = document(
        r#"{
            "repository": { "name": "svc", "owner": "acme", "private": true },
            "custom_properties": { "team": "Platform", "poc": "" },
            "branch_protection": { "enable": true },
            "environments": ["dev", "prod"],
            "environment_variables": { "qa": { "DEBUG": "1" } },
            "secrets": { "API_KEY": "abc" },
            "team_access": { "qa-team": "read" }
        }"#,
    );

    let report = handle_validate_command(&ValidateArgs {
        config: file.path().to_path_buf(),
    })
    .expect("document is valid");

    assert_eq!(report.target.to_string(), "acme/svc");
    assert_eq!(
        report.plan,
        vec![
            "repository: ensure exists (private)",
            "custom properties: 1 property",
            "files: README.md, .gitignore (template Python)",
            "branch protection: main",
            "environments: dev, prod",
            "skipped (environment not managed): qa",
            "secrets: API_KEY",
            "team access: 1 team",
        ]
    );
}

#[test]
fn test_invalid_repository_name_is_rejected() {
    let file = document(r#"{ "repository": { "name": "-bad", "owner": "acme" } }"#);

    let err = handle_validate_command(&ValidateArgs {
        config: file.path().to_path_buf(),
    })
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Engine(repo_steward_core::StewardError::Validation(_))
    ));
}

#[test]
fn test_missing_document_is_reported() {
    let err = handle_validate_command(&ValidateArgs {
        config: PathBuf::from("/nonexistent/repository.json"),
    })
    .unwrap_err();

    assert!(err.to_string().contains("/nonexistent/repository.json"));
}
