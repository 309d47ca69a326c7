use super::*;
use std::error::Error as StdError;

#[test]
fn test_repository_creation_error_message() {
    let error = StewardError::RepositoryCreation {
        target: "my-org/my-repo".to_string(),
        reason: "GitHub returned HTTP 403: Forbidden".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "Failed to create repository 'my-org/my-repo': GitHub returned HTTP 403: Forbidden"
    );
}

#[test]
fn test_configuration_file_error_keeps_io_source() {
    let error = StewardError::ConfigurationFile {
        path: PathBuf::from("missing.json"),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };

    assert!(error.to_string().starts_with("Failed to read configuration file 'missing.json'"));
    assert!(error.source().is_some());
}

#[test]
fn test_validation_error_is_transparent() {
    let error: StewardError = ValidationError::empty_field("repository_name").into();

    assert_eq!(error.to_string(), "Field 'repository_name' must not be empty");
}

#[test]
fn test_validation_error_constructors() {
    assert_eq!(
        ValidationError::too_long("organization_name", 40, 39).to_string(),
        "Field 'organization_name' is too long (40 characters, at most 39 allowed)"
    );
    assert_eq!(
        ValidationError::invalid_format("repository_name", "must not start with '.' or '-'")
            .to_string(),
        "Field 'repository_name' has an invalid format: must not start with '.' or '-'"
    );
}

#[test]
fn test_github_error_conversion() {
    let error: StewardError = github_client::Error::NotFound.into();

    assert!(matches!(error, StewardError::GitHub(github_client::Error::NotFound)));
    assert_eq!(error.to_string(), "GitHub API error: Resource not found");
}
