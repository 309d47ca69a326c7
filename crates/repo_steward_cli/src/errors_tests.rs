use super::*;
use repo_steward_core::ValidationError;

#[test]
fn test_invalid_arguments_error_display() {
    let error = Error::InvalidArguments("no GitHub token".to_string());
    assert_eq!(error.to_string(), "Invalid arguments: no GitHub token");
}

#[test]
fn test_engine_error_is_transparent() {
    let error = Error::from(StewardError::Configuration("expected value".to_string()));
    assert_eq!(
        error.to_string(),
        StewardError::Configuration("expected value".to_string()).to_string()
    );
}

#[test]
fn test_every_error_is_fatal() {
    let errors = [
        Error::InvalidArguments("x".to_string()),
        Error::Engine(StewardError::GitHub(github_client::Error::NotFound)),
        Error::Engine(StewardError::Validation(ValidationError::empty_field(
            "repository.name",
        ))),
    ];

    for error in errors {
        assert_eq!(error.exit_code(), EXIT_FATAL);
    }
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
