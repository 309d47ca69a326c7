//! Tests for RepositoryName, OwnerName and Target

use super::*;

#[test]
fn test_repository_name_valid() {
    assert!(RepositoryName::new("my-repo").is_ok());
    assert!(RepositoryName::new("my_repo").is_ok());
    assert!(RepositoryName::new("my.repo").is_ok());
    assert!(RepositoryName::new("MyRepo123").is_ok());
    assert!(RepositoryName::new(".github").is_ok());
    assert!(RepositoryName::new(".dotfiles").is_ok());
}

#[test]
fn test_repository_name_invalid() {
    assert!(RepositoryName::new(".").is_err());
    assert!(RepositoryName::new("..").is_err());
    assert!(RepositoryName::new("-starts-with-dash").is_err());
    assert!(RepositoryName::new("").is_err());
    assert!(RepositoryName::new("a".repeat(101)).is_err());
    assert!(RepositoryName::new("invalid space").is_err());
    assert!(RepositoryName::new("naïve").is_err());
}

#[test]
fn test_owner_name_valid() {
    assert!(OwnerName::new("my-org").is_ok());
    assert!(OwnerName::new("MyOrg").is_ok());
    assert!(OwnerName::new("octocat").is_ok());
}

#[test]
fn test_owner_name_invalid() {
    assert!(OwnerName::new("-starts-with-dash").is_err());
    assert!(OwnerName::new("ends-with-dash-").is_err());
    assert!(OwnerName::new("double--dash").is_err());
    assert!(OwnerName::new("").is_err());
    assert!(OwnerName::new("a".repeat(40)).is_err());
    assert!(OwnerName::new("invalid_underscore").is_err());
}

#[test]
fn test_owner_name_empty_reports_field() {
    assert_eq!(
        OwnerName::new("").unwrap_err(),
        ValidationError::empty_field("repository.owner")
    );
}

#[test]
fn test_target_parse_and_display() {
    let target = Target::parse("my-org", "my-repo").expect("valid target");

    assert_eq!(target.owner(), "my-org");
    assert_eq!(target.name(), "my-repo");
    assert_eq!(target.to_string(), "my-org/my-repo");
}

#[test]
fn test_target_parse_rejects_invalid_name() {
    let err = Target::parse("my-org", "..").unwrap_err();

    assert!(matches!(err, ValidationError::InvalidFormat { .. }));
}

#[test]
fn test_target_parse_accepts_community_health_repository() {
    let target = Target::parse("acme", ".github").expect(".github is a valid repository");

    assert_eq!(target.name(), ".github");
    assert_eq!(target.to_string(), "acme/.github");
}
