use super::*;
use crate::owner_probe::FixedOwnerKind;
use crate::tests::{desired_state, test_client, write_count};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn target() -> Target {
    Target::parse("acme", "svc").expect("valid target")
}

fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_property_name_mapping() {
    assert_eq!(property_name("application"), "Application");
    assert_eq!(property_name("compliance_audit_to_review"), "ComplianceAuditToReview");
    assert_eq!(property_name("poc"), "poc");
    assert_eq!(property_name("CostCenter"), "CostCenter");
}

#[test]
fn test_identical_properties_produce_no_changes() {
    let desired = props(&[("team", "Platform"), ("application", "Payments")]);
    let existing = vec![
        CustomPropertyValue::new("Team", "Platform"),
        CustomPropertyValue::new("Application", "Payments"),
    ];

    assert!(property_changes(&desired, &existing).is_empty());
}

#[test]
fn test_only_differing_subset_is_included() {
    let desired = props(&[
        ("team", "Platform"),
        ("application", "Payments"),
        ("poc", "jane@acme.io"),
    ]);
    let existing = vec![
        CustomPropertyValue::new("Team", "Platform"),
        CustomPropertyValue::new("Application", "Billing"),
    ];

    let changes = property_changes(&desired, &existing);

    assert_eq!(
        changes,
        vec![
            CustomPropertyValue::new("Application", "Payments"),
            CustomPropertyValue::new("poc", "jane@acme.io"),
        ]
    );
}

#[test]
fn test_empty_desired_values_are_skipped_not_deleted() {
    let desired = props(&[("team", ""), ("application", "  ")]);
    let existing = vec![CustomPropertyValue::new("Team", "Platform")];

    assert!(property_changes(&desired, &existing).is_empty());
}

#[test]
fn test_null_observed_value_counts_as_different() {
    let desired = props(&[("team", "Platform")]);
    let existing = vec![CustomPropertyValue {
        property_name: "Team".to_string(),
        value: serde_json::Value::Null,
    }];

    assert_eq!(property_changes(&desired, &existing).len(), 1);
}

#[test]
fn test_topic_tokens() {
    let topics = topic_tokens(&props(&[
        ("application", "Payments API v2.1"),
        ("team", "Platform Engineering"),
        ("poc", "John.Doe@company.com"),
        ("deployed_to_prod", "Yes"),
        ("compliance_audit_to_review", "no"),
        ("prod_deployment_method", "GitOps"),
        ("owner", ""),
    ]));

    let expected: BTreeSet<String> = [
        "app-payments-api-v2-1",
        "team-platform-engineering",
        "poc-john-doe",
        "production-deployed",
        "prod-deployment-method-gitops",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(topics, expected);
}

#[test]
fn test_slug_drops_characters_topics_cannot_hold() {
    assert_eq!(slug(" R&D Team "), "rd-team");
    assert_eq!(slug("snake_case.name"), "snake-case-name");
}

#[tokio::test]
async fn test_structured_update_sends_only_differences() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/properties/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "property_name": "Team", "value_type": "string" },
            { "property_name": "Application", "value_type": "string" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/properties/values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "property_name": "Team", "value": "Platform" },
            { "property_name": "Application", "value": "Billing" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/repos/acme/svc/properties/values"))
        .and(body_json(json!({
            "properties": [ { "property_name": "Application", "value": "Payments" } ]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let desired = desired_state(json!({
        "custom_properties": { "team": "Platform", "application": "Payments" }
    }));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::Organization)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report.updated, 1);
    assert_eq!(report.unchanged, 1);
    assert!(report.is_success());
}

#[tokio::test]
async fn test_structured_properties_already_matching_make_no_writes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/properties/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/properties/values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "property_name": "Team", "value": "Platform" }
        ])))
        .mount(&mock_server)
        .await;

    let desired = desired_state(json!({ "custom_properties": { "team": "Platform" } }));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::Organization)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report.unchanged, 1);
    assert!(!report.has_changes());
    assert_eq!(write_count(&mock_server).await, 0);
}

#[tokio::test]
async fn test_rejected_structured_update_falls_back_to_topics() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/properties/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/repos/acme/svc/properties/values"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Forbidden" })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "names": [] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/acme/svc/topics"))
        .and(body_json(json!({ "names": ["team-platform"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "names": ["team-platform"] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let desired = desired_state(json!({ "custom_properties": { "team": "Platform" } }));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::Organization)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report.created, 1);
    assert!(report.is_success());
    assert_eq!(report.diagnostics.len(), 1);
}

#[tokio::test]
async fn test_user_owner_uses_topics_and_skips_when_matching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "names": ["team-platform", "app-payments"]
        })))
        .mount(&mock_server)
        .await;

    let desired = desired_state(json!({
        "custom_properties": { "team": "Platform", "application": "Payments" }
    }));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::User)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report.unchanged, 1);
    assert_eq!(write_count(&mock_server).await, 0);
}

#[tokio::test]
async fn test_topic_replace_failure_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/svc/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "names": ["old"] })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/repos/acme/svc/topics"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid topic" })))
        .mount(&mock_server)
        .await;

    let desired = desired_state(json!({ "custom_properties": { "team": "Platform" } }));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::User)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.diagnostics[0].subject, "topics");
}

#[tokio::test]
async fn test_no_properties_makes_no_calls() {
    let mock_server = MockServer::start().await;

    let desired = desired_state(json!({}));
    let reconciler = PropertyReconciler::new(
        test_client(&mock_server),
        Arc::new(FixedOwnerKind(OwnerKind::Organization)),
    );

    let report = reconciler.reconcile(&target(), &desired).await;

    assert_eq!(report, CategoryReport::new(Category::Properties));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
