use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use alerting_cell::{AlertAction, AlertDispatcher, DispatchError, IncidentApiClient};
use shared_models::{Alert, AlertSubject, Owner};
use shared_utils::RetryPolicy;

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        initial_interval: Duration::from_millis(10),
        multiplier: 2.0,
        randomization_factor: 0.0,
        max_interval: Duration::from_millis(50),
        max_elapsed: Duration::from_millis(600),
    }
}

fn subject() -> AlertSubject {
    AlertSubject {
        code: "bil".to_string(),
        name: "Billing API".to_string(),
        url: "https://billing.example.com/health".to_string(),
        owners: vec![Owner::new("Ada", "+15551112222")],
    }
}

fn client(server: &MockServer) -> IncidentApiClient {
    IncidentApiClient::new("integration-key", format!("{}/create_event.json", server.uri()))
        .with_retry_policy(quick_policy())
}

#[tokio::test]
async fn test_trigger_posts_incident_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create_event.json"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "service_key": "integration-key",
            "incident_key": "bil",
            "event_type": "trigger",
            "description": "Billing API: HTTP status was 500",
            "client": "watchtower"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Billing API: HTTP status was 500");
    let result = client(&server).trigger(&subject(), &alert).await;

    assert!(result.is_ok(), "Trigger should be accepted: {:?}", result);
}

#[tokio::test]
async fn test_resolve_uses_same_incident_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "incident_key": "bil",
            "event_type": "resolve"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Billing API: is healthy.");
    client(&server)
        .resolve(&subject(), &alert)
        .await
        .expect("Resolve should be accepted");
}

#[tokio::test]
async fn test_bad_request_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Event object is invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Billing API: down");
    let result = client(&server).trigger(&subject(), &alert).await;

    assert_matches!(result, Err(DispatchError::Rejected { status: 400, ref body, .. }) if body.contains("invalid"));
}

#[tokio::test]
async fn test_rate_limited_response_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let alert = Alert::new("Billing API: down");
    client(&server)
        .trigger(&subject(), &alert)
        .await
        .expect("Second attempt should succeed");
}

#[tokio::test]
async fn test_unexpected_status_reports_body_after_budget() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let alert = Alert::new("Billing API: down");
    let result = client(&server).trigger(&subject(), &alert).await;

    assert_matches!(result, Err(DispatchError::UnexpectedStatus { status: 503, ref body, .. }) if body == "maintenance");

    let requests = server.received_requests().await.expect("Recording is enabled");
    assert!(requests.len() > 1, "Expected retries, got {} request(s)", requests.len());
}

#[test]
fn test_event_carries_details() {
    let client = IncidentApiClient::new("key", "http://localhost/create_event.json");
    let alert = Alert::new("Billing API: down");

    let event = client.build_event(&subject(), &alert, AlertAction::Trigger);
    let value = serde_json::to_value(&event).expect("Event serializes");

    assert_eq!(value["event_type"], "trigger");
    assert_eq!(value["details"]["service"], "Billing API");
    assert_eq!(value["details"]["alert_id"], alert.id.to_string());

    let resolve = client.build_event(&subject(), &alert, AlertAction::Resolve);
    let value = serde_json::to_value(&resolve).expect("Event serializes");
    assert_eq!(value["event_type"], "resolve");
}
