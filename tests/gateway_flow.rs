mod common;

use common::{consulta_request, google_principal, CalendarCall, MockCalendarClient, MockCredentialResolver};
use healthmoney_agenda::components::google_calendar::EventSummary;
use healthmoney_agenda::gateway::{EventGateway, ReplyKind};
use healthmoney_agenda::utils::i18n;
use std::sync::Arc;

fn gateway(resolver: &MockCredentialResolver, calendar: &MockCalendarClient) -> EventGateway {
    EventGateway::new(Arc::new(resolver.clone()), Arc::new(calendar.clone()))
}

#[tokio::test]
async fn create_without_login_makes_no_external_call() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("evt-1");

    let reply = gateway(&resolver, &calendar)
        .create_event(None, &consulta_request())
        .await;

    assert_eq!(reply.kind, ReplyKind::NotLoggedIn);
    assert_eq!(reply.body, i18n::not_logged_in());
    assert_eq!(resolver.lookups(), 0);
    assert!(calendar.calls().is_empty());
}

#[tokio::test]
async fn create_inserts_once_and_reports_the_new_id() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("c2FtcGxlLWlk_20231225");
    let principal = google_principal("alice");

    let reply = gateway(&resolver, &calendar)
        .create_event(Some(&principal), &consulta_request())
        .await;

    assert!(reply.is_success());
    assert!(reply.body.contains("c2FtcGxlLWlk_20231225"));
    assert_eq!(reply.body, i18n::event_created("c2FtcGxlLWlk_20231225"));
    assert_eq!(
        calendar.calls(),
        vec![CalendarCall::Create {
            token: "ya29.alice".to_string(),
            request: consulta_request(),
        }]
    );
}

#[tokio::test]
async fn create_relays_calendar_failures_verbatim() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::failing(Some(400), "Bad Request: invalid start time");
    let principal = google_principal("alice");

    let reply = gateway(&resolver, &calendar)
        .create_event(Some(&principal), &consulta_request())
        .await;

    assert_eq!(reply.kind, ReplyKind::UpstreamFailure(Some(400)));
    assert!(reply.body.contains("Bad Request: invalid start time"));
    assert_eq!(calendar.calls().len(), 1);
}

#[tokio::test]
async fn create_without_authorized_client_reports_the_lookup_failure() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("evt-1");
    let principal = google_principal("mallory");

    let reply = gateway(&resolver, &calendar)
        .create_event(Some(&principal), &consulta_request())
        .await;

    assert_eq!(reply.kind, ReplyKind::Unauthorized);
    assert!(reply.body.contains("mallory"));
    assert!(calendar.calls().is_empty());
}

#[tokio::test]
async fn delete_targets_the_requested_event() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("unused");
    let principal = google_principal("alice");

    let reply = gateway(&resolver, &calendar)
        .delete_event(Some(&principal), "abc123")
        .await;

    assert!(reply.is_success());
    assert_eq!(reply.body, i18n::event_deleted("abc123"));
    assert_eq!(
        calendar.calls(),
        vec![CalendarCall::Delete {
            token: "ya29.alice".to_string(),
            event_id: "abc123".to_string(),
        }]
    );
}

#[tokio::test]
async fn delete_without_login_still_attempts_the_lookup() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("unused");

    let reply = gateway(&resolver, &calendar).delete_event(None, "abc123").await;

    assert_eq!(resolver.lookups(), 1);
    assert_eq!(reply.kind, ReplyKind::Unauthorized);
    assert_ne!(reply.body, i18n::not_logged_in());
    assert!(calendar.calls().is_empty());
}

#[tokio::test]
async fn delete_guard_answers_like_create() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("unused");

    let reply = gateway(&resolver, &calendar)
        .with_delete_guard(true)
        .delete_event(None, "abc123")
        .await;

    assert_eq!(reply.kind, ReplyKind::NotLoggedIn);
    assert_eq!(reply.body, i18n::not_logged_in());
    assert_eq!(resolver.lookups(), 0);
}

#[tokio::test]
async fn delete_failure_carries_no_success_text() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::failing(Some(404), "Not Found");
    let principal = google_principal("alice");

    let reply = gateway(&resolver, &calendar)
        .delete_event(Some(&principal), "gone")
        .await;

    assert_eq!(reply.kind, ReplyKind::UpstreamFailure(Some(404)));
    assert!(reply.body.contains("Not Found"));
    assert_ne!(reply.body, i18n::event_deleted("gone"));
}

#[tokio::test]
async fn list_returns_the_calendar_events() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("unused").with_events(vec![EventSummary {
        id: "evt-1".to_string(),
        titulo: "Consulta".to_string(),
        inicio: Some("2023-12-25T10:00:00-03:00".to_string()),
        fim: Some("2023-12-25T11:00:00-03:00".to_string()),
    }]);
    let principal = google_principal("alice");

    let events = gateway(&resolver, &calendar)
        .list_events(Some(&principal), chrono::Utc::now())
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].titulo, "Consulta");
}

#[tokio::test]
async fn list_without_login_is_refused() {
    let resolver = MockCredentialResolver::with_token("alice", "ya29.alice");
    let calendar = MockCalendarClient::new("unused");

    let reply = gateway(&resolver, &calendar)
        .list_events(None, chrono::Utc::now())
        .await
        .unwrap_err();

    assert_eq!(reply.kind, ReplyKind::NotLoggedIn);
    assert!(calendar.calls().is_empty());
}
