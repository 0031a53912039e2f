#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::header;
use axum::response::Response;
use chrono::{DateTime, Utc};
use healthmoney_agenda::components::credentials::{CredentialResolver, Principal, GOOGLE_REGISTRATION_ID};
use healthmoney_agenda::components::google_calendar::{CalendarClient, EventRequest, EventSummary};
use healthmoney_agenda::error::{AuthError, CalendarApiError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Call recorded by the mock calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    Create { token: String, request: EventRequest },
    Delete { token: String, event_id: String },
    List { token: String },
}

/// Mock calendar that records every call and answers from a script
#[derive(Debug, Clone, Default)]
pub struct MockCalendarClient {
    calls: Arc<Mutex<Vec<CalendarCall>>>,
    created_id: String,
    events: Vec<EventSummary>,
    /// Upstream status and message to fail every call with
    failure: Option<(Option<u16>, String)>,
}

impl MockCalendarClient {
    /// Create a mock that assigns the given id to created events
    pub fn new(created_id: &str) -> Self {
        Self {
            created_id: created_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_events(mut self, events: Vec<EventSummary>) -> Self {
        self.events = events;
        self
    }

    pub fn failing(status: Option<u16>, message: &str) -> Self {
        Self {
            failure: Some((status, message.to_string())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CalendarCall) -> Result<(), CalendarApiError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some((Some(status), message)) => Err(CalendarApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            Some((None, message)) => Err(CalendarApiError::InvalidResponse(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CalendarClient for MockCalendarClient {
    async fn create_event(&self, access_token: &str, request: &EventRequest) -> Result<String, CalendarApiError> {
        self.record(CalendarCall::Create {
            token: access_token.to_string(),
            request: request.clone(),
        })?;
        Ok(self.created_id.clone())
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), CalendarApiError> {
        self.record(CalendarCall::Delete {
            token: access_token.to_string(),
            event_id: event_id.to_string(),
        })
    }

    async fn list_events(
        &self,
        access_token: &str,
        _time_min: DateTime<Utc>,
    ) -> Result<Vec<EventSummary>, CalendarApiError> {
        self.record(CalendarCall::List {
            token: access_token.to_string(),
        })?;
        Ok(self.events.clone())
    }
}

/// Mock authorized-client store keyed by principal name
#[derive(Debug, Clone, Default)]
pub struct MockCredentialResolver {
    tokens: HashMap<String, String>,
    lookups: Arc<AtomicUsize>,
}

impl MockCredentialResolver {
    pub fn with_token(principal_name: &str, token: &str) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(principal_name.to_string(), token.to_string());
        Self {
            tokens,
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialResolver for MockCredentialResolver {
    async fn resolve_access_token(&self, principal: Option<&Principal>) -> Result<String, AuthError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let principal = principal.ok_or(AuthError::NotAuthenticated)?;
        self.tokens
            .get(&principal.name)
            .cloned()
            .ok_or_else(|| AuthError::NoAuthorizedClient {
                registration_id: principal.registration_id.clone(),
                principal: principal.name.clone(),
            })
    }
}

pub fn google_principal(name: &str) -> Principal {
    Principal::new(GOOGLE_REGISTRATION_ID, name)
}

pub fn consulta_request() -> EventRequest {
    EventRequest {
        titulo: "Consulta".to_string(),
        data_inicio: "2023-12-25T10:00:00".to_string(),
        data_fim: "2023-12-25T11:00:00".to_string(),
        descricao: "Retorno do paciente".to_string(),
    }
}

/// Value of a cookie the response sets, if any
pub fn set_cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.strip_prefix(prefix.as_str()))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

/// Full `Set-Cookie` line for a cookie, attributes included
pub fn set_cookie_line(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(prefix.as_str()))
        .map(str::to_string)
}
