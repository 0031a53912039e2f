//! Event gateway: session principal in, plain-text verdict out.
//!
//! Each operation resolves the caller's access token, makes exactly one call
//! to the calendar, and turns whatever happened into a [`Reply`]. Failures are
//! logged and their text is relayed to the user unchanged.

use crate::components::credentials::{CredentialResolver, Principal};
use crate::components::google_calendar::{CalendarClient, EventRequest, EventSummary};
use crate::config::StatusPolicy;
use crate::utils::i18n;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What kind of outcome a reply reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Success,
    /// No principal in the session
    NotLoggedIn,
    /// A principal but no usable token
    Unauthorized,
    /// The calendar call failed, with Google's status when there was one
    UpstreamFailure(Option<u16>),
}

/// Plain-text answer of a gateway operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub body: String,
}

impl Reply {
    fn new(kind: ReplyKind, body: String) -> Self {
        Self { kind, body }
    }

    pub fn is_success(&self) -> bool {
        self.kind == ReplyKind::Success
    }

    /// HTTP status for this reply under the given policy
    pub fn status(&self, policy: StatusPolicy) -> StatusCode {
        if policy == StatusPolicy::Legacy {
            return StatusCode::OK;
        }

        match self.kind {
            ReplyKind::Success => StatusCode::OK,
            ReplyKind::NotLoggedIn | ReplyKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ReplyKind::UpstreamFailure(Some(code)) if (400..500).contains(&code) => {
                StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ReplyKind::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Create/delete/list operations against the caller's calendar
pub struct EventGateway {
    credentials: Arc<dyn CredentialResolver>,
    calendar: Arc<dyn CalendarClient>,
    require_login_for_delete: bool,
}

impl EventGateway {
    pub fn new(credentials: Arc<dyn CredentialResolver>, calendar: Arc<dyn CalendarClient>) -> Self {
        Self {
            credentials,
            calendar,
            require_login_for_delete: false,
        }
    }

    /// Answer delete requests without a principal like create does
    pub fn with_delete_guard(mut self, require_login: bool) -> Self {
        self.require_login_for_delete = require_login;
        self
    }

    pub async fn create_event(&self, principal: Option<&Principal>, request: &EventRequest) -> Reply {
        let Some(principal) = principal else {
            warn!("Rejected event creation without a logged-in user");
            return Reply::new(ReplyKind::NotLoggedIn, i18n::not_logged_in());
        };

        let token = match self.credentials.resolve_access_token(Some(principal)).await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to resolve access token for {}: {}", principal.name, e);
                return Reply::new(ReplyKind::Unauthorized, i18n::create_failed(&e.to_string()));
            }
        };

        match self.calendar.create_event(&token, request).await {
            Ok(id) => {
                info!("User {} created event {}", principal.name, id);
                Reply::new(ReplyKind::Success, i18n::event_created(&id))
            }
            Err(e) => {
                error!("Failed to create event for {}: {:?}", principal.name, e);
                Reply::new(
                    ReplyKind::UpstreamFailure(e.upstream_status()),
                    i18n::create_failed(&e.to_string()),
                )
            }
        }
    }

    pub async fn delete_event(&self, principal: Option<&Principal>, event_id: &str) -> Reply {
        if principal.is_none() && self.require_login_for_delete {
            warn!("Rejected deletion of {} without a logged-in user", event_id);
            return Reply::new(ReplyKind::NotLoggedIn, i18n::not_logged_in());
        }

        let token = match self.credentials.resolve_access_token(principal).await {
            Ok(token) => token,
            Err(e) => {
                error!("Failed to resolve access token to delete {}: {}", event_id, e);
                return Reply::new(ReplyKind::Unauthorized, i18n::delete_failed(&e.to_string()));
            }
        };

        match self.calendar.delete_event(&token, event_id).await {
            Ok(()) => Reply::new(ReplyKind::Success, i18n::event_deleted(event_id)),
            Err(e) => {
                error!("Failed to delete event {}: {:?}", event_id, e);
                Reply::new(
                    ReplyKind::UpstreamFailure(e.upstream_status()),
                    i18n::delete_failed(&e.to_string()),
                )
            }
        }
    }

    /// Upcoming events for the dashboard, or the reply explaining why not
    pub async fn list_events(
        &self,
        principal: Option<&Principal>,
        from: DateTime<Utc>,
    ) -> Result<Vec<EventSummary>, Reply> {
        let Some(principal) = principal else {
            return Err(Reply::new(ReplyKind::NotLoggedIn, i18n::not_logged_in()));
        };

        let token = self
            .credentials
            .resolve_access_token(Some(principal))
            .await
            .map_err(|e| {
                error!("Failed to resolve access token for {}: {}", principal.name, e);
                Reply::new(ReplyKind::Unauthorized, i18n::list_failed(&e.to_string()))
            })?;

        self.calendar.list_events(&token, from).await.map_err(|e| {
            error!("Failed to list events for {}: {:?}", principal.name, e);
            Reply::new(
                ReplyKind::UpstreamFailure(e.upstream_status()),
                i18n::list_failed(&e.to_string()),
            )
        })
    }
}
