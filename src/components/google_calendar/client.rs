use super::models::{EventList, EventRequest, EventSummary, GoogleEvent};
use super::time::EventZone;
use crate::config::{Config, DEFAULT_APPLICATION_NAME, PRIMARY_CALENDAR};
use crate::error::{config_error, AgendaResult, CalendarApiError};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Upper bound of events fetched for the dashboard
const MAX_LISTED_EVENTS: usize = 250;

/// Calendar operations performed on behalf of a bearer token
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Insert an event and return the id Google assigned to it
    async fn create_event(&self, access_token: &str, request: &EventRequest) -> Result<String, CalendarApiError>;

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), CalendarApiError>;

    /// Upcoming events starting from `time_min`, ordered by start time
    async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
    ) -> Result<Vec<EventSummary>, CalendarApiError>;
}

/// Google Calendar v3 REST client
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: Client,
    api_base: String,
    application_name: String,
    calendar_id: String,
    zone: EventZone,
}

impl GoogleCalendarClient {
    /// Create a client for the primary calendar with the default identity and zone
    pub fn new(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            calendar_id: PRIMARY_CALENDAR.to_string(),
            zone: EventZone::default(),
        }
    }

    /// Build the client described by the service configuration
    pub fn from_config(config: &Config) -> AgendaResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| config_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::new(http, config.calendar_api_base.clone())
            .with_application_name(config.application_name.clone())
            .with_calendar_id(config.calendar_id.clone())
            .with_zone(EventZone::new(
                config.event_timezone.clone(),
                config.event_utc_offset.clone(),
            )))
    }

    pub fn with_application_name(mut self, application_name: impl Into<String>) -> Self {
        self.application_name = application_name.into();
        self
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn with_zone(mut self, zone: EventZone) -> Self {
        self.zone = zone;
        self
    }

    /// Shape the Google event payload for a creation request
    pub fn build_event(&self, request: &EventRequest) -> GoogleEvent {
        GoogleEvent {
            id: None,
            summary: Some(request.titulo.clone()),
            description: Some(request.descricao.clone()),
            start: Some(self.zone.event_date_time(&request.data_inicio)),
            end: Some(self.zone.event_date_time(&request.data_fim)),
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(&self.calendar_id)
        )
    }

    /// Attach the bearer token and the application identity
    fn authorized(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .bearer_auth(access_token)
            .header(USER_AGENT, self.application_name.as_str())
    }

    async fn list_page(
        &self,
        access_token: &str,
        time_min: &str,
        page_token: Option<&str>,
    ) -> Result<EventList, CalendarApiError> {
        let mut url = Url::parse(&self.events_url())
            .map_err(|e| CalendarApiError::InvalidResponse(format!("Failed to parse URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeMin", time_min);
            query.append_pair("singleEvents", "true");
            query.append_pair("orderBy", "startTime");
            query.append_pair("maxResults", &MAX_LISTED_EVENTS.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let response = self
            .authorized(self.http.get(url), access_token)
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .json::<EventList>()
            .await
            .map_err(|e| CalendarApiError::InvalidResponse(format!("Failed to parse events response: {}", e)))
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn create_event(&self, access_token: &str, request: &EventRequest) -> Result<String, CalendarApiError> {
        let event = self.build_event(request);
        debug!("Inserting event '{}' into calendar {}", request.titulo, self.calendar_id);

        let response = self
            .authorized(self.http.post(self.events_url()), access_token)
            .json(&event)
            .send()
            .await?;
        let response = check_status(response).await?;

        let created: GoogleEvent = response
            .json()
            .await
            .map_err(|e| CalendarApiError::InvalidResponse(format!("Failed to parse created event: {}", e)))?;

        let id = created
            .id
            .ok_or_else(|| CalendarApiError::InvalidResponse("created event has no id".to_string()))?;

        info!("Created event {} in calendar {}", id, self.calendar_id);
        Ok(id)
    }

    async fn delete_event(&self, access_token: &str, event_id: &str) -> Result<(), CalendarApiError> {
        let url = format!("{}/{}", self.events_url(), urlencoding::encode(event_id));

        let response = self
            .authorized(self.http.delete(url), access_token)
            .send()
            .await?;
        check_status(response).await?;

        info!("Deleted event {} from calendar {}", event_id, self.calendar_id);
        Ok(())
    }

    async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
    ) -> Result<Vec<EventSummary>, CalendarApiError> {
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(access_token, &time_min, page_token.as_deref())
                .await?;
            events.extend(page.items.into_iter().map(EventSummary::from));

            match page.next_page_token {
                Some(token) if events.len() < MAX_LISTED_EVENTS => page_token = Some(token),
                _ => break,
            }
        }

        events.truncate(MAX_LISTED_EVENTS);
        debug!("Fetched {} events from calendar {}", events.len(), self.calendar_id);
        Ok(events)
    }
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Turn a non-2xx answer into a status error, preferring Google's own message
async fn check_status(response: Response) -> Result<Response, CalendarApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response".to_string());
    let message = serde_json::from_str::<GoogleErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    Err(CalendarApiError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EventRequest {
        EventRequest {
            titulo: "Consulta".to_string(),
            data_inicio: "2023-12-25T10:00:00".to_string(),
            data_fim: "2023-12-25T11:00:00".to_string(),
            descricao: "Primeira consulta".to_string(),
        }
    }

    #[test]
    fn payload_carries_the_fixed_zone() {
        let client = GoogleCalendarClient::new(Client::new(), "https://example.test/calendar/v3");
        let event = client.build_event(&request());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["summary"], "Consulta");
        assert_eq!(json["description"], "Primeira consulta");
        assert_eq!(json["start"]["dateTime"], "2023-12-25T10:00:00-03:00");
        assert_eq!(json["start"]["timeZone"], "America/Sao_Paulo");
        assert_eq!(json["end"]["dateTime"], "2023-12-25T11:00:00-03:00");
        assert_eq!(json["end"]["timeZone"], "America/Sao_Paulo");
        assert!(json.get("id").is_none());
        assert!(json["start"].get("date").is_none());
    }

    #[test]
    fn events_url_targets_the_primary_calendar() {
        let client = GoogleCalendarClient::new(Client::new(), "https://example.test/calendar/v3/");
        assert_eq!(
            client.events_url(),
            "https://example.test/calendar/v3/calendars/primary/events"
        );

        let client = client.with_calendar_id("team@group.calendar.google.com");
        assert_eq!(
            client.events_url(),
            "https://example.test/calendar/v3/calendars/team%40group.calendar.google.com/events"
        );
    }
}
