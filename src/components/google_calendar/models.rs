use serde::{Deserialize, Serialize};

/// Event creation request as posted by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventRequest {
    pub titulo: String,
    /// Local date-time literal without zone, e.g. `2023-12-25T10:00:00`
    pub data_inicio: String,
    pub data_fim: String,
    pub descricao: String,
}

/// Start or end of a Google Calendar event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// All-day events carry a date instead of a date-time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Event resource of the Google Calendar v3 API, reduced to what we touch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
}

/// One page of `events.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
}

/// Event as the dashboard calendar renders it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub titulo: String,
    pub inicio: Option<String>,
    pub fim: Option<String>,
}

impl From<GoogleEvent> for EventSummary {
    fn from(event: GoogleEvent) -> Self {
        let pick = |time: Option<EventDateTime>| time.and_then(|t| t.date_time.or(t.date));
        Self {
            id: event.id.unwrap_or_default(),
            titulo: event.summary.unwrap_or_default(),
            inicio: pick(event.start),
            fim: pick(event.end),
        }
    }
}
