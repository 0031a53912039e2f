use super::models::EventDateTime;
use crate::config::{DEFAULT_EVENT_TIMEZONE, DEFAULT_EVENT_UTC_OFFSET};

/// Fixed zone every created event is pinned to.
///
/// The offset is appended to the local literal as-is; there is no
/// daylight-saving adjustment and no validation of the literal itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventZone {
    pub label: String,
    pub utc_offset: String,
}

impl Default for EventZone {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_TIMEZONE, DEFAULT_EVENT_UTC_OFFSET)
    }
}

impl EventZone {
    pub fn new(label: impl Into<String>, utc_offset: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            utc_offset: utc_offset.into(),
        }
    }

    /// Pin a local date-time literal to this zone
    pub fn event_date_time(&self, local: &str) -> EventDateTime {
        EventDateTime {
            date_time: Some(format!("{}{}", local, self.utc_offset)),
            date: None,
            time_zone: Some(self.label.clone()),
        }
    }
}
