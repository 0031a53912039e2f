mod client;
pub mod models;
mod time;

pub use client::{CalendarClient, GoogleCalendarClient};
pub use models::{EventRequest, EventSummary, GoogleEvent};
pub use time::EventZone;
