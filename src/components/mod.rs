// Export components
pub mod credentials;
pub mod google_calendar;
pub mod oauth;
pub mod session;

pub use credentials::{AuthorizedClientStore, CredentialResolver, Principal};
pub use google_calendar::{CalendarClient, GoogleCalendarClient};
