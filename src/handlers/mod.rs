pub mod agenda;
pub mod auth;
pub mod middleware;

use crate::components::credentials::AuthorizedClientStore;
use crate::components::oauth::GoogleOAuthClient;
use crate::components::session::SessionStore;
use crate::config::SecurityConfig;
use crate::gateway::EventGateway;
use std::sync::Arc;

pub use agenda::{create_event_handler, delete_event_handler, list_events_handler};
pub use auth::{authorization_handler, callback_handler, login_success_handler, logout_handler};
pub use middleware::{session_middleware, CurrentSession};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<EventGateway>,
    /// Browser sessions and pending logins
    pub sessions: SessionStore,
    /// Where completed logins leave their tokens
    pub clients: AuthorizedClientStore,
    pub oauth: Arc<GoogleOAuthClient>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    pub fn new(
        gateway: EventGateway,
        sessions: SessionStore,
        clients: AuthorizedClientStore,
        oauth: GoogleOAuthClient,
        security: SecurityConfig,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            sessions,
            clients,
            oauth: Arc::new(oauth),
            security: Arc::new(security),
        }
    }
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
