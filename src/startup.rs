use crate::components::credentials::AuthorizedClientStore;
use crate::components::google_calendar::GoogleCalendarClient;
use crate::components::oauth::GoogleOAuthClient;
use crate::components::session::SessionStore;
use crate::config::Config;
use crate::error::{other_error, AgendaResult, Error};
use crate::gateway::EventGateway;
use crate::handlers::{
    authorization_handler, callback_handler, create_event_handler, delete_event_handler,
    health_handler, list_events_handler, login_success_handler, logout_handler,
    session_middleware, AppState,
};
use crate::shutdown;
use crate::utils::i18n;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the service configuration
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the production collaborators together
pub fn build_state(config: &Config) -> AgendaResult<AppState> {
    let clients = AuthorizedClientStore::new();
    let calendar = GoogleCalendarClient::from_config(config)?;
    let oauth = GoogleOAuthClient::from_config(config)?;

    let gateway = EventGateway::new(Arc::new(clients.clone()), Arc::new(calendar))
        .with_delete_guard(config.security.require_login_for_delete);

    Ok(AppState::new(
        gateway,
        SessionStore::new(),
        clients,
        oauth,
        config.security.clone(),
    ))
}

/// Build the HTTP routes around the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/agenda/criar", post(create_event_handler))
        .route("/agenda/deletar/{id}", delete(delete_event_handler))
        .route("/agenda/listar", get(list_events_handler))
        .route("/oauth2/authorization/google", get(authorization_handler))
        .route("/login/oauth2/code/google", get(callback_handler))
        .route("/loginGoogle", get(login_success_handler))
        .route("/logout", post(logout_handler))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run(config: Config) -> miette::Result<()> {
    i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    if config.security.csrf_enabled {
        info!("CSRF protection enabled for agenda requests");
    } else {
        info!("CSRF protection disabled");
    }

    let addr = config.socket_addr()?;
    let state = build_state(&config)?;
    let app = build_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}
