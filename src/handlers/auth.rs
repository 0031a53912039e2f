use super::middleware::csrf_cookie;
use super::{AppState, CurrentSession};
use crate::components::credentials::{AuthorizedClient, Principal, GOOGLE_REGISTRATION_ID};
use crate::components::session::{CSRF_COOKIE, SESSION_COOKIE};
use crate::config::StatusPolicy;
use crate::error::AgendaResult;
use crate::utils::i18n;
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

/// Query of the login entry point
#[derive(Debug, Deserialize)]
pub struct AuthorizationQuery {
    /// Local path to come back to after login
    #[serde(rename = "continue")]
    pub continue_to: Option<String>,
}

/// Query Google sends back to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /oauth2/authorization/google
pub async fn authorization_handler(
    State(state): State<AppState>,
    Query(query): Query<AuthorizationQuery>,
) -> Response {
    let return_to = query.continue_to.filter(|path| is_local_path(path));
    let login_state = state.sessions.begin_login(return_to).await;

    match state.oauth.authorization_url(&login_state) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            error!("Failed to build authorization URL: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, i18n::login_failed(&e.to_string())).into_response()
        }
    }
}

/// GET /login/oauth2/code/google
pub async fn callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let pending = match query.state.as_deref() {
        Some(login_state) => state.sessions.complete_login(login_state).await,
        None => None,
    };
    let Some(pending) = pending else {
        warn!("OAuth2 callback with unknown or expired state");
        return (StatusCode::BAD_REQUEST, i18n::login_invalid_state()).into_response();
    };

    if let Some(denied) = query.error {
        warn!("Google login was not granted: {}", denied);
        return (StatusCode::UNAUTHORIZED, i18n::login_failed(&denied)).into_response();
    }

    let Some(code) = query.code else {
        return (StatusCode::BAD_REQUEST, i18n::login_failed("missing authorization code"))
            .into_response();
    };

    let principal = match authorize_principal(&state, &code).await {
        Ok(principal) => principal,
        Err(e) => {
            error!("Failed to complete Google login: {:?}", e);
            return (StatusCode::UNAUTHORIZED, i18n::login_failed(&e.to_string())).into_response();
        }
    };

    let session = state.sessions.create(principal).await;
    info!("Opened session for principal {}", session.principal.name);

    let cookie = Cookie::build((SESSION_COOKIE, session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    let mut jar = jar.add(cookie);
    if state.security.csrf_enabled {
        jar = jar.add(csrf_cookie(&session.csrf_token));
    }

    let target = match pending.return_to {
        Some(path) if !state.security.always_use_default_success_url => path,
        _ => state.security.default_success_url.clone(),
    };

    (jar, Redirect::to(&target)).into_response()
}

/// GET /loginGoogle
pub async fn login_success_handler(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    match session.principal() {
        Some(principal) => (StatusCode::OK, i18n::login_welcome(&principal.name)).into_response(),
        None => {
            let status = match state.security.status_policy {
                StatusPolicy::Mapped => StatusCode::UNAUTHORIZED,
                StatusPolicy::Legacy => StatusCode::OK,
            };
            (status, i18n::not_logged_in()).into_response()
        }
    }
}

/// POST /logout
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    if let Some(session) = session.0 {
        let principal = &session.principal;
        state.sessions.remove(&session.id).await;

        // Tokens are shared by every session of the principal
        if state.sessions.has_live_session(principal).await {
            debug!("Principal {} still has open sessions, keeping its tokens", principal.name);
        } else {
            state
                .clients
                .remove_authorized_client(&principal.registration_id, &principal.name)
                .await;
        }
        info!("Closed session for principal {}", principal.name);
    }

    let jar = jar
        .remove(Cookie::build(SESSION_COOKIE).path("/").build())
        .remove(Cookie::build(CSRF_COOKIE).path("/").build());
    (jar, Redirect::to("/")).into_response()
}

/// Exchange the code, learn who logged in and keep their tokens
async fn authorize_principal(state: &AppState, code: &str) -> AgendaResult<Principal> {
    let token = state.oauth.exchange_code(code).await?;
    let name = state.oauth.fetch_principal_name(&token.access_token).await?;
    let principal = Principal::new(GOOGLE_REGISTRATION_ID, name);

    state
        .clients
        .save_authorized_client(AuthorizedClient {
            principal: principal.clone(),
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at(),
            scopes: token.scopes(),
        })
        .await;

    Ok(principal)
}

/// Only same-origin paths are accepted as return targets
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}
