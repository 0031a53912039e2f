use super::AppState;
use crate::components::credentials::Principal;
use crate::components::session::{Session, CSRF_COOKIE, CSRF_HEADER, SESSION_COOKIE};
use crate::utils::i18n;
use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, warn};

/// Session the request's cookie points at, if it is still live
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref().map(|s| &s.principal)
    }
}

/// Resolve the session cookie and enforce CSRF when it is switched on.
///
/// Never redirects: handlers decide what a missing session means for them.
/// With CSRF on, the session's token is handed to the browser in the
/// `XSRF-TOKEN` cookie whenever the browser does not hold it yet.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.get(cookie.value()).await,
        None => None,
    };

    if state.security.csrf_enabled && requires_csrf(&req) {
        let presented = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok());
        let expected = session.as_ref().map(|s| s.csrf_token.as_str());

        if presented.is_none() || presented != expected {
            warn!("Rejected {} {} without a valid CSRF token", req.method(), req.uri().path());
            return (StatusCode::FORBIDDEN, i18n::csrf_rejected()).into_response();
        }
    }

    if let Some(session) = &session {
        debug!("Request from principal {}", session.principal.name);
    }

    let missing_csrf_cookie = match (&session, state.security.csrf_enabled) {
        (Some(session), true) => jar
            .get(CSRF_COOKIE)
            .map_or(true, |cookie| cookie.value() != session.csrf_token),
        _ => false,
    };
    let csrf_token = session.as_ref().map(|s| s.csrf_token.clone());

    req.extensions_mut().insert(CurrentSession(session));
    let response = next.run(req).await;

    match csrf_token {
        Some(token) if missing_csrf_cookie && !sets_csrf_cookie(&response) => {
            (jar.add(csrf_cookie(&token)), response).into_response()
        }
        _ => response,
    }
}

/// Whether the handler already set or expired the CSRF cookie itself
fn sets_csrf_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&format!("{}=", CSRF_COOKIE)))
}

/// Cookie the dashboard's scripts read the CSRF token from, so not `HttpOnly`
pub(crate) fn csrf_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token.to_string()))
        .path("/")
        .same_site(SameSite::Lax)
        .build()
}

/// State-changing requests under the protected paths
fn requires_csrf(req: &Request) -> bool {
    let method = req.method();
    let safe = method == Method::GET || method == Method::HEAD || method == Method::OPTIONS;
    let path = req.uri().path();
    !safe && (path.starts_with("/agenda") || path == "/logout")
}
