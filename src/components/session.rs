use super::credentials::Principal;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "SESSION";
/// Header carrying the CSRF token when CSRF protection is on
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
/// Script-readable cookie handing the CSRF token to the browser
pub const CSRF_COOKIE: &str = "XSRF-TOKEN";

/// Logins that never come back from Google are forgotten after this
const PENDING_LOGIN_TTL_MINUTES: i64 = 10;
/// Sessions idle for longer than this are logged out
const SESSION_IDLE_TTL_MINUTES: i64 = 30;

/// Authenticated browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub principal: Principal,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    /// Last request seen with this session
    pub last_seen: DateTime<Utc>,
}

impl Session {
    fn is_idle(&self, now: DateTime<Utc>) -> bool {
        now - self.last_seen >= Duration::minutes(SESSION_IDLE_TTL_MINUTES)
    }
}

/// Login started at the authorization endpoint and not yet completed
#[derive(Debug, Clone)]
pub struct PendingLogin {
    /// Path the user asked to return to, if any
    pub return_to: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// In-memory sessions and pending logins
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    pending: Arc<RwLock<HashMap<String, PendingLogin>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a principal that just logged in
    pub async fn create(&self, principal: Principal) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            principal,
            csrf_token: Uuid::new_v4().to_string(),
            created_at: now,
            last_seen: now,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_idle(now));
        sessions.insert(session.id.clone(), session.clone());
        session
    }

    /// Look up a live session and mark it as used
    pub async fn get(&self, id: &str) -> Option<Session> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        let session = sessions.get_mut(id)?;
        if session.is_idle(now) {
            debug!(
                "Session of {} expired after being open since {}",
                session.principal.name, session.created_at
            );
            sessions.remove(id);
            return None;
        }
        session.last_seen = now;
        Some(session.clone())
    }

    /// Whether the principal still has a live session anywhere
    pub async fn has_live_session(&self, principal: &Principal) -> bool {
        let now = Utc::now();
        self.sessions
            .read()
            .await
            .values()
            .any(|s| &s.principal == principal && !s.is_idle(now))
    }

    pub async fn remove(&self, id: &str) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    /// Remember a login attempt and return its state parameter
    pub async fn begin_login(&self, return_to: Option<String>) -> String {
        let state = Uuid::new_v4().to_string();
        let now = Utc::now();
        let mut pending = self.pending.write().await;

        pending.retain(|_, login| now - login.started_at < Duration::minutes(PENDING_LOGIN_TTL_MINUTES));
        pending.insert(
            state.clone(),
            PendingLogin {
                return_to,
                started_at: now,
            },
        );
        state
    }

    /// Consume the login attempt matching a state parameter
    pub async fn complete_login(&self, state: &str) -> Option<PendingLogin> {
        let login = self.pending.write().await.remove(state)?;
        let age = Utc::now() - login.started_at;
        (age < Duration::minutes(PENDING_LOGIN_TTL_MINUTES)).then_some(login)
    }
}
