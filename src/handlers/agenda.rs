use super::{AppState, CurrentSession};
use crate::components::google_calendar::EventRequest;
use crate::config::StatusPolicy;
use crate::gateway::Reply;
use axum::{
    extract::{Extension, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

/// POST /agenda/criar
pub async fn create_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(request): Json<EventRequest>,
) -> Response {
    let reply = state.gateway.create_event(session.principal(), &request).await;
    reply_response(reply, state.security.status_policy)
}

/// DELETE /agenda/deletar/{id}
pub async fn delete_event_handler(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Response {
    let reply = state.gateway.delete_event(session.principal(), &id).await;
    reply_response(reply, state.security.status_policy)
}

/// GET /agenda/listar
///
/// The dashboard redirects to the login page on 401, so failures here are
/// always mapped to real status codes.
pub async fn list_events_handler(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Response {
    match state.gateway.list_events(session.principal(), Utc::now()).await {
        Ok(events) => Json(events).into_response(),
        Err(reply) => reply_response(reply, StatusPolicy::Mapped),
    }
}

fn reply_response(reply: Reply, policy: StatusPolicy) -> Response {
    (reply.status(policy), reply.body).into_response()
}
