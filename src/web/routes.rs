//! HTTP surface: HTML chat page plus a JSON API over the same sessions.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::error::SessionError;
use crate::preferences::{DisplayInstruction, PreferenceCollector, SessionState, TurnOutcome};
use crate::session::SessionStore;

use super::page::{ChatPage, DebugView, Templates};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<PreferenceCollector>,
    pub sessions: Arc<SessionStore>,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(
        collector: Arc<PreferenceCollector>,
        session_idle_timeout: Duration,
    ) -> Result<Self, minijinja::Error> {
        Ok(Self {
            collector,
            sessions: SessionStore::new(session_idle_timeout),
            templates: Arc::new(Templates::new()?),
        })
    }
}

/// Build the application router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(index))
        .route("/sessions/{id}", get(show_session).post(submit_form))
        .route("/sessions/{id}/end", post(end_session))
        .route("/api/sessions", post(api_create_session))
        .route(
            "/api/sessions/{id}",
            get(api_get_session).delete(api_delete_session),
        )
        .route("/api/sessions/{id}/messages", post(api_submit_message))
        .route("/api/sessions/{id}/debug", get(api_debug))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Handler-level failures.
#[derive(Debug)]
pub enum WebError {
    Session(SessionError),
    Render(minijinja::Error),
}

impl From<SessionError> for WebError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

impl From<minijinja::Error> for WebError {
    fn from(e: minijinja::Error) -> Self {
        Self::Render(e)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::Session(e @ SessionError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response(),
            Self::Session(e) => (
                StatusCode::CONFLICT,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response(),
            Self::Render(e) => {
                error!("Failed to render template: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

// ── Turn handling ───────────────────────────────────────────────────────

/// Run one turn against a stored session, holding its lock for the duration.
async fn run_turn(state: &AppState, id: Uuid, message: &str) -> Result<TurnOutcome, WebError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    let outcome = state.collector.submit(session.clone(), message).await;
    *session = outcome.state.clone();
    Ok(outcome)
}

fn error_text(display: &[DisplayInstruction]) -> Option<String> {
    display.iter().find_map(|d| match d {
        DisplayInstruction::Error { message } => Some(message.clone()),
        _ => None,
    })
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "orchestra-search"
    }))
}

// ── HTML ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
}

async fn index(State(state): State<AppState>) -> Redirect {
    let id = state.sessions.insert(state.collector.new_session()).await;
    Redirect::to(&format!("/sessions/{id}"))
}

async fn show_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, WebError> {
    let session = state.sessions.snapshot(id).await?;
    render(&state, &session, None)
}

/// Post/redirect/get: a refresh after a successful turn re-fetches the page
/// instead of re-submitting. Failed turns render in place with the banner.
async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ChatForm>,
) -> Result<Response, WebError> {
    let outcome = run_turn(&state, id, &form.message).await?;
    match error_text(&outcome.display) {
        Some(error) => Ok(render(&state, &outcome.state, Some(error))?.into_response()),
        None => Ok(Redirect::to(&format!("/sessions/{id}")).into_response()),
    }
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, WebError> {
    state.sessions.remove(id).await?;
    Ok(Redirect::to("/"))
}

fn render(
    state: &AppState,
    session: &SessionState,
    error: Option<String>,
) -> Result<Html<String>, WebError> {
    let page = ChatPage::new(state.collector.schema(), session, error);
    Ok(Html(state.templates.render_chat(&page)?))
}

// ── JSON API ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SessionResponse {
    id: Uuid,
    state: SessionState,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    state: SessionState,
    display: Vec<DisplayInstruction>,
}

async fn api_create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.collector.new_session();
    let id = state.sessions.insert(session.clone()).await;
    (
        StatusCode::CREATED,
        Json(SessionResponse { id, state: session }),
    )
}

async fn api_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionState>, WebError> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// Turn failures are part of the conversation, so they come back as 200
/// with a `DisplayInstruction::Error` rather than an HTTP error.
async fn api_submit_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<TurnResponse>, WebError> {
    let outcome = run_turn(&state, id, &request.message).await?;
    Ok(Json(TurnResponse {
        state: outcome.state,
        display: outcome.display,
    }))
}

async fn api_debug(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DebugView>, WebError> {
    let session = state.sessions.snapshot(id).await?;
    Ok(Json(DebugView::from_state(&session)))
}

async fn api_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
