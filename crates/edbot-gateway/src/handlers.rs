use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use edbot_channels::markdown_to_html;
use edbot_core::context::ABOUT;
use edbot_core::{ChatError, Conversation, ErrorKind, TurnRole};
use edbot_llm::LlmProvider;
use uuid::Uuid;

use super::server::AppState;
use super::sessions::SharedSession;

const INDEX_HTML: &str = include_str!("../static/index.html");
const CONTACT_EMAIL: &str = "info@edstellar.com";
const CONTACT_WEBSITE: &str = "https://www.edstellar.com";

#[derive(serde::Deserialize)]
pub(crate) struct SubmitRequest {
    pub text: String,
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct MessageView {
    role: TurnRole,
    content: String,
    html: String,
}

#[derive(serde::Serialize)]
struct SessionResponse {
    session_id: Uuid,
    messages: Vec<MessageView>,
}

#[derive(serde::Serialize)]
struct SubmitResponse {
    reply: String,
    html: String,
    messages: Vec<MessageView>,
}

#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    variant: &'static str,
    documents: Option<usize>,
    sessions: usize,
}

#[derive(serde::Serialize)]
struct Contact {
    email: &'static str,
    website: &'static str,
}

#[derive(serde::Serialize)]
struct AboutResponse {
    markdown: &'static str,
    html: String,
    contact: Contact,
}

/// JSON error body: `{error, kind, hint}`.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    error: String,
    kind: &'static str,
    hint: Option<&'static str>,
}

impl ApiError {
    fn not_found(id: Uuid) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: format!("session {id} not found"),
            kind: "not_found",
            hint: Some("Start a new session."),
        }
    }

    fn unavailable(error: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: error.to_owned(),
            kind: "unavailable",
            hint: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self {
            status: e.status(),
            error: e.body_text(),
            kind: "input",
            hint: Some("Send a JSON body of the form {\"text\": \"...\"}."),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: e.body_text(),
            kind: "input",
            hint: Some("Session ids are UUIDs returned by POST /api/sessions."),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        let kind = e.kind();
        let status = match kind {
            ErrorKind::Input => StatusCode::BAD_REQUEST,
            ErrorKind::Credential | ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Data => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: e.to_string(),
            kind: kind.as_str(),
            hint: Some(e.hint()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.error,
            "kind": self.kind,
            "hint": self.hint,
        });
        (self.status, Json(body)).into_response()
    }
}

pub(crate) fn message_views(conversation: &Conversation) -> Vec<MessageView> {
    conversation
        .turns()
        .iter()
        .map(|t| MessageView {
            role: t.role(),
            content: t.text().to_owned(),
            html: markdown_to_html(t.text()),
        })
        .collect()
}

pub(crate) async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(crate) async fn health_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        variant: state.resources.variant().as_str(),
        documents: state.resources.indexed_documents(),
        sessions: state.sessions.len().await,
    })
}

pub(crate) async fn about_handler() -> impl IntoResponse {
    Json(AboutResponse {
        markdown: ABOUT,
        html: markdown_to_html(ABOUT),
        contact: Contact {
            email: CONTACT_EMAIL,
            website: CONTACT_WEBSITE,
        },
    })
}

pub(crate) async fn create_session_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some((session_id, session)) = state
        .sessions
        .create(std::sync::Arc::clone(&state.resources))
        .await
    else {
        return Err(ApiError::unavailable("too many active sessions"));
    };
    tracing::debug!(%session_id, "session created");

    let messages = message_views(session.lock().await.conversation());
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            messages,
        }),
    ))
}

async fn lookup<P: LlmProvider + 'static>(
    state: &AppState<P>,
    session_id: Uuid,
) -> Result<SharedSession<P>, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::not_found(session_id))
}

pub(crate) async fn get_session_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(session_id) = path?;
    let session = lookup(&state, session_id).await?;
    let messages = message_views(session.lock().await.conversation());
    Ok(Json(SessionResponse {
        session_id,
        messages,
    }))
}

pub(crate) async fn delete_session_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(session_id) = path?;
    if !state.sessions.remove(session_id).await {
        return Err(ApiError::not_found(session_id));
    }
    tracing::debug!(%session_id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn submit_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(session_id) = path?;
    let Json(req) = body?;
    let session = lookup(&state, session_id).await?;

    let mut session = session.lock().await;
    let reply = session.submit(&req.text).await?;
    Ok(Json(SubmitResponse {
        html: markdown_to_html(&reply),
        reply,
        messages: message_views(session.conversation()),
    }))
}

pub(crate) async fn reset_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(session_id) = path?;
    let session = lookup(&state, session_id).await?;

    let mut session = session.lock().await;
    session.reset();
    Ok(Json(SessionResponse {
        session_id,
        messages: message_views(session.conversation()),
    }))
}
