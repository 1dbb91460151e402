use crate::ai::AiClient;
use crate::error::Failure;
use crate::reddit::CommentFetcher;
use crate::summarizer::Summarizer;
use axum::{
    extract::{Json as JsonPayload, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const COMMENT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Clone)]
pub struct AppState {
    pub fetcher: CommentFetcher,
    pub summarizer: Summarizer<AiClient>,
    pub comment_limit: usize,
    pub provider: &'static str,
    pub model: String,
    pub request_timeout: Duration,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/fetch_comments", post(fetch_comments))
        .route("/get_summary", post(get_summary))
        .route("/status", get(status))
        .with_state(Arc::new(state))
}

// -------------------------------------------------------------------
// Comments

async fn fetch_comments(
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<FetchCommentsRequest>,
) -> Result<Json<FetchCommentsResponse>, ApiError> {
    let username = payload.username.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() {
        return Err(ApiError::bad_request("username_missing", "Reddit username is required."));
    }

    let comments = state.fetcher.fetch(username, state.comment_limit).await?;
    if comments.is_empty() {
        return Err(ApiError::not_found(
            "no_comments",
            "This user has no recent comments to analyze.",
        ));
    }

    Ok(Json(FetchCommentsResponse {
        comment_count: comments.len(),
        comments_text: join_comments(&comments),
    }))
}

pub fn join_comments(comments: &[String]) -> String {
    comments.join(COMMENT_SEPARATOR)
}

// -------------------------------------------------------------------
// Summary

async fn get_summary(
    State(state): State<Arc<AppState>>,
    JsonPayload(payload): JsonPayload<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let prompt = payload.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("prompt_missing", "A prompt is required."));
    }
    let text = payload.comments_text.unwrap_or_default();

    let summary = state.summarizer.summarize(&text, prompt).await?;
    Ok(Json(SummaryResponse { summary }))
}

// -------------------------------------------------------------------
// Status

#[derive(Serialize)]
struct StatusInfo {
    provider: &'static str,
    model: String,
    comment_limit: usize,
    request_timeout_secs: u64,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusInfo> {
    Json(StatusInfo {
        provider: state.provider,
        model: state.model.clone(),
        comment_limit: state.comment_limit,
        request_timeout_secs: state.request_timeout.as_secs(),
    })
}

// -------------------------------------------------------------------
// DTOs & errors

#[derive(Deserialize)]
struct FetchCommentsRequest {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Serialize)]
struct FetchCommentsResponse {
    comments_text: String,
    comment_count: usize,
}

#[derive(Deserialize)]
struct SummaryRequest {
    #[serde(default)]
    comments_text: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }
    fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, msg)
    }
    fn not_found(code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, msg)
    }
}

/// Every core failure is a 400 carrying its message; the kind goes in `code`.
impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        tracing::warn!(kind = failure.kind().as_str(), error = %failure, "Request failed");
        Self::bad_request(failure.kind().as_str(), failure.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorBody { error: self.message, code: self.code });
        (self.status, body).into_response()
    }
}
