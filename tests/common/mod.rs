#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use comment_summarizer::config::{Config, Credentials, RedditEndpoints};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "stub-token";

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn credentials() -> Arc<Credentials> {
    Arc::new(Credentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        user_agent: "comment-summarizer-tests/0.1".into(),
        ai_api_key: "ai-key".into(),
    })
}

pub fn reddit_endpoints(base: &str) -> RedditEndpoints {
    RedditEndpoints {
        auth_url: format!("{base}/api/v1/access_token"),
        api_url: base.to_string(),
    }
}

pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap()
}

/// A full config pointing at stub servers.
pub fn config(reddit_base: &str, ai_base: &str, provider: &str, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("CLIENT_ID", "client-id"),
        ("CLIENT_SECRET", "client-secret"),
        ("USER_AGENT", "comment-summarizer-tests/0.1"),
        ("OPENROUTER_API_KEY", "ai-key"),
        ("GOOGLE_AI_API_KEY", "ai-key"),
        ("AI_PROVIDER", provider),
        ("AI_MODEL", "test-model"),
        ("AI_BASE_URL", ai_base),
        ("REDDIT_API_URL", reddit_base),
        ("REQUEST_TIMEOUT_SECS", "5"),
        ("STATIC_DIR", "public"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert("REDDIT_AUTH_URL".into(), format!("{reddit_base}/api/v1/access_token"));
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(move |key| vars.get(key).cloned()).unwrap()
}

// -------------------------------------------------------------------
// Reddit stub

#[derive(Default)]
pub struct RedditStub {
    /// Comment bodies per user, newest first.
    pub users: HashMap<String, Vec<String>>,
    pub suspended: HashSet<String>,
    pub reject_auth: bool,
    pub listing_status: Option<u16>,
    pub delay: Option<Duration>,
    pub listing_calls: AtomicUsize,
}

impl RedditStub {
    pub fn with_user(mut self, name: &str, comments: &[&str]) -> Self {
        self.users
            .insert(name.to_string(), comments.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_numbered_comments(mut self, name: &str, count: usize) -> Self {
        self.users
            .insert(name.to_string(), (0..count).map(|i| format!("comment {i}")).collect());
        self
    }

    pub async fn spawn(self) -> (String, Arc<RedditStub>) {
        let stub = Arc::new(self);
        let router = Router::new()
            .route("/api/v1/access_token", post(token))
            .route("/user/:name/about", get(about))
            .route("/user/:name/comments", get(comments))
            .with_state(stub.clone());
        (spawn(router).await, stub)
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthorized", "error": 401})),
    )
        .into_response()
}

async fn token(State(stub): State<Arc<RedditStub>>, headers: HeaderMap, body: String) -> Response {
    if let Some(delay) = stub.delay {
        tokio::time::sleep(delay).await;
    }
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    let has_agent = headers.contains_key(header::USER_AGENT);
    if stub.reject_auth || !basic || !has_agent || !body.contains("grant_type=client_credentials") {
        return unauthorized();
    }
    Json(json!({
        "access_token": TOKEN,
        "token_type": "bearer",
        "expires_in": 86400,
        "scope": "*"
    }))
    .into_response()
}

async fn about(
    State(stub): State<Arc<RedditStub>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if stub.suspended.contains(&name) {
        return Json(json!({"kind": "t2", "data": {"name": name, "is_suspended": true}}))
            .into_response();
    }
    if !stub.users.contains_key(&name) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Not Found", "error": 404})),
        )
            .into_response();
    }
    Json(json!({"kind": "t2", "data": {"name": name, "created_utc": 1_600_000_000.0}}))
        .into_response()
}

#[derive(Deserialize)]
struct ListingQuery {
    limit: usize,
    sort: String,
    after: Option<String>,
}

async fn comments(
    State(stub): State<Arc<RedditStub>>,
    Path(name): Path<String>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    stub.listing_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = stub.listing_status {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "listing unavailable").into_response();
    }
    assert_eq!(query.sort, "new");

    let Some(all) = stub.users.get(&name) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": 404}))).into_response();
    };

    let start = query
        .after
        .as_deref()
        .and_then(|a| a.strip_prefix("t1_"))
        .and_then(|i| i.parse::<usize>().ok())
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = (start + query.limit.min(100)).min(all.len());
    let children: Vec<Value> = all[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, body)| json!({"kind": "t1", "data": {"name": format!("t1_{}", start + i), "body": body}}))
        .collect();
    let after = (end < all.len()).then(|| format!("t1_{}", end - 1));

    Json(json!({"kind": "Listing", "data": {"after": after, "children": children}})).into_response()
}

// -------------------------------------------------------------------
// AI provider stub

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct AiStub {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
    pub requests: Mutex<Vec<RecordedRequest>>,
}

impl AiStub {
    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, body.to_string())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn spawn(self) -> (String, Arc<AiStub>) {
        let stub = Arc::new(self);
        let router = Router::new().fallback(respond).with_state(stub.clone());
        (spawn(router).await, stub)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(State(stub): State<Arc<AiStub>>, uri: Uri, headers: HeaderMap, body: String) -> Response {
    stub.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        headers,
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    if let Some(delay) = stub.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(stub.status).unwrap();
    (status, [(header::CONTENT_TYPE, "application/json")], stub.body.clone()).into_response()
}

pub fn openai_reply(content: &str) -> Value {
    json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}, "finishReason": "STOP"}]
    })
}
