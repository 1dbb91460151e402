//! Fetches a Reddit user's recent comments and asks an LLM to summarize them.
//!
//! Two independent operations sit behind a small axum app:
//! - [`reddit::CommentFetcher`] resolves a username and lists its newest comment bodies.
//! - [`summarizer::Summarizer`] sends text plus an instruction to an [`ai::AiProvider`].

pub mod ai;
pub mod api;
pub mod config;
pub mod error;
pub mod reddit;
pub mod summarizer;

use anyhow::{Context, Result};
use axum::http::Method;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::AiClient;
use crate::config::Config;
use crate::reddit::CommentFetcher;
use crate::summarizer::Summarizer;

pub use crate::error::{Failure, FailureKind};

/// Installs the global `tracing` subscriber. Safe to call more than once.
pub fn setup_logging() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Builds the shared HTTP client and both components from a loaded config.
pub fn app_state(config: &Config) -> Result<api::AppState> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("failed to build HTTP client")?;
    let credentials = Arc::new(config.credentials.clone());

    let fetcher = CommentFetcher::new(http.clone(), credentials.clone(), config.reddit.clone());
    let summarizer = Summarizer::new(AiClient::from_settings(http, credentials, &config.ai));

    Ok(api::AppState {
        fetcher,
        summarizer,
        comment_limit: config.comment_limit,
        provider: config.ai.provider.as_str(),
        model: config.ai.model.clone(),
        request_timeout: config.request_timeout,
    })
}

/// The full router: API routes, the static front end, CORS and request tracing.
pub fn app(config: &Config) -> Result<axum::Router> {
    let api_router = api::routes(app_state(config)?);

    let index = config.static_dir.join("index.html");
    let static_service = ServeDir::new(&config.static_dir).not_found_service(ServeFile::new(index));
    // CORS (dev use: allow any origin/method/header)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Ok(axum::Router::new()
        .merge(api_router)
        .fallback_service(static_service)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
