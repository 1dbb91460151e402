mod gemini;
mod openrouter;

pub use gemini::Gemini;
pub use openrouter::OpenRouter;

use reqwest::{Client, Response, StatusCode};
use std::future::Future;
use std::sync::Arc;

use crate::config::{AiSettings, Credentials, ProviderKind};
use crate::error::{Failure, FailureResult};

/// A chat-completion backend: one system turn, one user turn, one answer.
pub trait AiProvider {
    fn complete(&self, system: &str, user: &str) -> impl Future<Output = FailureResult<String>> + Send;
}

/// The adapter selected by `AI_PROVIDER`.
#[derive(Clone)]
pub enum AiClient {
    OpenRouter(OpenRouter),
    Gemini(Gemini),
}

impl AiClient {
    pub fn from_settings(http: Client, credentials: Arc<Credentials>, settings: &AiSettings) -> Self {
        match settings.provider {
            ProviderKind::OpenRouter => AiClient::OpenRouter(OpenRouter::new(
                http,
                credentials,
                &settings.model,
                &settings.base_url,
            )),
            ProviderKind::Gemini => AiClient::Gemini(Gemini::new(
                http,
                credentials,
                &settings.model,
                &settings.base_url,
            )),
        }
    }
}

impl AiProvider for AiClient {
    async fn complete(&self, system: &str, user: &str) -> FailureResult<String> {
        match self {
            AiClient::OpenRouter(p) => p.complete(system, user).await,
            AiClient::Gemini(p) => p.complete(system, user).await,
        }
    }
}

fn require_key<'a>(credentials: &'a Credentials, service: &str, var: &str) -> FailureResult<&'a str> {
    if credentials.ai_api_key.is_empty() {
        return Err(Failure::ConfigurationMissing(format!(
            "The server's {var} for {service} is not configured."
        )));
    }
    Ok(&credentials.ai_api_key)
}

/// Reads a provider response: non-2xx goes through `on_error`, a 2xx body
/// that is not valid JSON for `T` becomes `UpstreamError` with the raw text.
async fn read_json<T, E>(res: Response, service: &str, on_error: E) -> FailureResult<T>
where
    T: serde::de::DeserializeOwned,
    E: FnOnce(StatusCode, String) -> Failure,
{
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| Failure::transport(service, e))?;

    if !status.is_success() {
        tracing::error!(%status, %body, service, "AI provider error");
        return Err(on_error(status, body));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, service, "Failed to deserialize AI provider JSON");
        Failure::UpstreamError {
            status: status.as_u16(),
            body,
        }
    })
}

fn empty_generation(service: &str) -> Failure {
    Failure::EmptyGeneration(format!(
        "{service} generated an empty response, possibly due to a safety filter."
    ))
}
