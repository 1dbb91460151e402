use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{empty_generation, read_json, require_key, AiProvider};
use crate::config::Credentials;
use crate::error::{Failure, FailureResult};

const SERVICE: &str = "OpenRouter";

/// OpenAI-compatible `/chat/completions` adapter (OpenRouter, Groq, OpenAI).
#[derive(Clone)]
pub struct OpenRouter {
    http: Client,
    credentials: Arc<Credentials>,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenRouter {
    pub fn new(http: Client, credentials: Arc<Credentials>, model: &str, base_url: &str) -> Self {
        Self {
            http,
            credentials,
            model: model.to_string(),
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        }
    }
}

impl AiProvider for OpenRouter {
    async fn complete(&self, system: &str, user: &str) -> FailureResult<String> {
        let api_key = require_key(&self.credentials, SERVICE, "OPENROUTER_API_KEY")?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: false,
        };

        tracing::debug!(model = %self.model, "Sending chat completion request");
        let res = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::transport(SERVICE, e))
            .inspect_err(|e| tracing::error!(error = %e, "OpenRouter API call failed (HTTP)"))?;

        let parsed: ChatResponse = read_json(res, SERVICE, classify).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| empty_generation(SERVICE))
    }
}

fn classify(status: StatusCode, body: String) -> Failure {
    match status {
        // 402: credits exhausted on the key.
        StatusCode::UNAUTHORIZED | StatusCode::PAYMENT_REQUIRED | StatusCode::FORBIDDEN => {
            Failure::AuthenticationFailure(format!(
                "Authentication with OpenRouter failed. The OPENROUTER_API_KEY is likely invalid or out of credits. ({})",
                status.as_u16()
            ))
        }
        _ => Failure::UpstreamError {
            status: status.as_u16(),
            body,
        },
    }
}
