use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{empty_generation, read_json, require_key, AiProvider};
use crate::config::Credentials;
use crate::error::{Failure, FailureResult};

const SERVICE: &str = "Google AI";

/// Google Gemini `generateContent` adapter.
#[derive(Clone)]
pub struct Gemini {
    http: Client,
    credentials: Arc<Credentials>,
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl Gemini {
    pub fn new(http: Client, credentials: Arc<Credentials>, model: &str, base_url: &str) -> Self {
        Self {
            http,
            credentials,
            url: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        }
    }
}

impl AiProvider for Gemini {
    async fn complete(&self, system: &str, user: &str) -> FailureResult<String> {
        let api_key = require_key(&self.credentials, SERVICE, "GOOGLE_AI_API_KEY")?;

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part { text: system }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: user }],
            }],
        };

        let res = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::transport(SERVICE, e))
            .inspect_err(|e| tracing::error!(error = %e, "Google AI API call failed (HTTP)"))?;

        let parsed: GenerateResponse = read_json(res, SERVICE, classify).await?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| empty_generation("The AI model"))
    }
}

fn classify(status: StatusCode, body: String) -> Failure {
    // Google answers a bad key with 400 API_KEY_INVALID rather than 401.
    let bad_key = status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID");
    if bad_key || matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Failure::AuthenticationFailure(
            "Authentication with Google AI failed. The GOOGLE_AI_API_KEY is likely invalid.".into(),
        );
    }
    Failure::UpstreamError {
        status: status.as_u16(),
        body,
    }
}
