use crate::ai::AiProvider;
use crate::error::{Failure, FailureResult};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const SAMPLE_SEPARATOR: &str = "\n\nHere is the user's writing sample from Reddit to analyze:\n---\n";

/// Turns a block of text plus an instruction into one provider call.
#[derive(Clone)]
pub struct Summarizer<P> {
    provider: P,
}

impl<P: AiProvider> Summarizer<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Empty `text` is forwarded as-is; deciding whether that is acceptable is
    /// up to the caller.
    pub async fn summarize(&self, text: &str, prompt: &str) -> FailureResult<String> {
        let user = compose_user_message(prompt, text);
        tracing::info!(
            text_len = text.len(),
            prompt_len = prompt.len(),
            "Requesting AI summary"
        );

        let summary = self
            .provider
            .complete(SYSTEM_PROMPT, &user)
            .await
            .inspect_err(|e| tracing::error!(error = %e, kind = e.kind().as_str(), "Failed to summarize content"))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(Failure::EmptyGeneration(
                "The AI model generated an empty response, possibly due to a safety filter.".into(),
            ));
        }
        Ok(summary.to_string())
    }
}

pub fn compose_user_message(prompt: &str, text: &str) -> String {
    format!("{prompt}{SAMPLE_SEPARATOR}{text}")
}
