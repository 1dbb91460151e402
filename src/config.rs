use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_COMMENT_LIMIT: usize = 1000;
/// Reddit stops serving a user listing after this many items.
pub const MAX_COMMENT_LIMIT: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

pub const DEFAULT_REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_REDDIT_API_URL: &str = "https://oauth.reddit.com";

/// The four secrets the process needs. Read once at startup, never mutated.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub ai_api_key: String,
}

// Hand-written so secrets never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("ai_api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenRouter,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
            ProviderKind::Gemini => "GOOGLE_AI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "mistralai/mistral-7b-instruct:free",
            ProviderKind::Gemini => "gemini-1.5-flash-latest",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openrouter" | "openai" => Ok(ProviderKind::OpenRouter),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(anyhow!("unknown AI_PROVIDER '{other}' (expected openrouter or gemini)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub auth_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub ai: AiSettings,
    pub reddit: RedditEndpoints,
    pub comment_limit: usize,
    pub request_timeout: Duration,
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{key} is not configured"));

        let provider = match get("AI_PROVIDER") {
            Some(raw) => raw.parse::<ProviderKind>()?,
            None => ProviderKind::OpenRouter,
        };

        let credentials = Credentials {
            client_id: require("CLIENT_ID")?,
            client_secret: require("CLIENT_SECRET")?,
            user_agent: require("USER_AGENT")?,
            ai_api_key: require(provider.api_key_var())?,
        };

        let ai = AiSettings {
            provider,
            model: get("AI_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: get("AI_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        let reddit = RedditEndpoints {
            auth_url: get("REDDIT_AUTH_URL").unwrap_or_else(|| DEFAULT_REDDIT_AUTH_URL.to_string()),
            api_url: get("REDDIT_API_URL")
                .unwrap_or_else(|| DEFAULT_REDDIT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        };

        let comment_limit = match get("COMMENT_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("invalid COMMENT_LIMIT '{raw}'"))?,
            None => DEFAULT_COMMENT_LIMIT,
        };

        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("invalid REQUEST_TIMEOUT_SECS '{raw}'"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid PORT '{raw}'"))?,
            None => 8080,
        };

        Ok(Self {
            credentials,
            ai,
            reddit,
            comment_limit: clamp_limit(comment_limit),
            request_timeout: Duration::from_secs(timeout_secs),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            static_dir: PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "public".to_string())),
        })
    }
}

/// Keeps a requested listing size inside what Reddit will actually serve.
pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(1, MAX_COMMENT_LIMIT)
}
