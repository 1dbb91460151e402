use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{clamp_limit, Credentials, RedditEndpoints};
use crate::error::{Failure, FailureResult};

/// Reddit never returns more than this many items per listing page.
const PAGE_SIZE: usize = 100;

/// Pulls a user's newest comment bodies from Reddit's OAuth API.
///
/// Every call authenticates from scratch, checks that the account exists and
/// then walks the `/comments` listing newest-first until `limit` bodies are
/// collected or Reddit runs out. Nothing is cached between calls.
#[derive(Clone)]
pub struct CommentFetcher {
    http: Client,
    credentials: Arc<Credentials>,
    endpoints: RedditEndpoints,
}

#[derive(Deserialize)]
struct AccessToken {
    access_token: Option<String>,
    // Reddit sends either a string ("invalid_grant") or a bare status code.
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct About {
    data: AboutData,
}

#[derive(Deserialize)]
struct AboutData {
    created_utc: Option<f64>,
    #[serde(default)]
    is_suspended: bool,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Deserialize)]
struct Thing {
    data: CommentData,
}

#[derive(Deserialize)]
struct CommentData {
    #[serde(default)]
    body: String,
}

impl CommentFetcher {
    pub fn new(http: Client, credentials: Arc<Credentials>, endpoints: RedditEndpoints) -> Self {
        Self {
            http,
            credentials,
            endpoints,
        }
    }

    /// Returns up to `limit` comment bodies for `username`, newest first.
    ///
    /// An empty vector means the account exists but has no comments; a
    /// missing account is always [`Failure::UserNotFound`]. `limit` is clamped
    /// to `1..=1000`, so a zero limit still asks for the newest comment.
    pub async fn fetch(&self, username: &str, limit: usize) -> FailureResult<Vec<String>> {
        self.ensure_configured()?;

        let name = normalize_username(username).ok_or_else(|| not_found(username.trim()))?;
        let limit = clamp_limit(limit);

        tracing::info!(username = %name, limit, "Fetching Reddit comments");

        let token = self.access_token().await?;
        self.ensure_user_exists(&token, name).await?;

        let mut bodies = Vec::with_capacity(limit.min(PAGE_SIZE));
        let mut after: Option<String> = None;

        while bodies.len() < limit {
            let page_size = (limit - bodies.len()).min(PAGE_SIZE);
            let page = self.comments_page(&token, name, page_size, after.as_deref()).await?;

            let received = page.children.len();
            bodies.extend(page.children.into_iter().map(|c| c.data.body));

            match page.after {
                Some(cursor) if received > 0 => after = Some(cursor),
                _ => break,
            }
        }
        bodies.truncate(limit);

        tracing::info!(username = %name, count = bodies.len(), "Fetched Reddit comments");
        Ok(bodies)
    }

    fn ensure_configured(&self) -> FailureResult<()> {
        let creds = &self.credentials;
        if creds.client_id.is_empty() || creds.client_secret.is_empty() {
            return Err(Failure::ConfigurationMissing(
                "Reddit API credentials are not configured on the server.".into(),
            ));
        }
        if creds.user_agent.is_empty() {
            return Err(Failure::ConfigurationMissing(
                "The Reddit USER_AGENT is not configured on the server.".into(),
            ));
        }
        Ok(())
    }

    async fn access_token(&self) -> FailureResult<String> {
        let res = self
            .http
            .post(&self.endpoints.auth_url)
            .header(header::USER_AGENT, &self.credentials.user_agent)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Failure::transport("Reddit", e))
            .inspect_err(|e| tracing::error!(error = %e, "Reddit token request failed"))?;

        let res = check_status(res, None).await?;
        let token: AccessToken = decode(res).await?;

        match token.access_token {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(auth_failure(&token.error.map_or_else(
                || "no access token returned".to_string(),
                |e| e.to_string(),
            ))),
        }
    }

    async fn ensure_user_exists(&self, token: &str, name: &str) -> FailureResult<()> {
        let url = format!("{}/user/{}/about", self.endpoints.api_url, name);
        let res = self
            .get(&url, token)
            .query(&[("raw_json", "1")])
            .send()
            .await
            .map_err(|e| Failure::transport("Reddit", e))?;

        let res = check_status(res, Some(name)).await?;
        let about: About = decode(res).await?;

        // Suspended accounts still answer /about, but without any profile data.
        if about.data.is_suspended || about.data.created_utc.is_none() {
            tracing::warn!(username = %name, "Reddit account is suspended or unavailable");
            return Err(not_found(name));
        }
        Ok(())
    }

    async fn comments_page(
        &self,
        token: &str,
        name: &str,
        page_size: usize,
        after: Option<&str>,
    ) -> FailureResult<ListingData> {
        let url = format!("{}/user/{}/comments", self.endpoints.api_url, name);
        let page_size = page_size.to_string();
        let mut query = vec![
            ("sort", "new"),
            ("limit", page_size.as_str()),
            ("raw_json", "1"),
        ];
        if let Some(after) = after {
            query.push(("after", after));
        }

        let res = self
            .get(&url, token)
            .query(&query)
            .send()
            .await
            .map_err(|e| Failure::transport("Reddit", e))?;

        let res = check_status(res, Some(name)).await?;
        let listing: Listing = decode(res).await?;
        Ok(listing.data)
    }

    fn get(&self, url: &str, token: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header(header::USER_AGENT, &self.credentials.user_agent)
            .bearer_auth(token)
    }
}

/// Strips whitespace and a `u/` prefix. Returns `None` for names Reddit could never hold.
pub fn normalize_username(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let name = trimmed
        .strip_prefix("/u/")
        .or_else(|| trimmed.strip_prefix("u/"))
        .unwrap_or(trimmed);

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(name)
}

async fn check_status(res: Response, username: Option<&str>) -> FailureResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    tracing::error!(%status, %body, "Reddit API error");
    Err(classify(status, &body, username))
}

fn classify(status: StatusCode, body: &str, username: Option<&str>) -> Failure {
    match (status, username) {
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            auth_failure(&format!("{} {}", status.as_u16(), body.trim()))
        }
        (StatusCode::NOT_FOUND, Some(name)) => not_found(name),
        _ => Failure::UpstreamUnavailable(format!(
            "An unexpected error occurred while fetching comments: {} {}",
            status.as_u16(),
            body.trim()
        )),
    }
}

async fn decode<T: serde::de::DeserializeOwned>(res: Response) -> FailureResult<T> {
    let text = res.text().await.map_err(|e| Failure::transport("Reddit", e))?;
    serde_json::from_str(&text).map_err(|e| {
        Failure::UpstreamUnavailable(format!("Reddit returned an unexpected response: {e}"))
    })
}

fn not_found(name: &str) -> Failure {
    Failure::UserNotFound(format!("Reddit user '{name}' not found."))
}

fn auth_failure(detail: &str) -> Failure {
    Failure::AuthenticationFailure(format!(
        "Could not authenticate with Reddit. This is likely an invalid CLIENT_ID or CLIENT_SECRET. Details: {detail}"
    ))
}
