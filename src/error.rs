use serde::Serialize;

/// Why a fetch or summarize call did not succeed.
///
/// Every upstream or transport problem is folded into one of these before it
/// leaves the component; callers never see a raw `reqwest::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("{0}")]
    ConfigurationMissing(String),

    #[error("{0}")]
    UserNotFound(String),

    #[error("{0}")]
    AuthenticationFailure(String),

    #[error("{0}")]
    EmptyGeneration(String),

    #[error("The upstream API returned an error: {status}. Response: {body}")]
    UpstreamError { status: u16, body: String },

    #[error("{0}")]
    UpstreamUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConfigurationMissing,
    UserNotFound,
    AuthenticationFailure,
    EmptyGeneration,
    UpstreamError,
    UpstreamUnavailable,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ConfigurationMissing => "configuration_missing",
            FailureKind::UserNotFound => "user_not_found",
            FailureKind::AuthenticationFailure => "authentication_failure",
            FailureKind::EmptyGeneration => "empty_generation",
            FailureKind::UpstreamError => "upstream_error",
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::ConfigurationMissing(_) => FailureKind::ConfigurationMissing,
            Failure::UserNotFound(_) => FailureKind::UserNotFound,
            Failure::AuthenticationFailure(_) => FailureKind::AuthenticationFailure,
            Failure::EmptyGeneration(_) => FailureKind::EmptyGeneration,
            Failure::UpstreamError { .. } => FailureKind::UpstreamError,
            Failure::UpstreamUnavailable(_) => FailureKind::UpstreamUnavailable,
        }
    }

    /// Folds a transport-level `reqwest` error into `UpstreamUnavailable`.
    pub(crate) fn transport(service: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Failure::UpstreamUnavailable(format!("The request to {service} timed out."))
        } else {
            Failure::UpstreamUnavailable(format!("Could not reach {service}: {err}"))
        }
    }
}

pub type FailureResult<T> = Result<T, Failure>;
