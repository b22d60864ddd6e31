use thiserror::Error;

/// Top-level error type for qajudge.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("Upstream error: {0}")]
    Model(#[from] ModelError),

    #[error("Judgment error: {0}")]
    Judgment(#[from] JudgmentError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

/// Failures talking to the generation endpoint.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("API request failed: {0}")]
    ApiRequest(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
}

impl ModelError {
    /// Transient conditions worth another attempt: transport failures,
    /// timeouts, rate limits, 408 and 5xx. Other statuses are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ApiRequest(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::Http { status, .. } => *status == 408 || (500..600).contains(status),
            Self::InvalidResponse(_) | Self::Auth(_) => false,
        }
    }
}

/// The judge's reply could not be turned into a boolean verdict.
#[derive(Debug, Error)]
pub enum JudgmentError {
    #[error("could not parse verdict from: {0:?}")]
    Unparseable(String),

    #[error("judge returned no completion")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Credentials: {0}")]
    Credentials(String),

    #[error("Dataset: {0}")]
    Dataset(String),

    #[error("Invalid option: {0}")]
    Invalid(String),
}

impl QaError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            QaError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
