use thiserror::Error;

/// All errors that can occur when using the ChatBees SDK.
#[derive(Error, Debug)]
pub enum ChatBeesError {
    /// The API key is missing or was rejected (HTTP 401).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The client could not be configured, e.g. no account id was provided.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// An argument was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The API key does not grant access to the requested resource (HTTP 403).
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The collection or document does not exist (HTTP 404).
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The request was rate-limited (HTTP 429).
    #[error("rate limited (retry after {retry_after:?}s): {message}")]
    RateLimit {
        message: String,
        retry_after: Option<f64>,
    },

    /// Any other non-success response, with the HTTP status code and body.
    #[error("API error {status_code}: {message}")]
    Api {
        status_code: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// A transport-level HTTP error from reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response whose body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An I/O error, typically from reading a local document or audio file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatBeesError {
    /// `true` for failures worth retrying: transport errors, 5xx and 429.
    /// Requests that could not be built are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::RateLimit { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// A convenience alias for `Result<T, ChatBeesError>`.
pub type Result<T> = std::result::Result<T, ChatBeesError>;
