use thiserror::Error;

/// Configuration problems detected while building [`crate::AppConfig`] or a
/// component's credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable required by the component being built is not set.
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {reason}")]
    FileParse { path: String, reason: String },
}

/// Failures surfaced by publishers, the ledger and the batch runner.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The supplied cookie or token was rejected, or the browser landed on a
    /// login page.
    #[error("session invalid: {0}")]
    SessionInvalid(String),

    /// Every attempt in the retry budget hit a rate limit.
    #[error("rate limited on {action}: gave up after {attempts} attempts")]
    RateLimited { action: String, attempts: u32 },

    /// A UI control could not be located within its wait.
    #[error("element not found at step {step}")]
    ElementNotFound { step: String },

    /// The platform refused the content or the operation.
    #[error("submission rejected (status {status}): {message}")]
    SubmissionRejected { status: u16, message: String },

    #[error("network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("{id} not found")]
    NotFound { id: String },

    /// Input rejected locally before any network call.
    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A thread stopped part way; `posted` holds the ids created before the
    /// failing post.
    #[error("thread interrupted after {} posts: {source}", posted.len())]
    ThreadInterrupted {
        posted: Vec<String>,
        #[source]
        source: Box<PublishError>,
    },

    #[error("ledger {path}: {source}")]
    Ledger {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("webdriver {command} failed: {message}")]
    WebDriver { command: String, message: String },
}
