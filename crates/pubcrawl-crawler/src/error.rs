use thiserror::Error;

/// Errors returned by the crawlers.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-2xx status.
    #[error("{source_name} returned HTTP {status}: {message}")]
    Api {
        source_name: String,
        status: u16,
        message: String,
    },

    /// The body was not a readable RSS/Atom document.
    #[error("feed parse error for {context}: {source}")]
    Feed {
        context: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("no record with id {id}")]
    NotFound { id: String },

    #[error("invalid input: {0}")]
    Invalid(String),
}
