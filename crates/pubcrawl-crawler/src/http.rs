//! Client construction and status handling shared by the crawlers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};

use crate::error::CrawlError;

/// Longest slice of an error body kept in [`CrawlError::Api`].
const MAX_ERROR_BODY: usize = 200;

pub(crate) fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, CrawlError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Parse `base_url`, ending it with exactly one slash so relative joins keep
/// any path prefix.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, CrawlError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised)
        .map_err(|e| CrawlError::Invalid(format!("invalid base URL '{base_url}': {e}")))
}

/// Start of a look-back `window` ending now.
pub(crate) fn window_start(window: chrono::Duration) -> Result<DateTime<Utc>, CrawlError> {
    Utc::now()
        .checked_sub_signed(window)
        .ok_or_else(|| CrawlError::Invalid(format!("crawl window of {window} is out of range")))
}

pub(crate) fn join(base_url: &Url, path: &str) -> Result<Url, CrawlError> {
    base_url
        .join(path)
        .map_err(|e| CrawlError::Invalid(format!("invalid path '{path}': {e}")))
}

/// Return the body of a 2xx response, or [`CrawlError::Api`] carrying
/// `message_of(body)` for anything else.
pub(crate) async fn success_body(
    response: Response,
    source_name: &str,
    message_of: impl Fn(&str) -> Option<String>,
) -> Result<String, CrawlError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        return Ok(body);
    }

    let message = message_of(&body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            pubcrawl_core::text::truncate_chars(trimmed, MAX_ERROR_BODY)
        }
    });
    tracing::warn!(
        source = source_name,
        status = status.as_u16(),
        message = %message,
        "crawl request failed"
    );
    Err(CrawlError::Api {
        source_name: source_name.to_string(),
        status: status.as_u16(),
        message,
    })
}
