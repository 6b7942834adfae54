//! HTTP client for the X (Twitter) API v2.
//!
//! Wraps `reqwest` with bearer-token auth, rate-limit retry and typed
//! response decoding. Every write goes through
//! [`pubcrawl_core::retry_rate_limited`], so a 429 is waited out up to the
//! configured budget before [`PublishError::RateLimited`] is returned.

use std::path::Path;
use std::time::Duration;

use pubcrawl_core::{
    retry_rate_limited, AppConfig, Attempt, MediaRef, PublishError, RateLimitState, RetryPolicy,
    TwitterCredentials,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};

use crate::types::{
    api_error_message, CreateTweetRequest, CreatedTweet, DataEnvelope, DeletedTweet, MediaIds,
    ReplyTo, UploadedMedia,
};

const DEFAULT_BASE_URL: &str = "https://api.x.com/";

/// Maximum tweet length in characters.
pub const MAX_TWEET_CHARS: usize = 280;

/// A tweet that the API confirmed as created.
///
/// Only returned by a successful post, which is what lets
/// [`TwitterClient::post_reply`] guarantee that a reply targets a real tweet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedTweet {
    id: String,
    text: String,
}

impl PostedTweet {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Client for the X API v2.
///
/// Use [`TwitterClient::new`] for production or
/// [`TwitterClient::with_base_url`] to point at a mock server in tests.
pub struct TwitterClient {
    client: Client,
    access_token: String,
    base_url: Url,
    policy: RetryPolicy,
}

impl TwitterClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::NetworkFailure`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        credentials: &TwitterCredentials,
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
    ) -> Result<Self, PublishError> {
        Self::with_base_url(credentials, timeout_secs, user_agent, policy, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::NetworkFailure`] if the `reqwest::Client`
    /// cannot be constructed, or [`PublishError::Invalid`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        credentials: &TwitterCredentials,
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| PublishError::Invalid(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            access_token: credentials.access_token.clone(),
            base_url,
            policy,
        })
    }

    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] when `TWITTER_ACCESS_TOKEN` is unset.
    pub fn from_config(config: &AppConfig) -> Result<Self, PublishError> {
        let credentials = config.twitter_credentials()?;
        Self::new(
            &credentials,
            config.http_timeout_secs,
            &config.user_agent,
            config.retry_policy(),
        )
    }

    /// Posts a standalone tweet, uploading `media` first.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] if `text` is empty or longer than
    ///   [`MAX_TWEET_CHARS`], or a media file cannot be read. Nothing is sent.
    /// - [`PublishError::RateLimited`] once the retry budget is exhausted.
    /// - [`PublishError::SessionInvalid`] on HTTP 401.
    /// - [`PublishError::SubmissionRejected`] on any other non-2xx status.
    pub async fn post_tweet(
        &self,
        text: &str,
        media: &[MediaRef],
    ) -> Result<PostedTweet, PublishError> {
        validate_text(text)?;
        let media_ids = self.upload_all(media).await?;
        let request = CreateTweetRequest {
            text,
            media: (!media_ids.is_empty()).then_some(MediaIds { media_ids }),
            reply: None,
        };
        let posted = self.create_tweet("post_tweet", &request).await?;
        tracing::info!(id = %posted.id, "tweet posted");
        Ok(posted)
    }

    pub(crate) async fn create_reply(
        &self,
        text: &str,
        parent: &PostedTweet,
    ) -> Result<PostedTweet, PublishError> {
        validate_text(text)?;
        let request = CreateTweetRequest {
            text,
            media: None,
            reply: Some(ReplyTo {
                in_reply_to_tweet_id: &parent.id,
            }),
        };
        let posted = self.create_tweet("post_reply", &request).await?;
        tracing::info!(id = %posted.id, parent = %parent.id, "reply posted");
        Ok(posted)
    }

    /// Deletes a tweet owned by the authenticated account.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] unless `id` is all ASCII digits.
    /// - [`PublishError::NotFound`] on HTTP 404 or when the API reports
    ///   `deleted: false`.
    /// - [`PublishError::SubmissionRejected`] on HTTP 403 (not owned).
    /// - [`PublishError::RateLimited`] once the retry budget is exhausted.
    pub async fn delete_tweet(&self, id: &str) -> Result<(), PublishError> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PublishError::Invalid(format!(
                "tweet id must be numeric, got {id:?}"
            )));
        }
        let url = self.endpoint(&format!("2/tweets/{id}"))?;

        let deleted: DeletedTweet = retry_rate_limited(&self.policy, "delete_tweet", || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .delete(url)
                    .bearer_auth(&self.access_token)
                    .send()
                    .await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS {
                    return Ok(Attempt::RateLimited(RateLimitState::from_headers(
                        response.headers(),
                    )));
                }
                if status == StatusCode::NOT_FOUND {
                    return Err(PublishError::NotFound { id: id.to_string() });
                }
                let envelope: DataEnvelope<DeletedTweet> =
                    decode(response, &format!("delete_tweet(id={id})")).await?;
                Ok(Attempt::Done(envelope.data))
            }
        })
        .await?;

        if !deleted.deleted {
            return Err(PublishError::NotFound { id: id.to_string() });
        }
        tracing::info!(id, "tweet deleted");
        Ok(())
    }

    /// Uploads one media file and returns its media id.
    ///
    /// # Errors
    ///
    /// [`PublishError::Invalid`] when the file cannot be read; otherwise the
    /// same status mapping as [`TwitterClient::post_tweet`].
    pub async fn upload_media(&self, path: &Path) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            PublishError::Invalid(format!("cannot read media {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        let category = media_category(path);
        let url = self.endpoint("2/media/upload")?;

        let uploaded: UploadedMedia = retry_rate_limited(&self.policy, "upload_media", || {
            let url = url.clone();
            let form = Form::new()
                .text("media_category", category)
                .part("media", Part::bytes(bytes.clone()).file_name(file_name.clone()));
            async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.access_token)
                    .multipart(form)
                    .send()
                    .await?;
                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    return Ok(Attempt::RateLimited(RateLimitState::from_headers(
                        response.headers(),
                    )));
                }
                let envelope: DataEnvelope<UploadedMedia> =
                    decode(response, "upload_media").await?;
                Ok(Attempt::Done(envelope.data))
            }
        })
        .await?;

        tracing::debug!(media_id = %uploaded.id, path = %path.display(), "media uploaded");
        Ok(uploaded.id)
    }

    async fn upload_all(&self, media: &[MediaRef]) -> Result<Vec<String>, PublishError> {
        let mut ids = Vec::with_capacity(media.len());
        for item in media {
            ids.push(self.upload_media(&item.path).await?);
        }
        Ok(ids)
    }

    async fn create_tweet(
        &self,
        action: &str,
        request: &CreateTweetRequest<'_>,
    ) -> Result<PostedTweet, PublishError> {
        let url = self.endpoint("2/tweets")?;
        retry_rate_limited(&self.policy, action, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .post(url)
                    .bearer_auth(&self.access_token)
                    .json(request)
                    .send()
                    .await?;
                if response.status() == StatusCode::TOO_MANY_REQUESTS {
                    return Ok(Attempt::RateLimited(RateLimitState::from_headers(
                        response.headers(),
                    )));
                }
                let envelope: DataEnvelope<CreatedTweet> = decode(response, action).await?;
                Ok(Attempt::Done(PostedTweet {
                    id: envelope.data.id,
                    text: envelope.data.text,
                }))
            }
        })
        .await
    }

    fn endpoint(&self, path: &str) -> Result<Url, PublishError> {
        self.base_url
            .join(path)
            .map_err(|e| PublishError::Invalid(format!("invalid endpoint '{path}': {e}")))
    }
}

/// Rejects text the API would refuse, before anything is sent.
pub(crate) fn validate_text(text: &str) -> Result<(), PublishError> {
    if text.trim().is_empty() {
        return Err(PublishError::Invalid("tweet text is empty".to_string()));
    }
    let chars = pubcrawl_core::text::char_len(text);
    if chars > MAX_TWEET_CHARS {
        return Err(PublishError::Invalid(format!(
            "tweet is {chars} characters, limit is {MAX_TWEET_CHARS}"
        )));
    }
    Ok(())
}

fn media_category(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("gif") => "tweet_gif",
        Some("mp4" | "mov") => "tweet_video",
        _ => "tweet_image",
    }
}

/// Maps non-2xx statuses to [`PublishError`] and decodes the success body.
async fn decode<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, PublishError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = api_error_message(&body);
        tracing::warn!(status = status.as_u16(), context, message = %message, "API error");
        return Err(match status {
            StatusCode::UNAUTHORIZED => PublishError::SessionInvalid(message),
            _ => PublishError::SubmissionRejected {
                status: status.as_u16(),
                message,
            },
        });
    }
    serde_json::from_str(&body).map_err(|e| PublishError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_text_accepts_exactly_280_chars() {
        assert!(validate_text(&"a".repeat(280)).is_ok());
    }

    #[test]
    fn validate_text_rejects_281_chars() {
        let err = validate_text(&"推".repeat(281)).unwrap_err();
        assert!(matches!(err, PublishError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn validate_text_rejects_blank() {
        assert!(matches!(
            validate_text("   ").unwrap_err(),
            PublishError::Invalid(_)
        ));
    }

    #[test]
    fn media_category_by_extension() {
        assert_eq!(media_category(Path::new("a.GIF")), "tweet_gif");
        assert_eq!(media_category(Path::new("clip.mp4")), "tweet_video");
        assert_eq!(media_category(Path::new("photo.jpg")), "tweet_image");
        assert_eq!(media_category(Path::new("noext")), "tweet_image");
    }

    #[test]
    fn with_base_url_normalises_trailing_slash() {
        let creds = TwitterCredentials {
            access_token: "t".into(),
        };
        let client = TwitterClient::with_base_url(
            &creds,
            5,
            "test",
            RetryPolicy::immediate(1),
            "http://localhost:1234/api//",
        )
        .unwrap();
        assert_eq!(
            client.endpoint("2/tweets").unwrap().as_str(),
            "http://localhost:1234/api/2/tweets"
        );
    }
}
