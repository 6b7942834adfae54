//! Request and response shapes for the X API v2 endpoints we call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct CreateTweetRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaIds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyTo<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MediaIds {
    pub media_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplyTo<'a> {
    pub in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeletedTweet {
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadedMedia {
    pub id: String,
}

/// Error body shapes: problem-details (`title`/`detail`) or an `errors` list.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    title: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    message: Option<String>,
    detail: Option<String>,
}

/// Best human-readable message from an error response body.
pub(crate) fn api_error_message(body: &str) -> String {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .detail
        .or_else(|| {
            parsed
                .errors
                .into_iter()
                .find_map(|e| e.message.or(e.detail))
        })
        .or(parsed.title)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}
