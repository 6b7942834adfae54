//! HTTP client for the Bilibili dynamic endpoints.
//!
//! Requests carry the account cookie; writes also carry the `bili_jct`
//! cookie value as the `csrf` query parameter. API-level failures arrive as
//! HTTP 200 with a non-zero `code`, so both layers are checked.

use std::time::Duration;

use pubcrawl_core::{
    cookie_value, parse_cookie_string, retry_rate_limited, AppConfig, Attempt, BilibiliCredentials,
    ConfigError, Platform, PublishError, PublishOutcome, PublishRequest, Publisher,
    RateLimitState, RetryPolicy,
};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{CreateDynamicRequest, CreatedDynamic, Envelope, RemoveDynamicRequest};

const DEFAULT_BASE_URL: &str = "https://api.bilibili.com/";

/// Maximum dynamic length in characters.
pub const MAX_DYNAMIC_CHARS: usize = 1000;

const CODE_OK: i64 = 0;
const CODE_NOT_LOGGED_IN: i64 = -101;
const CODE_NOT_FOUND: i64 = -404;
const CODE_RISK_CONTROL: i64 = -412;
const CODE_DYNAMIC_MISSING: i64 = 4_128_002;

/// Client for the Bilibili web API.
///
/// Use [`BilibiliClient::new`] for production or
/// [`BilibiliClient::with_base_url`] to point at a mock server in tests.
pub struct BilibiliClient {
    client: Client,
    csrf: String,
    base_url: Url,
    policy: RetryPolicy,
}

impl BilibiliClient {
    /// Creates a client pointed at `api.bilibili.com`.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Config`] if the cookie lacks `SESSDATA` or `bili_jct`.
    /// - [`PublishError::NetworkFailure`] if the `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        credentials: &BilibiliCredentials,
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
    /// Same as [`BilibiliClient::new`], plus [`PublishError::Invalid`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        credentials: &BilibiliCredentials,
        timeout_secs: u64,
        user_agent: &str,
        policy: RetryPolicy,
        base_url: &str,
    ) -> Result<Self, PublishError> {
        let pairs = parse_cookie_string(&credentials.cookie);
        if cookie_value(&pairs, "SESSDATA").is_none() {
            return Err(invalid_cookie("cookie has no SESSDATA"));
        }
        let csrf = cookie_value(&pairs, "bili_jct")
            .ok_or_else(|| invalid_cookie("cookie has no bili_jct (csrf token)"))?
            .to_string();

        let mut headers = HeaderMap::new();
        let mut cookie = HeaderValue::from_str(credentials.cookie.trim())
            .map_err(|_| invalid_cookie("cookie contains characters not allowed in a header"))?;
        cookie.set_sensitive(true);
        headers.insert(COOKIE, cookie);
        headers.insert(REFERER, HeaderValue::from_static("https://t.bilibili.com/"));

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .default_headers(headers)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| PublishError::Invalid(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            csrf,
            base_url,
            policy,
        })
    }

    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] when `BILIBILI_COOKIE` is unset or
    /// incomplete.
    pub fn from_config(config: &AppConfig) -> Result<Self, PublishError> {
        let credentials = config.bilibili_credentials()?;
        Self::new(
            &credentials,
            config.http_timeout_secs,
            &config.user_agent,
            config.retry_policy(),
        )
    }

    /// Publishes a text dynamic and returns its id.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] for empty text or text over
    ///   [`MAX_DYNAMIC_CHARS`]; nothing is sent.
    /// - [`PublishError::SessionInvalid`] on code `-101` or HTTP 401.
    /// - [`PublishError::RateLimited`] after repeated `-412`, HTTP 412 or 429.
    /// - [`PublishError::SubmissionRejected`] on any other non-zero code.
    pub async fn post_dynamic(&self, text: &str) -> Result<String, PublishError> {
        if text.trim().is_empty() {
            return Err(PublishError::Invalid("dynamic text is empty".to_string()));
        }
        let chars = pubcrawl_core::text::char_len(text);
        if chars > MAX_DYNAMIC_CHARS {
            return Err(PublishError::Invalid(format!(
                "dynamic is {chars} characters, limit is {MAX_DYNAMIC_CHARS}"
            )));
        }

        let body = CreateDynamicRequest::text(text);
        let created: Option<CreatedDynamic> = self
            .call("post_dynamic", "x/dynamic/feed/create/dyn", &body, None)
            .await?;
        let id = created
            .map(|c| c.dyn_id_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PublishError::SubmissionRejected {
                status: StatusCode::OK.as_u16(),
                message: "response carried no dyn_id_str".to_string(),
            })?;

        tracing::info!(id = %id, "dynamic posted");
        Ok(id)
    }

    /// Deletes a dynamic owned by the cookie's account.
    ///
    /// # Errors
    ///
    /// [`PublishError::NotFound`] on code `-404` or `4128002`; otherwise as
    /// [`BilibiliClient::post_dynamic`].
    pub async fn delete_dynamic(&self, id: &str) -> Result<(), PublishError> {
        if id.trim().is_empty() {
            return Err(PublishError::Invalid("dynamic id is empty".to_string()));
        }
        let body = RemoveDynamicRequest { dyn_id_str: id };
        let _: Option<serde_json::Value> = self
            .call("delete_dynamic", "x/dynamic/feed/operate/remove", &body, Some(id))
            .await?;
        tracing::info!(id, "dynamic deleted");
        Ok(())
    }

    /// POSTs `body` with the csrf token and unwraps the `{code, data}`
    /// envelope. `target_id` turns "no such dynamic" codes into `NotFound`.
    async fn call<B, T>(
        &self,
        action: &str,
        path: &str,
        body: &B,
        target_id: Option<&str>,
    ) -> Result<Option<T>, PublishError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| PublishError::Invalid(format!("invalid endpoint '{path}': {e}")))?;
        url.query_pairs_mut().append_pair("csrf", &self.csrf);

        retry_rate_limited(&self.policy, action, || {
            let url = url.clone();
            async move {
                let response = self.client.post(url).json(body).send().await?;
                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS
                    || status == StatusCode::PRECONDITION_FAILED
                {
                    return Ok(Attempt::RateLimited(RateLimitState::from_headers(
                        response.headers(),
                    )));
                }
                let text = response.text().await?;
                if status == StatusCode::UNAUTHORIZED {
                    return Err(PublishError::SessionInvalid(format!("HTTP 401 from {action}")));
                }
                if !status.is_success() {
                    return Err(PublishError::SubmissionRejected {
                        status: status.as_u16(),
                        message: text.chars().take(200).collect(),
                    });
                }

                let envelope: Envelope<T> =
                    serde_json::from_str(&text).map_err(|e| PublishError::Deserialize {
                        context: action.to_string(),
                        source: e,
                    })?;
                match envelope.code {
                    CODE_OK => Ok(Attempt::Done(envelope.data)),
                    CODE_RISK_CONTROL => Ok(Attempt::RateLimited(RateLimitState::default())),
                    code => Err(map_code(code, envelope.message, target_id)),
                }
            }
        })
        .await
    }
}

fn invalid_cookie(reason: &str) -> PublishError {
    PublishError::Config(ConfigError::InvalidEnvVar {
        var: "BILIBILI_COOKIE".to_string(),
        reason: reason.to_string(),
    })
}

fn map_code(code: i64, message: String, target_id: Option<&str>) -> PublishError {
    tracing::warn!(code, message = %message, "bilibili API error");
    match (code, target_id) {
        (CODE_NOT_LOGGED_IN, _) => PublishError::SessionInvalid(format!("code {code}: {message}")),
        (CODE_NOT_FOUND | CODE_DYNAMIC_MISSING, Some(id)) => PublishError::NotFound {
            id: id.to_string(),
        },
        _ => PublishError::SubmissionRejected {
            status: StatusCode::OK.as_u16(),
            message: format!("code {code}: {message}"),
        },
    }
}

impl Publisher for BilibiliClient {
    fn platform(&self) -> Platform {
        Platform::Bilibili
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let title = request.title.trim();
        let body = request.full_body();
        let text = if title.is_empty() || body.trim_start().starts_with(title) {
            body
        } else {
            format!("{title}\n{body}")
        };
        let id = self.post_dynamic(&text).await?;
        Ok(PublishOutcome::Published { id })
    }
}
