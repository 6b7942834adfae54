use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::{
    BilibiliCredentials, TwitterCredentials, XiaohongshuCredentials, ZhihuCredentials,
};
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub ledger_path: PathBuf,
    pub batch_cooldown_secs: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_max_attempts: u32,
    pub rate_limit_min_wait_secs: u64,
    pub rate_limit_max_wait_secs: u64,
    pub sample_fallback: bool,
    pub twitter_access_token: Option<String>,
    pub bilibili_cookie: Option<String>,
    pub xhs_cookie: Option<String>,
    pub zhihu_profile_dir: Option<PathBuf>,
    pub webdriver_url: String,
    pub webdriver_headless: bool,
    pub browser_step_timeout_secs: u64,
    pub browser_locators_path: Option<PathBuf>,
    pub newsapi_key: Option<String>,
}

impl AppConfig {
    /// Rate-limit retry policy shared by the API publishers.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.rate_limit_max_attempts,
            min_wait: Duration::from_secs(self.rate_limit_min_wait_secs),
            max_wait: Duration::from_secs(self.rate_limit_max_wait_secs),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if `TWITTER_ACCESS_TOKEN` is unset.
    pub fn twitter_credentials(&self) -> Result<TwitterCredentials, ConfigError> {
        let access_token = required(self.twitter_access_token.as_ref(), "TWITTER_ACCESS_TOKEN")?;
        Ok(TwitterCredentials { access_token })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if `BILIBILI_COOKIE` is unset.
    pub fn bilibili_credentials(&self) -> Result<BilibiliCredentials, ConfigError> {
        let cookie = required(self.bilibili_cookie.as_ref(), "BILIBILI_COOKIE")?;
        Ok(BilibiliCredentials { cookie })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if `XHS_COOKIE` is unset.
    pub fn xiaohongshu_credentials(&self) -> Result<XiaohongshuCredentials, ConfigError> {
        let cookie = required(self.xhs_cookie.as_ref(), "XHS_COOKIE")?;
        Ok(XiaohongshuCredentials { cookie })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if `ZHIHU_PROFILE_DIR` is unset.
    pub fn zhihu_credentials(&self) -> Result<ZhihuCredentials, ConfigError> {
        let profile_dir = self
            .zhihu_profile_dir
            .clone()
            .ok_or_else(|| ConfigError::MissingCredential("ZHIHU_PROFILE_DIR".to_string()))?;
        Ok(ZhihuCredentials { profile_dir })
    }
}

fn required(value: Option<&String>, var: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::MissingCredential(var.to_string())),
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("ledger_path", &self.ledger_path)
            .field("batch_cooldown_secs", &self.batch_cooldown_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("rate_limit_max_attempts", &self.rate_limit_max_attempts)
            .field("rate_limit_min_wait_secs", &self.rate_limit_min_wait_secs)
            .field("rate_limit_max_wait_secs", &self.rate_limit_max_wait_secs)
            .field("sample_fallback", &self.sample_fallback)
            .field(
                "twitter_access_token",
                &self.twitter_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "bilibili_cookie",
                &self.bilibili_cookie.as_ref().map(|_| "[redacted]"),
            )
            .field("xhs_cookie", &self.xhs_cookie.as_ref().map(|_| "[redacted]"))
            .field("zhihu_profile_dir", &self.zhihu_profile_dir)
            .field("webdriver_url", &self.webdriver_url)
            .field("webdriver_headless", &self.webdriver_headless)
            .field("browser_step_timeout_secs", &self.browser_step_timeout_secs)
            .field("browser_locators_path", &self.browser_locators_path)
            .field(
                "newsapi_key",
                &self.newsapi_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
