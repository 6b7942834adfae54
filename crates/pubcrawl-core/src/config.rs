use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are collected as `Option`s; they are only required once a
/// component asks for them through the `AppConfig::*_credentials` accessors.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("expected true/false, got \"{raw}\""),
            }),
        }
    };

    let env = parse_environment(&or_default("PUBCRAWL_ENV", "development"))?;

    let log_level = or_default("PUBCRAWL_LOG_LEVEL", "info");
    let ledger_path = PathBuf::from(or_default("PUBCRAWL_LEDGER_PATH", "./published_ids.txt"));
    let batch_cooldown_secs = parse_u64("PUBCRAWL_BATCH_COOLDOWN_SECS", "300")?;
    let http_timeout_secs = parse_u64("PUBCRAWL_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PUBCRAWL_USER_AGENT", "pubcrawl/0.1");

    let rate_limit_max_attempts = parse_u32("PUBCRAWL_RATE_LIMIT_MAX_ATTEMPTS", "4")?;
    if rate_limit_max_attempts == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PUBCRAWL_RATE_LIMIT_MAX_ATTEMPTS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let rate_limit_min_wait_secs = parse_u64("PUBCRAWL_RATE_LIMIT_MIN_WAIT_SECS", "5")?;
    let rate_limit_max_wait_secs = parse_u64("PUBCRAWL_RATE_LIMIT_MAX_WAIT_SECS", "300")?;
    if rate_limit_min_wait_secs > rate_limit_max_wait_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "PUBCRAWL_RATE_LIMIT_MIN_WAIT_SECS".to_string(),
            reason: format!(
                "{rate_limit_min_wait_secs}s exceeds PUBCRAWL_RATE_LIMIT_MAX_WAIT_SECS ({rate_limit_max_wait_secs}s)"
            ),
        });
    }

    // Off by default in production.
    let sample_fallback = parse_bool(
        "PUBCRAWL_SAMPLE_FALLBACK",
        env != Environment::Production,
    )?;

    let twitter_access_token = optional("TWITTER_ACCESS_TOKEN");
    let bilibili_cookie = optional("BILIBILI_COOKIE");
    let xhs_cookie = optional("XHS_COOKIE");
    let zhihu_profile_dir = optional("ZHIHU_PROFILE_DIR").map(PathBuf::from);

    let webdriver_url = or_default("WEBDRIVER_URL", "http://localhost:9515");
    let webdriver_headless = parse_bool("WEBDRIVER_HEADLESS", false)?;
    let browser_step_timeout_secs = parse_u64("BROWSER_STEP_TIMEOUT_SECS", "30")?;
    let browser_locators_path = optional("BROWSER_LOCATORS_PATH").map(PathBuf::from);

    let newsapi_key = optional("NEWSAPI_KEY");

    Ok(AppConfig {
        env,
        log_level,
        ledger_path,
        batch_cooldown_secs,
        http_timeout_secs,
        user_agent,
        rate_limit_max_attempts,
        rate_limit_min_wait_secs,
        rate_limit_max_wait_secs,
        sample_fallback,
        twitter_access_token,
        bilibili_cookie,
        xhs_cookie,
        zhihu_profile_dir,
        webdriver_url,
        webdriver_headless,
        browser_step_timeout_secs,
        browser_locators_path,
        newsapi_key,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PUBCRAWL_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
