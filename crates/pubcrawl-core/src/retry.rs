//! Rate-limit-aware retry for the API publishers.
//!
//! An operation reports a rate-limited response as [`Attempt::RateLimited`]
//! instead of an error, carrying whatever [`RateLimitState`] the response
//! headers exposed. [`retry_rate_limited`] sleeps until the advertised reset
//! (or a capped exponential backoff when there is none) and tries again, up
//! to [`RetryPolicy::max_attempts`] attempts in total. Every other error is
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

use crate::error::PublishError;

/// Bounds for the rate-limit retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            min_wait: Duration::from_secs(5),
            max_wait: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps. Used by tests.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    /// Delay before the next attempt after `attempt` (1-based) was rate limited.
    ///
    /// | reset header        | wait                                   |
    /// |---------------------|----------------------------------------|
    /// | in the future       | `reset - now`, clamped to `[min, max]` |
    /// | absent or past      | `min × 2^(attempt-1)`, capped at `max` |
    #[must_use]
    pub fn wait_for(&self, state: &RateLimitState, attempt: u32, now: DateTime<Utc>) -> Duration {
        if let Some(reset_at) = state.reset_at {
            if let Ok(until_reset) = (reset_at - now).to_std() {
                if !until_reset.is_zero() {
                    return until_reset.max(self.min_wait).min(self.max_wait);
                }
            }
        }
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.min_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }
}

/// Rate-limit hints from the last response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Read the `x-rate-limit-{limit,remaining,reset}` headers.
    ///
    /// Unparseable values are treated as absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| -> Option<i64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<i64>().ok())
        };
        Self {
            limit: number("x-rate-limit-limit").and_then(|n| u32::try_from(n).ok()),
            remaining: number("x-rate-limit-remaining").and_then(|n| u32::try_from(n).ok()),
            reset_at: number("x-rate-limit-reset")
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }
}

/// Outcome of one attempt inside [`retry_rate_limited`].
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    RateLimited(RateLimitState),
}

/// Runs `operation` until it completes, fails, or exhausts the rate-limit budget.
///
/// # Errors
///
/// Returns [`PublishError::RateLimited`] once `policy.max_attempts` attempts
/// were all rate limited, or the first non-rate-limit error unchanged.
pub async fn retry_rate_limited<T, F, Fut>(
    policy: &RetryPolicy,
    action: &str,
    mut operation: F,
) -> Result<T, PublishError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, PublishError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let state = match operation().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::RateLimited(state) => state,
        };

        tracing::warn!(
            action,
            limit = ?state.limit,
            remaining = ?state.remaining,
            reset = ?state.reset_at,
            "rate limit details"
        );

        if attempt >= max_attempts {
            tracing::error!(action, attempts = attempt, "rate limit retries exhausted, giving up");
            return Err(PublishError::RateLimited {
                action: action.to_string(),
                attempts: attempt,
            });
        }

        let delay = policy.wait_for(&state, attempt, Utc::now());
        tracing::warn!(
            action,
            attempt,
            max_attempts,
            delay_secs = delay.as_secs_f64(),
            "rate limited, waiting before retry"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use reqwest::header::HeaderValue;

    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn backoff_without_reset_doubles_from_min_wait() {
        let p = policy();
        let state = RateLimitState::default();
        let now = Utc::now();
        assert_eq!(p.wait_for(&state, 1, now), Duration::from_secs(5));
        assert_eq!(p.wait_for(&state, 2, now), Duration::from_secs(10));
        assert_eq!(p.wait_for(&state, 3, now), Duration::from_secs(20));
    }

    #[test]
    fn backoff_is_capped_at_max_wait() {
        let p = policy();
        let state = RateLimitState::default();
        assert_eq!(
            p.wait_for(&state, 12, Utc::now()),
            Duration::from_secs(300)
        );
        assert_eq!(
            p.wait_for(&state, u32::MAX, Utc::now()),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn future_reset_is_used_and_clamped() {
        let p = policy();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let soon = RateLimitState {
            reset_at: Some(now + chrono::Duration::seconds(2)),
            ..RateLimitState::default()
        };
        assert_eq!(p.wait_for(&soon, 1, now), Duration::from_secs(5));

        let mid = RateLimitState {
            reset_at: Some(now + chrono::Duration::seconds(42)),
            ..RateLimitState::default()
        };
        assert_eq!(p.wait_for(&mid, 1, now), Duration::from_secs(42));

        let far = RateLimitState {
            reset_at: Some(now + chrono::Duration::seconds(3_600)),
            ..RateLimitState::default()
        };
        assert_eq!(p.wait_for(&far, 1, now), Duration::from_secs(300));
    }

    #[test]
    fn past_reset_falls_back_to_backoff() {
        let p = policy();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let state = RateLimitState {
            reset_at: Some(now - chrono::Duration::seconds(10)),
            ..RateLimitState::default()
        };
        assert_eq!(p.wait_for(&state, 2, now), Duration::from_secs(10));
    }

    #[test]
    fn state_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-limit", HeaderValue::from_static("300"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1700000000"));
        let state = RateLimitState::from_headers(&headers);
        assert_eq!(state.limit, Some(300));
        assert_eq!(state.remaining, Some(0));
        assert_eq!(state.reset_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn garbage_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("soon"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("-1"));
        assert_eq!(RateLimitState::from_headers(&headers), RateLimitState::default());
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_rate_limited(&RetryPolicy::immediate(3), "test", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(Attempt::Done(42))
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_rate_limited(&RetryPolicy::immediate(4), "test", || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Ok(Attempt::RateLimited(RateLimitState::default()))
                } else {
                    Ok(Attempt::Done("id"))
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "id");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_is_rate_limited_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_rate_limited(&RetryPolicy::immediate(4), "create", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(Attempt::RateLimited(RateLimitState::default()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(
            matches!(result, Err(PublishError::RateLimited { ref action, attempts: 4 }) if action == "create"),
            "got: {result:?}"
        );
    }

    #[tokio::test]
    async fn zero_attempt_policy_still_tries_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_rate_limited(&RetryPolicy::immediate(0), "x", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(Attempt::RateLimited(RateLimitState::default()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PublishError::RateLimited { attempts: 1, .. })));
    }

    #[tokio::test]
    async fn non_rate_limit_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_rate_limited(&RetryPolicy::immediate(4), "x", || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(PublishError::SessionInvalid("expired token".to_string()))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PublishError::SessionInvalid(_))));
    }
}
