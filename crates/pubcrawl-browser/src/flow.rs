//! Building blocks shared by the UI publish flows: bounded element waits,
//! login detection and session shutdown.

use std::time::Duration;

use pubcrawl_core::{AppConfig, PublishError, PublishOutcome};
use tokio::time::Instant;

use crate::driver::{ElementRef, PageDriver};
use crate::locator::Locator;

/// URL fragments of the platforms' login pages.
const LOGIN_URL_KEYWORDS: &[&str] = &["passport.", "login.", "account.", "signin"];

/// How long a step may wait for its element, and how often it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for StepWait {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl StepWait {
    /// Shorter wait for steps that may legitimately never appear.
    #[must_use]
    pub fn optional(self) -> Self {
        Self {
            timeout: self.timeout.min(Duration::from_secs(5)),
            ..self
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.browser_step_timeout_secs),
            ..Self::default()
        }
    }
}

/// Poll the page until one of `locators` matches or `wait.timeout` passes.
///
/// Locators are tried in order on every poll, so earlier entries win when
/// several match.
///
/// # Errors
///
/// Returns [`PublishError::ElementNotFound`] on timeout, or the driver's
/// error if a lookup itself fails.
pub async fn wait_for<D: PageDriver>(
    driver: &mut D,
    step: &str,
    locators: &[Locator],
    wait: StepWait,
) -> Result<ElementRef, PublishError> {
    let deadline = Instant::now() + wait.timeout;
    loop {
        for locator in locators {
            if let Some(element) = driver.find(locator).await? {
                tracing::debug!(step, locator = %locator, "element found");
                return Ok(element);
            }
        }
        if Instant::now() >= deadline {
            tracing::warn!(
                step,
                timeout_secs = wait.timeout.as_secs(),
                "element not found"
            );
            return Err(PublishError::ElementNotFound {
                step: step.to_string(),
            });
        }
        tokio::time::sleep(wait.poll_interval).await;
    }
}

/// What a step produced: either the flow goes on, or a human has to finish.
pub enum Step<T> {
    Continue(T),
    Manual(PublishOutcome),
}

/// [`wait_for`], with a timeout turned into a manual-intervention result.
///
/// # Errors
///
/// Propagates driver failures; a missing element is not an error here.
pub async fn required<D: PageDriver>(
    driver: &mut D,
    step: &str,
    locators: &[Locator],
    wait: StepWait,
) -> Result<Step<ElementRef>, PublishError> {
    match wait_for(driver, step, locators, wait).await {
        Ok(element) => Ok(Step::Continue(element)),
        Err(err @ PublishError::ElementNotFound { .. }) => Ok(Step::Manual(manual(step, &err))),
        Err(err) => Err(err),
    }
}

/// Click the first of `locators` to appear, or skip the step on timeout.
/// Returns whether a click happened.
///
/// # Errors
///
/// Propagates driver failures.
pub async fn click_optional<D: PageDriver>(
    driver: &mut D,
    step: &str,
    locators: &[Locator],
    wait: StepWait,
) -> Result<bool, PublishError> {
    if locators.is_empty() {
        return Ok(false);
    }
    match wait_for(driver, step, locators, wait).await {
        Ok(element) => {
            driver.click(&element).await?;
            tracing::info!(step, "clicked");
            Ok(true)
        }
        Err(PublishError::ElementNotFound { .. }) => {
            tracing::info!(step, "optional step not present, skipping");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// A [`PublishOutcome::ManualInterventionRequired`] for `step`.
#[must_use]
pub fn manual(step: &str, reason: &impl std::fmt::Display) -> PublishOutcome {
    tracing::warn!(step, reason = %reason, "manual intervention required; browser left open");
    PublishOutcome::ManualInterventionRequired {
        step: step.to_string(),
        reason: reason.to_string(),
    }
}

#[must_use]
pub fn is_login_url(url: &str) -> bool {
    LOGIN_URL_KEYWORDS.iter().any(|k| url.contains(k))
}

/// Fail when the browser was redirected to a login page.
///
/// # Errors
///
/// Returns [`PublishError::SessionInvalid`] carrying the login URL.
pub async fn ensure_logged_in<D: PageDriver>(driver: &mut D) -> Result<(), PublishError> {
    let url = driver.current_url().await?;
    if is_login_url(&url) {
        tracing::error!(url = %url, "redirected to login page");
        return Err(PublishError::SessionInvalid(format!(
            "redirected to login page {url}"
        )));
    }
    Ok(())
}

/// Keep the browser open for up to `grace` so a person can finish a flow,
/// then quit it. Returns early once every window has been closed by hand.
///
/// # Errors
///
/// Propagates a failure to end the session.
pub async fn close_after<D: PageDriver>(driver: &mut D, grace: Duration) -> Result<(), PublishError> {
    const CHECK_EVERY: Duration = Duration::from_secs(3);

    if !grace.is_zero() {
        tracing::info!(grace_secs = grace.as_secs(), "browser stays open before closing");
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            match driver.window_count().await {
                Ok(0) | Err(_) => {
                    tracing::info!("browser window closed by user");
                    break;
                }
                Ok(_) => {}
            }
            let left = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(left.min(CHECK_EVERY)).await;
        }
    }
    driver.quit().await
}
