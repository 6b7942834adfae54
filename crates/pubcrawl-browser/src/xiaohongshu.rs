//! Xiaohongshu note publishing through the creator center UI.

use std::time::Duration;

use pubcrawl_core::text::sanitize_content;
use pubcrawl_core::{
    AppConfig, Platform, PublishError, PublishOutcome, PublishRequest, Publisher,
    XiaohongshuCredentials,
};
use tokio::time::Instant;

use crate::cookie::{for_domain, require_login_cookies};
use crate::driver::PageDriver;
use crate::flow::{self, click_optional, required, Step, StepWait};
use crate::locator::{LocatorTable, XiaohongshuLocators};
use crate::webdriver::{SessionOptions, WebDriverClient, WebDriverSession};

pub const EDITOR_URL: &str =
    "https://creator.xiaohongshu.com/publish/publish?source=official&from=tab_switch";
const MAIN_SITE_URL: &str = "https://www.xiaohongshu.com";
const CREATOR_URL: &str = "https://creator.xiaohongshu.com";

/// Note bodies longer than this are cut with `...`.
pub const MAX_NOTE_CHARS: usize = 1000;

/// Page texts that mean the note was accepted.
const SUCCESS_KEYWORDS: &[&str] = &["发布成功", "提交成功", "审核中", "发布完成"];

/// Publishes notes by driving the creator center editor.
///
/// The session is not closed after a manual-intervention result; call
/// [`XiaohongshuPublisher::close`] or [`XiaohongshuPublisher::close_after`]
/// when done.
pub struct XiaohongshuPublisher<D> {
    driver: D,
    cookies: Vec<(String, String)>,
    cookies_injected: bool,
    locators: XiaohongshuLocators,
    wait: StepWait,
}

impl XiaohongshuPublisher<WebDriverSession> {
    /// Validate the cookie, then start a browser for it.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Config`] when `XHS_COOKIE` is unset or the locator
    ///   table cannot be loaded.
    /// - [`PublishError::SessionInvalid`] when the cookie does not look
    ///   logged in. No browser is started in that case.
    /// - [`PublishError::WebDriver`] / [`PublishError::NetworkFailure`] when
    ///   the browser cannot be started.
    pub async fn connect(config: &AppConfig) -> Result<Self, PublishError> {
        let credentials = config.xiaohongshu_credentials()?;
        require_login_cookies(&credentials.cookie)?;
        let table = LocatorTable::load_or_default(config.browser_locators_path.as_deref())?;

        let session = WebDriverClient::from_config(config)?
            .new_session(&SessionOptions {
                headless: config.webdriver_headless,
                user_data_dir: None,
            })
            .await?;
        Self::new(
            session,
            &credentials,
            table.xiaohongshu,
            StepWait::from_config(config),
        )
    }
}

impl<D: PageDriver> XiaohongshuPublisher<D> {
    /// # Errors
    ///
    /// Returns [`PublishError::SessionInvalid`] when the cookie's login
    /// score is too low.
    pub fn new(
        driver: D,
        credentials: &XiaohongshuCredentials,
        locators: XiaohongshuLocators,
        wait: StepWait,
    ) -> Result<Self, PublishError> {
        let cookies = require_login_cookies(&credentials.cookie)?;
        Ok(Self {
            driver,
            cookies,
            cookies_injected: false,
            locators,
            wait,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run the editor flow for one note.
    ///
    /// Steps: open the editor, optionally click "new creation", fill title,
    /// fill body (content plus `#tag`s), optionally click auto-format, click
    /// the preview's next button, click publish, then look for a result.
    ///
    /// # Errors
    ///
    /// - [`PublishError::SessionInvalid`] when the editor redirects to a
    ///   login page.
    /// - Driver failures. A control that never appears is reported as
    ///   `Ok(ManualInterventionRequired)`, not as an error.
    pub async fn publish_note(
        &mut self,
        title: &str,
        content: &str,
        tags: &[String],
    ) -> Result<PublishOutcome, PublishError> {
        tracing::info!(title, tags = tags.len(), "publishing Xiaohongshu note");
        self.inject_cookies().await?;

        self.driver.navigate(EDITOR_URL).await?;
        flow::ensure_logged_in(&mut self.driver).await?;

        let optional = self.wait.optional();
        click_optional(
            &mut self.driver,
            "new_creation",
            &self.locators.new_creation,
            optional,
        )
        .await?;

        let title_input =
            match required(&mut self.driver, "title", &self.locators.title, self.wait).await? {
                Step::Continue(element) => element,
                Step::Manual(outcome) => return Ok(outcome),
            };
        self.driver.type_text(&title_input, title).await?;

        let body = note_body(content, tags);
        let editor = match required(&mut self.driver, "body", &self.locators.body, self.wait).await?
        {
            Step::Continue(element) => element,
            Step::Manual(outcome) => return Ok(outcome),
        };
        self.driver.fill_editor(&editor, &body).await?;
        tracing::info!(chars = body.chars().count(), "note body filled");

        click_optional(
            &mut self.driver,
            "auto_format",
            &self.locators.auto_format,
            optional,
        )
        .await?;

        for (step, locators) in [
            ("preview_next", &self.locators.preview_next),
            ("publish", &self.locators.publish),
        ] {
            match required(&mut self.driver, step, locators, self.wait).await? {
                Step::Continue(button) => self.driver.click(&button).await?,
                Step::Manual(outcome) => return Ok(outcome),
            }
            tracing::info!(step, "clicked");
        }

        self.detect_result().await
    }

    /// Quit the browser now.
    ///
    /// # Errors
    ///
    /// Propagates a failure to end the session.
    pub async fn close(mut self) -> Result<(), PublishError> {
        self.driver.quit().await
    }

    /// Leave the browser open for `grace`, then quit it.
    ///
    /// # Errors
    ///
    /// Propagates a failure to end the session.
    pub async fn close_after(mut self, grace: Duration) -> Result<(), PublishError> {
        flow::close_after(&mut self.driver, grace).await
    }

    /// Set cookies on both the main site and the creator center, once per
    /// session.
    async fn inject_cookies(&mut self) -> Result<(), PublishError> {
        if self.cookies_injected {
            return Ok(());
        }
        self.driver.navigate(MAIN_SITE_URL).await?;
        self.driver.delete_all_cookies().await?;
        self.add_cookies(".xiaohongshu.com").await?;
        self.driver.navigate(CREATOR_URL).await?;
        self.add_cookies("creator.xiaohongshu.com").await?;
        self.cookies_injected = true;
        Ok(())
    }

    async fn add_cookies(&mut self, domain: &str) -> Result<(), PublishError> {
        let mut written = 0usize;
        for cookie in for_domain(&self.cookies, domain) {
            match self.driver.add_cookie(&cookie).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::debug!(name = %cookie.name, domain, error = %e, "cookie rejected");
                }
            }
        }
        tracing::info!(domain, written, total = self.cookies.len(), "cookies injected");
        self.driver.refresh().await
    }

    /// Look for a note id in the URL or a success message on the page.
    async fn detect_result(&mut self) -> Result<PublishOutcome, PublishError> {
        let deadline = Instant::now() + self.wait.timeout;
        loop {
            let url = self.driver.current_url().await?;
            if let Some(id) = explore_note_id(&url) {
                tracing::info!(id = %id, "note published");
                return Ok(PublishOutcome::Published { id });
            }
            let text = self.driver.page_text().await?;
            if let Some(keyword) = SUCCESS_KEYWORDS.iter().find(|k| text.contains(*k)) {
                let id = format!("submitted_{}", chrono::Utc::now().timestamp());
                tracing::info!(id = %id, keyword, "note submitted");
                return Ok(PublishOutcome::Published { id });
            }
            if Instant::now() >= deadline {
                return Ok(flow::manual(
                    "confirm_result",
                    &"publish was clicked but no confirmation appeared",
                ));
            }
            tokio::time::sleep(self.wait.poll_interval).await;
        }
    }
}

impl<D: PageDriver> Publisher for XiaohongshuPublisher<D> {
    fn platform(&self) -> Platform {
        Platform::Xiaohongshu
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        self.publish_note(&request.title, &request.body, &request.tags)
            .await
    }
}

/// Sanitized content followed by the tags as `#tag` tokens.
fn note_body(content: &str, tags: &[String]) -> String {
    let body = sanitize_content(content, MAX_NOTE_CHARS);
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{t}"))
        .collect();
    if tags.is_empty() {
        body
    } else {
        format!("{body}\n\n{}", tags.join(" "))
    }
}

/// The note id from an `/explore/<id>` URL.
fn explore_note_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/explore/")?;
    let id = rest.split(['?', '#', '/']).next()?;
    (!id.is_empty()).then(|| id.to_string())
}
