//! Zhihu column article publishing through the web editor.
//!
//! Zhihu authenticates through a browser profile that was logged in by hand
//! once; the flow never types credentials.

use std::time::Duration;

use pubcrawl_core::{AppConfig, Platform, PublishError, PublishOutcome, PublishRequest, Publisher};

use crate::driver::PageDriver;
use crate::flow::{self, click_optional, required, Step, StepWait};
use crate::locator::{LocatorTable, ZhihuLocators};
use crate::webdriver::{SessionOptions, WebDriverClient, WebDriverSession};

pub const WRITE_URL: &str = "https://zhuanlan.zhihu.com/write";

pub struct ZhihuPublisher<D> {
    driver: D,
    locators: ZhihuLocators,
    wait: StepWait,
}

impl ZhihuPublisher<WebDriverSession> {
    /// Start a browser on the configured profile directory.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Config`] when `ZHIHU_PROFILE_DIR` is unset or the
    ///   locator table cannot be loaded.
    /// - [`PublishError::WebDriver`] / [`PublishError::NetworkFailure`] when
    ///   the browser cannot be started.
    pub async fn connect(config: &AppConfig) -> Result<Self, PublishError> {
        let credentials = config.zhihu_credentials()?;
        let table = LocatorTable::load_or_default(config.browser_locators_path.as_deref())?;
        let session = WebDriverClient::from_config(config)?
            .new_session(&SessionOptions {
                headless: config.webdriver_headless,
                user_data_dir: Some(credentials.profile_dir),
            })
            .await?;
        Ok(Self::new(session, table.zhihu, StepWait::from_config(config)))
    }
}

impl<D: PageDriver> ZhihuPublisher<D> {
    pub fn new(driver: D, locators: ZhihuLocators, wait: StepWait) -> Self {
        Self {
            driver,
            locators,
            wait,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Write and publish one article.
    ///
    /// The Markdown-parse prompt Zhihu shows after pasting Markdown is
    /// confirmed when it appears and ignored otherwise. Success is the click
    /// on the publish dialog's confirm button; the article id is taken from
    /// the resulting `/p/<id>` URL when the page has already moved there.
    ///
    /// # Errors
    ///
    /// - [`PublishError::SessionInvalid`] when the profile is not logged in.
    /// - Driver failures. A control that never appears is reported as
    ///   `Ok(ManualInterventionRequired)`.
    pub async fn publish_article(
        &mut self,
        title: &str,
        content: &str,
    ) -> Result<PublishOutcome, PublishError> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(PublishError::Invalid(
                "zhihu articles need both a title and content".to_string(),
            ));
        }
        tracing::info!(title, chars = content.chars().count(), "publishing Zhihu article");

        self.driver.navigate(WRITE_URL).await?;
        flow::ensure_logged_in(&mut self.driver).await?;

        let title_box =
            match required(&mut self.driver, "title", &self.locators.title, self.wait).await? {
                Step::Continue(element) => element,
                Step::Manual(outcome) => return Ok(outcome),
            };
        self.driver.type_text(&title_box, title).await?;

        let editor = match required(&mut self.driver, "body", &self.locators.body, self.wait).await?
        {
            Step::Continue(element) => element,
            Step::Manual(outcome) => return Ok(outcome),
        };
        self.driver.click(&editor).await?;
        self.driver.fill_editor(&editor, content).await?;

        click_optional(
            &mut self.driver,
            "markdown_confirm",
            &self.locators.markdown_confirm,
            self.wait.optional(),
        )
        .await?;

        for (step, locators) in [
            ("publish", &self.locators.publish),
            ("publish_confirm", &self.locators.publish_confirm),
        ] {
            match required(&mut self.driver, step, locators, self.wait).await? {
                Step::Continue(button) => self.driver.click(&button).await?,
                Step::Manual(outcome) => return Ok(outcome),
            }
            tracing::info!(step, "clicked");
        }

        let url = self.driver.current_url().await?;
        let id = article_id(&url)
            .unwrap_or_else(|| format!("submitted_{}", chrono::Utc::now().timestamp()));
        tracing::info!(id = %id, "article published");
        Ok(PublishOutcome::Published { id })
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
}

impl<D: PageDriver> Publisher for ZhihuPublisher<D> {
    fn platform(&self) -> Platform {
        Platform::Zhihu
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        self.publish_article(&request.title, &request.full_body())
            .await
    }
}

fn article_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("zhuanlan.zhihu.com/p/")?;
    let id = rest.split(['?', '#', '/']).next()?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_id_from_published_url() {
        assert_eq!(
            article_id("https://zhuanlan.zhihu.com/p/712345678?utm=x"),
            Some("712345678".to_string())
        );
        assert_eq!(
            article_id("https://zhuanlan.zhihu.com/p/712345678/edit"),
            Some("712345678".to_string())
        );
        assert_eq!(article_id(WRITE_URL), None);
    }
}
