//! Browser-driven publisher command handlers (Xiaohongshu, Zhihu).
//!
//! After a publish that needs manual help the browser is left open for
//! `--keep-open` seconds, or until its window is closed, before the session
//! ends.

use std::time::Duration;

use clap::Subcommand;
use pubcrawl_browser::{XiaohongshuPublisher, ZhihuPublisher};
use pubcrawl_core::{AppConfig, PublishOutcome};

use crate::publish::print_outcome;
use crate::DEFAULT_KEEP_OPEN_SECS;

/// Sub-commands shared by `xhs` and `zhihu`.
#[derive(Debug, Subcommand)]
pub enum BrowserCommands {
    /// Fill the editor and submit one post
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Topic tag appended to the body as #tag (Xiaohongshu only, repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Seconds to keep the browser open when manual help is needed
        #[arg(long, default_value_t = DEFAULT_KEEP_OPEN_SECS)]
        keep_open: u64,
    },
}

pub(crate) async fn run_xhs(config: &AppConfig, command: BrowserCommands) -> anyhow::Result<()> {
    let BrowserCommands::Publish {
        title,
        body,
        tags,
        keep_open,
    } = command;

    let mut publisher = XiaohongshuPublisher::connect(config).await?;
    let result = publisher.publish_note(&title, &body, &tags).await;
    match &result {
        Ok(outcome @ PublishOutcome::ManualInterventionRequired { .. }) => {
            print_outcome(outcome);
            println!("browser stays open for {keep_open}s; finish the post there");
            publisher
                .close_after(Duration::from_secs(keep_open))
                .await?;
        }
        Ok(outcome) => {
            print_outcome(outcome);
            publisher.close().await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "xiaohongshu publish failed");
            if let Err(close_err) = publisher.close().await {
                tracing::warn!(error = %close_err, "could not close browser session");
            }
        }
    }
    result.map(|_| ()).map_err(Into::into)
}

pub(crate) async fn run_zhihu(config: &AppConfig, command: BrowserCommands) -> anyhow::Result<()> {
    let BrowserCommands::Publish {
        title,
        body,
        tags,
        keep_open,
    } = command;
    if !tags.is_empty() {
        tracing::warn!(tags = tags.len(), "zhihu articles ignore --tag");
    }

    let mut publisher = ZhihuPublisher::connect(config).await?;
    let result = publisher.publish_article(&title, &body).await;
    match &result {
        Ok(outcome @ PublishOutcome::ManualInterventionRequired { .. }) => {
            print_outcome(outcome);
            println!("browser stays open for {keep_open}s; finish the article there");
            publisher
                .close_after(Duration::from_secs(keep_open))
                .await?;
        }
        Ok(outcome) => {
            print_outcome(outcome);
            publisher.close().await?;
        }
        Err(e) => {
            tracing::error!(error = %e, "zhihu publish failed");
            if let Err(close_err) = publisher.close().await {
                tracing::warn!(error = %close_err, "could not close browser session");
            }
        }
    }
    result.map(|_| ()).map_err(Into::into)
}
