//! API publisher command handlers: Twitter, Bilibili and the offline
//! publisher.

use std::path::PathBuf;

use clap::Subcommand;
use pubcrawl_bilibili::BilibiliClient;
use pubcrawl_core::{
    AppConfig, MediaRef, OfflinePublisher, PublishError, PublishOutcome, PublishRequest, Publisher,
};
use pubcrawl_twitter::TwitterClient;

/// Sub-commands available under `bilibili`.
#[derive(Debug, Subcommand)]
pub enum BilibiliCommands {
    /// Post a text dynamic
    Post { text: String },
    /// Delete a dynamic by id
    Delete { id: String },
}

/// Sub-commands available under `offline`.
#[derive(Debug, Subcommand)]
pub enum OfflineCommands {
    /// Log the post and print a synthetic id
    Publish {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

pub(crate) async fn run_tweet(
    config: &AppConfig,
    text: &str,
    media: &[PathBuf],
) -> anyhow::Result<()> {
    let client = TwitterClient::from_config(config)?;
    let media: Vec<MediaRef> = media
        .iter()
        .map(|path| MediaRef { path: path.clone() })
        .collect();
    let posted = client.post_tweet(text, &media).await?;
    println!("posted tweet {}", posted.id());
    Ok(())
}

/// Post a thread; on a mid-thread failure the ids that did go out are
/// printed before the error is returned.
pub(crate) async fn run_thread(config: &AppConfig, texts: &[String]) -> anyhow::Result<()> {
    let client = TwitterClient::from_config(config)?;
    match client.post_thread(texts).await {
        Ok(ids) => {
            println!("posted thread of {} tweets: {}", ids.len(), ids.join(", "));
            Ok(())
        }
        Err(PublishError::ThreadInterrupted { posted, source }) => {
            println!(
                "thread interrupted after {} of {} tweets: {}",
                posted.len(),
                texts.len(),
                posted.join(", ")
            );
            Err(anyhow::Error::new(*source).context("thread interrupted"))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn run_delete_tweet(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    TwitterClient::from_config(config)?.delete_tweet(id).await?;
    println!("deleted tweet {id}");
    Ok(())
}

pub(crate) async fn run_bilibili(
    config: &AppConfig,
    command: BilibiliCommands,
) -> anyhow::Result<()> {
    let client = BilibiliClient::from_config(config)?;
    match command {
        BilibiliCommands::Post { text } => {
            let id = client.post_dynamic(&text).await?;
            println!("posted dynamic {id}");
        }
        BilibiliCommands::Delete { id } => {
            client.delete_dynamic(&id).await?;
            println!("deleted dynamic {id}");
        }
    }
    Ok(())
}

pub(crate) async fn run_offline(command: OfflineCommands) -> anyhow::Result<()> {
    let OfflineCommands::Publish { title, body, tags } = command;
    let request = PublishRequest::new(title, body).with_tags(tags);
    let mut publisher = OfflinePublisher::new();
    print_outcome(&publisher.publish(&request).await?);
    Ok(())
}

pub(crate) fn print_outcome(outcome: &PublishOutcome) {
    match outcome {
        PublishOutcome::Published { id } => println!("published {id}"),
        PublishOutcome::ManualInterventionRequired { step, reason } => {
            println!("manual intervention required at step '{step}': {reason}");
        }
    }
}
