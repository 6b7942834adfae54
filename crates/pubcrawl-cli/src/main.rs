mod batch;
mod browser;
mod crawl;
mod publish;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::browser::BrowserCommands;
use crate::crawl::CrawlCommands;
use crate::publish::{BilibiliCommands, OfflineCommands};

/// Seconds a browser stays open for manual completion unless overridden.
const DEFAULT_KEEP_OPEN_SECS: u64 = 120;

#[derive(Debug, Parser)]
#[command(name = "pubcrawl")]
#[command(about = "Publish to social platforms and crawl content sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Post a tweet, optionally with media attachments
    Tweet {
        text: String,
        /// Image or video to attach (repeatable)
        #[arg(long = "media", value_name = "PATH")]
        media: Vec<PathBuf>,
    },
    /// Post a thread, each argument becoming one tweet
    Thread {
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Delete one of the account's tweets
    DeleteTweet { id: String },
    /// Bilibili dynamic feed
    Bilibili {
        #[command(subcommand)]
        command: BilibiliCommands,
    },
    /// Xiaohongshu notes through the creator center
    Xhs {
        #[command(subcommand)]
        command: BrowserCommands,
    },
    /// Zhihu column articles through the web editor
    Zhihu {
        #[command(subcommand)]
        command: BrowserCommands,
    },
    /// Publish without any network effect
    Offline {
        #[command(subcommand)]
        command: OfflineCommands,
    },
    /// Publish a JSON queue, skipping ids already in the ledger
    Batch {
        /// JSON array of {id, title?, body, tags?}
        #[arg(long)]
        queue: PathBuf,
        #[arg(long, value_enum)]
        platform: BatchPlatform,
        /// Template variable for {{ name }} placeholders (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// Override PUBCRAWL_BATCH_COOLDOWN_SECS
        #[arg(long)]
        cooldown_secs: Option<u64>,
        /// Seconds to keep a browser open after a run needing manual help
        #[arg(long, default_value_t = DEFAULT_KEEP_OPEN_SECS)]
        keep_open: u64,
    },
    /// Fetch records from a content source and print them as JSON
    Crawl {
        #[command(subcommand)]
        command: CrawlCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BatchPlatform {
    Twitter,
    Bilibili,
    Xhs,
    Zhihu,
    Offline,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("variable name is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = pubcrawl_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Tweet { text, media } => publish::run_tweet(&config, &text, &media).await,
        Commands::Thread { texts } => publish::run_thread(&config, &texts).await,
        Commands::DeleteTweet { id } => publish::run_delete_tweet(&config, &id).await,
        Commands::Bilibili { command } => publish::run_bilibili(&config, command).await,
        Commands::Offline { command } => publish::run_offline(command).await,
        Commands::Xhs { command } => browser::run_xhs(&config, command).await,
        Commands::Zhihu { command } => browser::run_zhihu(&config, command).await,
        Commands::Batch {
            queue,
            platform,
            vars,
            cooldown_secs,
            keep_open,
        } => {
            let options = batch::BatchOptions {
                queue,
                platform,
                variables: vars.into_iter().collect(),
                cooldown_secs: cooldown_secs.unwrap_or(config.batch_cooldown_secs),
                keep_open_secs: keep_open,
            };
            batch::run_batch(&config, options).await
        }
        Commands::Crawl { command } => crawl::run_crawl(&config, command).await,
    }
}
