//! Crawl command handlers. Results are printed to stdout as pretty JSON.

use chrono::Duration;
use clap::Subcommand;
use pubcrawl_core::{AppConfig, CrawlRecord};
use pubcrawl_crawler::{ArxivCrawler, Crawler, NewsCrawler, RssCrawler};

/// Sub-commands available under `crawl`.
#[derive(Debug, Subcommand)]
pub enum CrawlCommands {
    /// Newest arXiv papers matching a query
    Arxiv {
        query: String,
        /// Drop papers submitted more than this many days ago
        #[arg(long, default_value = "7")]
        days: u32,
        /// Maximum number of papers to request
        #[arg(long, default_value = "10")]
        max: usize,
    },
    /// NewsAPI articles matching a query
    News {
        query: String,
        #[arg(long, default_value = "1")]
        days: u32,
    },
    /// First entries of an RSS or Atom feed
    Rss { url: String },
    /// One arXiv paper by id (e.g. 2301.00001)
    ArxivId { id: String },
}

pub(crate) async fn run_crawl(config: &AppConfig, command: CrawlCommands) -> anyhow::Result<()> {
    let records = match command {
        CrawlCommands::Arxiv { query, days, max } => {
            ArxivCrawler::from_config(config)?
                .with_max_results(max)
                .fetch(&query, Duration::days(i64::from(days)))
                .await?
        }
        CrawlCommands::News { query, days } => {
            NewsCrawler::from_config(config)?
                .fetch(&query, Duration::days(i64::from(days)))
                .await?
        }
        CrawlCommands::Rss { url } => RssCrawler::from_config(config)?.read_feed(&url).await?,
        CrawlCommands::ArxivId { id } => {
            vec![ArxivCrawler::from_config(config)?.get_by_id(&id).await?]
        }
    };
    print_records(&records)
}

fn print_records(records: &[CrawlRecord]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}
