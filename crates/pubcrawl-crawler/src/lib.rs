//! Read-only crawlers that normalize arXiv, NewsAPI and RSS/Atom sources
//! into [`pubcrawl_core::CrawlRecord`]s.
//!
//! No retry beyond the HTTP client's own behavior; a failed crawl can be
//! repeated as a whole.

pub mod arxiv;
pub mod error;
mod http;
pub mod news;
pub mod rss;

pub use arxiv::ArxivCrawler;
pub use error::CrawlError;
pub use news::{sample_articles, NewsCrawler};
pub use rss::RssCrawler;

use chrono::Duration;
use pubcrawl_core::CrawlRecord;

/// A source that can be searched for records newer than a time window.
#[allow(async_fn_in_trait)]
pub trait Crawler {
    /// Human-readable source name for logs.
    fn source(&self) -> &'static str;

    /// Records matching `query` from roughly the last `window`.
    async fn fetch(&self, query: &str, window: Duration) -> Result<Vec<CrawlRecord>, CrawlError>;
}
