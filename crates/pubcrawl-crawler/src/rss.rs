//! Generic RSS/Atom feed reader.

use chrono::Duration;
use feed_rs::model::Entry;
use pubcrawl_core::text::strip_html;
use pubcrawl_core::{AppConfig, CrawlRecord};
use reqwest::Client;

use crate::error::CrawlError;
use crate::http;
use crate::Crawler;

/// Entries kept per feed, in feed order.
pub const MAX_ENTRIES: usize = 10;

/// Source name used when the feed has no title.
const FALLBACK_SOURCE: &str = "RSS";

pub struct RssCrawler {
    client: Client,
}

impl RssCrawler {
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, CrawlError> {
        Ok(Self {
            client: http::build_client(timeout_secs, user_agent)?,
        })
    }

    /// # Errors
    ///
    /// As [`RssCrawler::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, CrawlError> {
        Self::new(config.http_timeout_secs, &config.user_agent)
    }

    /// The first [`MAX_ENTRIES`] entries of the feed at `feed_url`.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::Http`] on network failure.
    /// - [`CrawlError::Api`] on a non-2xx status.
    /// - [`CrawlError::Feed`] if the body is not RSS, Atom or JSON Feed.
    pub async fn read_feed(&self, feed_url: &str) -> Result<Vec<CrawlRecord>, CrawlError> {
        let response = self.client.get(feed_url).send().await?;
        let body = http::success_body(response, FALLBACK_SOURCE, |_| None).await?;
        let records = parse_feed(&body, feed_url)?;
        tracing::info!(feed_url, entries = records.len(), "crawled feed");
        Ok(records)
    }
}

impl Crawler for RssCrawler {
    fn source(&self) -> &'static str {
        FALLBACK_SOURCE
    }

    /// `query` is the feed URL. Feeds carry their own recency, so `window`
    /// is not applied.
    async fn fetch(&self, query: &str, _window: Duration) -> Result<Vec<CrawlRecord>, CrawlError> {
        self.read_feed(query).await
    }
}

pub(crate) fn parse_feed(body: &str, feed_url: &str) -> Result<Vec<CrawlRecord>, CrawlError> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| CrawlError::Feed {
        context: feed_url.to_string(),
        source: e,
    })?;
    let source = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| FALLBACK_SOURCE.to_string());

    Ok(feed
        .entries
        .into_iter()
        .take(MAX_ENTRIES)
        .map(|entry| entry_record(entry, &source))
        .collect())
}

fn entry_record(entry: Entry, source: &str) -> CrawlRecord {
    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();
    let id = if entry.id.is_empty() {
        link.clone()
    } else {
        entry.id
    };
    let summary = entry.summary.map(|s| s.content);
    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| summary.clone());
    let categories: Vec<String> = entry.categories.into_iter().map(|c| c.term).collect();

    CrawlRecord {
        id,
        title: entry
            .title
            .map(|t| strip_html(&t.content))
            .unwrap_or_default(),
        authors: entry.authors.into_iter().map(|a| a.name).collect(),
        source: source.to_string(),
        summary: summary.as_deref().map(strip_html).unwrap_or_default(),
        published_at: entry.published.or(entry.updated),
        link,
        category: categories.first().cloned(),
        categories,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: usize, channel_title: &str) -> String {
        let items: String = (1..=items)
            .map(|n| {
                format!(
                    "<item><title>Story {n}</title><link>https://example.com/{n}</link>\
                     <guid>story-{n}</guid><description>&lt;p&gt;Summary {n}&lt;/p&gt;</description>\
                     <pubDate>Wed, 01 May 2024 10:00:00 GMT</pubDate></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel>{channel_title}{items}</channel></rss>"#
        )
    }

    #[test]
    fn keeps_first_ten_entries_in_order() {
        let records = parse_feed(&rss(12, "<title>Tech Feed</title>"), "test").unwrap();
        assert_eq!(records.len(), MAX_ENTRIES);
        assert_eq!(records[0].title, "Story 1");
        assert_eq!(records[9].link, "https://example.com/10");
        assert!(records.iter().all(|r| r.source == "Tech Feed"));
    }

    #[test]
    fn untitled_feed_uses_rss_as_source() {
        let records = parse_feed(&rss(1, ""), "test").unwrap();
        assert_eq!(records[0].source, "RSS");
        assert_eq!(records[0].id, "story-1");
        assert_eq!(records[0].summary, "Summary 1");
        assert!(records[0].published_at.is_some());
    }

    #[test]
    fn html_page_is_a_feed_error() {
        let err = parse_feed("<html><body>nope</body></html>", "https://example.com").unwrap_err();
        assert!(matches!(err, CrawlError::Feed { .. }), "got {err:?}");
    }
}
