//! arXiv paper search over the public Atom API.

use chrono::Duration;
use feed_rs::model::Entry;
use pubcrawl_core::{AppConfig, CrawlRecord};
use reqwest::{Client, Url};

use crate::error::CrawlError;
use crate::http;
use crate::Crawler;

const DEFAULT_BASE_URL: &str = "https://export.arxiv.org/";
const SOURCE: &str = "arXiv";

/// Results per search unless [`ArxivCrawler::with_max_results`] says otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Client for the arXiv query API.
pub struct ArxivCrawler {
    client: Client,
    base_url: Url,
    max_results: usize,
}

impl ArxivCrawler {
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, CrawlError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a crawler with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`ArxivCrawler::new`], plus [`CrawlError::Invalid`] for a malformed
    /// `base_url`.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            client: http::build_client(timeout_secs, user_agent)?,
            base_url: http::parse_base_url(base_url)?,
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// # Errors
    ///
    /// As [`ArxivCrawler::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, CrawlError> {
        Self::new(config.http_timeout_secs, &config.user_agent)
    }

    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Newest papers matching `query`, dropping any submitted before
    /// `now - window`.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::Http`] on network failure.
    /// - [`CrawlError::Invalid`] if `window` reaches past the representable
    ///   date range.
    /// - [`CrawlError::Api`] on a non-2xx status.
    /// - [`CrawlError::Feed`] if the body is not an Atom feed.
    pub async fn search(
        &self,
        query: &str,
        window: Duration,
    ) -> Result<Vec<CrawlRecord>, CrawlError> {
        let cutoff = http::window_start(window)?;
        let max = self.max_results.to_string();
        let search_query = format!("all:{query}");
        let url = self.build_url(&[
            ("search_query", search_query.as_str()),
            ("sortBy", "submittedDate"),
            ("sortOrder", "descending"),
            ("max_results", max.as_str()),
        ])?;

        let records: Vec<CrawlRecord> = self
            .query_feed(url, &format!("search(query={query})"))
            .await?
            .into_iter()
            .filter(|record| record.published_at.is_none_or(|at| at >= cutoff))
            .collect();

        tracing::info!(query, papers = records.len(), "crawled arXiv");
        Ok(records)
    }

    /// Look up one paper by arXiv id, e.g. `2301.00001`.
    ///
    /// # Errors
    ///
    /// [`CrawlError::NotFound`] when arXiv has no such paper, otherwise as
    /// [`ArxivCrawler::search`].
    pub async fn get_by_id(&self, arxiv_id: &str) -> Result<CrawlRecord, CrawlError> {
        let arxiv_id = arxiv_id.trim();
        if arxiv_id.is_empty() {
            return Err(CrawlError::Invalid("arXiv id is empty".to_string()));
        }
        let url = self.build_url(&[("id_list", arxiv_id), ("max_results", "1")])?;
        self.query_feed(url, &format!("get_by_id(id={arxiv_id})"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CrawlError::NotFound {
                id: arxiv_id.to_string(),
            })
    }

    fn build_url(&self, params: &[(&str, &str)]) -> Result<Url, CrawlError> {
        let mut url = http::join(&self.base_url, "api/query")?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    async fn query_feed(&self, url: Url, context: &str) -> Result<Vec<CrawlRecord>, CrawlError> {
        let response = self.client.get(url).send().await?;
        let body = http::success_body(response, SOURCE, |_| None).await?;
        parse_feed(&body, context)
    }
}

impl Crawler for ArxivCrawler {
    fn source(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, query: &str, window: Duration) -> Result<Vec<CrawlRecord>, CrawlError> {
        self.search(query, window).await
    }
}

/// Records for every paper entry in an arXiv Atom response.
///
/// arXiv reports bad queries as a single entry whose id points at
/// `/api/errors`; those entries are skipped.
pub(crate) fn parse_feed(body: &str, context: &str) -> Result<Vec<CrawlRecord>, CrawlError> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|e| CrawlError::Feed {
        context: format!("arXiv {context}"),
        source: e,
    })?;
    Ok(feed
        .entries
        .into_iter()
        .filter(|entry| !entry.id.contains("/api/errors"))
        .map(paper_record)
        .collect())
}

fn paper_record(entry: Entry) -> CrawlRecord {
    let arxiv_id = entry
        .id
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let link = pdf_link(&entry).unwrap_or_else(|| entry.id.replacen("/abs/", "/pdf/", 1));
    let categories: Vec<String> = entry.categories.into_iter().map(|c| c.term).collect();

    CrawlRecord {
        id: arxiv_id,
        title: entry
            .title
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default(),
        authors: entry.authors.into_iter().map(|a| a.name).collect(),
        source: SOURCE.to_string(),
        summary: entry
            .summary
            .map(|s| collapse_whitespace(&s.content))
            .unwrap_or_default(),
        published_at: entry.published.or(entry.updated),
        link,
        // arXiv lists the primary category first.
        category: categories.first().cloned(),
        categories,
        content: None,
    }
}

fn pdf_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .iter()
        .find(|link| {
            link.title.as_deref() == Some("pdf")
                || link.media_type.as_deref() == Some("application/pdf")
        })
        .map(|link| link.href.clone())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
