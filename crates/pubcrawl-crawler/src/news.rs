//! NewsAPI `everything` search.
//!
//! Without an API key the crawler either serves a fixed two-article sample
//! (when `PUBCRAWL_SAMPLE_FALLBACK` is on) or refuses with
//! [`CrawlError::MissingCredential`]. Request failures always propagate.

use chrono::{DateTime, Duration, Utc};
use pubcrawl_core::{AppConfig, CrawlRecord};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::CrawlError;
use crate::http;
use crate::Crawler;

const DEFAULT_BASE_URL: &str = "https://newsapi.org/";
const SOURCE: &str = "NewsAPI";

/// Articles requested per search.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    #[serde(default)]
    source: ArticleSource,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Client for `newsapi.org`.
pub struct NewsCrawler {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    sample_fallback: bool,
}

impl NewsCrawler {
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the HTTP client cannot be built.
    pub fn new(
        api_key: Option<String>,
        sample_fallback: bool,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CrawlError> {
        Self::with_base_url(
            api_key,
            sample_fallback,
            timeout_secs,
            user_agent,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a crawler with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`NewsCrawler::new`], plus [`CrawlError::Invalid`] for a malformed
    /// `base_url`.
    pub fn with_base_url(
        api_key: Option<String>,
        sample_fallback: bool,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, CrawlError> {
        Ok(Self {
            client: http::build_client(timeout_secs, user_agent)?,
            base_url: http::parse_base_url(base_url)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            sample_fallback,
        })
    }

    /// Uses `NEWSAPI_KEY` and `PUBCRAWL_SAMPLE_FALLBACK` from `config`.
    ///
    /// # Errors
    ///
    /// As [`NewsCrawler::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, CrawlError> {
        Self::new(
            config.newsapi_key.clone(),
            config.sample_fallback,
            config.http_timeout_secs,
            &config.user_agent,
        )
    }

    /// Newest English articles for `query` published within `window`.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::MissingCredential`] without a key when the sample
    ///   fallback is off.
    /// - [`CrawlError::Invalid`] if `window` reaches past the representable
    ///   date range.
    /// - [`CrawlError::Api`] on a non-2xx status, carrying NewsAPI's message.
    /// - [`CrawlError::Http`] / [`CrawlError::Deserialize`] on transport or
    ///   body failures.
    pub async fn everything(
        &self,
        query: &str,
        window: Duration,
    ) -> Result<Vec<CrawlRecord>, CrawlError> {
        let Some(api_key) = self.api_key.as_deref() else {
            if self.sample_fallback {
                tracing::warn!("NEWSAPI_KEY not set, returning sample articles");
                return Ok(sample_articles());
            }
            return Err(CrawlError::MissingCredential("NEWSAPI_KEY".to_string()));
        };

        let from = http::window_start(window)?.format("%Y-%m-%d").to_string();
        let page_size = PAGE_SIZE.to_string();
        let mut url = http::join(&self.base_url, "v2/everything")?;
        url.query_pairs_mut().extend_pairs([
            ("q", query),
            ("from", from.as_str()),
            ("sortBy", "publishedAt"),
            ("language", "en"),
            ("pageSize", page_size.as_str()),
            ("apiKey", api_key),
        ]);

        let response = self.client.get(url).send().await?;
        let body = http::success_body(response, SOURCE, |body| {
            serde_json::from_str::<ApiErrorBody>(body)
                .ok()
                .and_then(|e| e.message)
        })
        .await?;

        let parsed: EverythingResponse =
            serde_json::from_str(&body).map_err(|e| CrawlError::Deserialize {
                context: format!("everything(q={query})"),
                source: e,
            })?;
        let records: Vec<CrawlRecord> = parsed
            .articles
            .into_iter()
            .filter_map(article_record)
            .collect();

        tracing::info!(query, articles = records.len(), "crawled NewsAPI");
        Ok(records)
    }
}

impl Crawler for NewsCrawler {
    fn source(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(&self, query: &str, window: Duration) -> Result<Vec<CrawlRecord>, CrawlError> {
        self.everything(query, window).await
    }
}

/// Articles without a URL cannot be linked or deduplicated and are dropped.
fn article_record(article: Article) -> Option<CrawlRecord> {
    let url = article.url.filter(|u| !u.is_empty())?;
    Some(CrawlRecord {
        id: url.clone(),
        title: article.title.unwrap_or_default(),
        authors: article.author.into_iter().collect(),
        source: article.source.name.unwrap_or_else(|| SOURCE.to_string()),
        summary: article.description.unwrap_or_default(),
        published_at: article
            .published_at
            .and_then(|at| DateTime::parse_from_rfc3339(&at).ok())
            .map(|at| at.with_timezone(&Utc)),
        link: url,
        category: None,
        categories: Vec::new(),
        content: article.content,
    })
}

/// The fixed stand-in set served when no API key is configured.
#[must_use]
pub fn sample_articles() -> Vec<CrawlRecord> {
    let now = Utc::now();
    let sample = |n: u32, title: &str, summary: &str, source: &str, content: &str| {
        let link = format!("https://example.com/news/{n}");
        CrawlRecord {
            id: link.clone(),
            title: title.to_string(),
            authors: Vec::new(),
            source: source.to_string(),
            summary: summary.to_string(),
            published_at: Some(now),
            link,
            category: None,
            categories: Vec::new(),
            content: Some(content.to_string()),
        }
    };
    vec![
        sample(
            1,
            "Sample Tech News: AI Breakthrough",
            "Researchers announce major breakthrough in AI technology",
            "Tech Daily",
            "Sample content about AI breakthrough...",
        ),
        sample(
            2,
            "Sample Tech News: New Framework Released",
            "Popular framework releases version 2.0 with new features",
            "Dev News",
            "Sample content about framework release...",
        ),
    ]
}
