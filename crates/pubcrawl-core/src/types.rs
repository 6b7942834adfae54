use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target platform of a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Bilibili,
    Xiaohongshu,
    Zhihu,
    Offline,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Twitter => write!(f, "twitter"),
            Platform::Bilibili => write!(f, "bilibili"),
            Platform::Xiaohongshu => write!(f, "xiaohongshu"),
            Platform::Zhihu => write!(f, "zhihu"),
            Platform::Offline => write!(f, "offline"),
        }
    }
}

/// A local media file to attach to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub path: PathBuf,
}

/// Content to publish. Constructed per call and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PublishRequest {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: Vec<MediaRef>) -> Self {
        self.media = media;
        self
    }

    /// Build a request from a Markdown document, using its first non-empty
    /// line (with `#` markers removed) as the title.
    #[must_use]
    pub fn from_markdown(body: &str) -> Self {
        let title = body
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(|line| line.replace('#', "").trim().to_string())
            .unwrap_or_default();
        Self::new(title, body.trim())
    }

    /// Body followed by a blank line and the tags as `#tag` tokens.
    #[must_use]
    pub fn full_body(&self) -> String {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| t.trim().trim_start_matches('#'))
            .filter(|t| !t.is_empty())
            .map(|t| format!("#{t}"))
            .collect();
        if tags.is_empty() {
            self.body.clone()
        } else {
            format!("{}\n\n{}", self.body, tags.join(" "))
        }
    }
}

/// Result of one publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// The platform accepted the post and assigned `id`.
    Published { id: String },
    /// Automation stopped at `step`; a human has to finish it in the still
    /// open session. No identifier is confirmed.
    ManualInterventionRequired { step: String, reason: String },
}

impl PublishOutcome {
    #[must_use]
    pub fn published_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::Published { id } => Some(id),
            PublishOutcome::ManualInterventionRequired { .. } => None,
        }
    }
}

/// Uniform crawl result across arXiv, NewsAPI and RSS sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlRecord {
    /// Source-specific identifier (arXiv id, article URL, feed entry id).
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// Publication or feed name.
    pub source: String,
    pub summary: String,
    pub published_at: Option<DateTime<Utc>>,
    pub link: String,
    /// Primary category, when the source has one.
    pub category: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub content: Option<String>,
}
