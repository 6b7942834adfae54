//! Ledger-guarded batch publishing.
//!
//! Items are processed strictly in queue order. An item whose id is already
//! in the [`DedupLedger`] is skipped without touching the publisher; an item
//! is appended to the ledger only after the publisher confirmed it. A fixed
//! cooldown separates consecutive publish attempts.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, PublishError};
use crate::ledger::DedupLedger;
use crate::publisher::Publisher;
use crate::template::render_template;
use crate::types::{PublishOutcome, PublishRequest};

/// One queued post, keyed by the caller's own identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: String,
    pub request: PublishRequest,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

#[derive(Deserialize)]
struct RawQueueItem {
    id: RawId,
    title: Option<String>,
    body: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Load a JSON array of `{id, title?, body, tags?}` objects.
///
/// Items without a title get one derived from the first line of the body.
/// Items with an empty body are dropped with a warning. A blank or
/// multi-line id rejects the whole queue, since it could never be recorded
/// in the ledger.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] or [`ConfigError::FileParse`].
pub fn load_queue(path: &Path) -> Result<Vec<QueueItem>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_queue(&content).map_err(|e| ConfigError::FileParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_queue(content: &str) -> Result<Vec<QueueItem>, serde_json::Error> {
    let raw: Vec<RawQueueItem> = serde_json::from_str(content)?;
    let mut items = Vec::with_capacity(raw.len());
    for (index, item) in raw.into_iter().enumerate() {
        let id = match item.id {
            RawId::Text(s) => s.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        };
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(serde::de::Error::custom(format!(
                "queue item {index} has a blank or multi-line id"
            )));
        }
        if item.body.trim().is_empty() {
            tracing::warn!(id = %id, "skipping queue item with empty body");
            continue;
        }
        let request = match item.title.filter(|t| !t.trim().is_empty()) {
            Some(title) => PublishRequest::new(title.trim(), item.body.trim()),
            None => PublishRequest::from_markdown(&item.body),
        };
        items.push(QueueItem {
            id,
            request: request.with_tags(item.tags),
        });
    }
    Ok(items)
}

/// What happened to each queue item in a run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(queue id, platform id)` pairs.
    pub published: Vec<(String, String)>,
    pub skipped: Vec<String>,
    /// `(queue id, step)` pairs left for a human.
    pub manual: Vec<(String, String)>,
    /// `(queue id, error)` pairs.
    pub failed: Vec<(String, String)>,
    /// Set when a session-level failure stopped the run early.
    pub aborted: Option<String>,
    /// Set when the run stopped at a manual-intervention item so the page
    /// stays as the publisher left it.
    pub held_for_manual: bool,
}

pub struct BatchRunner {
    ledger: DedupLedger,
    cooldown: Duration,
    variables: HashMap<String, String>,
    stop_on_manual: bool,
}

impl BatchRunner {
    #[must_use]
    pub fn new(ledger: DedupLedger, cooldown: Duration) -> Self {
        Self {
            ledger,
            cooldown,
            variables: HashMap::new(),
            stop_on_manual: false,
        }
    }

    /// Values for `{{ name }}` placeholders in queued titles and bodies.
    #[must_use]
    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    /// Stop after the first item that needs manual help instead of moving on.
    ///
    /// Browser publishers reuse one session, so the next item would navigate
    /// away from the page a human is expected to finish.
    #[must_use]
    pub fn with_stop_on_manual(mut self, stop: bool) -> Self {
        self.stop_on_manual = stop;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    /// Publish every item not yet in the ledger, in order.
    ///
    /// Per-item failures are recorded in the report and the run continues.
    /// An invalid session or configuration stops the run, since every later
    /// item would fail the same way.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Ledger`] if a confirmed publish cannot be
    /// recorded; continuing would risk publishing it again.
    pub async fn run<P: Publisher>(
        &mut self,
        publisher: &mut P,
        items: &[QueueItem],
    ) -> Result<BatchReport, PublishError> {
        let platform = publisher.platform();
        let mut report = BatchReport::default();
        let mut attempted = false;
        let total = items.len();

        for (index, item) in items.iter().enumerate() {
            if self.ledger.is_published(&item.id) {
                tracing::info!(id = %item.id, "already published, skipping");
                report.skipped.push(item.id.clone());
                continue;
            }

            if attempted && !self.cooldown.is_zero() {
                tracing::info!(
                    cooldown_secs = self.cooldown.as_secs(),
                    "cooling down before next publish"
                );
                tokio::time::sleep(self.cooldown).await;
            }
            attempted = true;

            let request = self.render(&item.request);
            tracing::info!(
                %platform,
                id = %item.id,
                position = index + 1,
                total,
                title = %request.title,
                "publishing queue item"
            );

            match publisher.publish(&request).await {
                Ok(PublishOutcome::Published { id }) => {
                    self.ledger.mark_published(&item.id)?;
                    tracing::info!(%platform, id = %item.id, remote_id = %id, "published");
                    report.published.push((item.id.clone(), id));
                }
                Ok(PublishOutcome::ManualInterventionRequired { step, reason }) => {
                    tracing::warn!(
                        %platform,
                        id = %item.id,
                        step = %step,
                        reason = %reason,
                        "manual intervention required; not recorded as published"
                    );
                    report.manual.push((item.id.clone(), step));
                    if self.stop_on_manual {
                        tracing::info!(id = %item.id, "holding the run for manual completion");
                        report.held_for_manual = true;
                        break;
                    }
                }
                Err(err @ (PublishError::SessionInvalid(_) | PublishError::Config(_))) => {
                    tracing::error!(%platform, id = %item.id, error = %err, "aborting batch");
                    report.failed.push((item.id.clone(), err.to_string()));
                    report.aborted = Some(err.to_string());
                    break;
                }
                Err(err) => {
                    tracing::error!(%platform, id = %item.id, error = %err, "publish failed");
                    report.failed.push((item.id.clone(), err.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn render(&self, request: &PublishRequest) -> PublishRequest {
        if self.variables.is_empty() {
            return request.clone();
        }
        PublishRequest {
            title: render_template(&request.title, &self.variables),
            body: render_template(&request.body, &self.variables),
            ..request.clone()
        }
    }
}
