//! The [`Publisher`] seam shared by every platform, plus the offline publisher.

use crate::error::PublishError;
use crate::types::{Platform, PublishOutcome, PublishRequest};

/// A component that submits content to one external platform.
///
/// Calls are issued one at a time; implementations are not expected to be
/// shared between tasks.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    fn platform(&self) -> Platform;

    /// Submit `request`.
    ///
    /// # Errors
    ///
    /// Returns the platform's [`PublishError`]. A UI flow that needs a human
    /// to finish reports `Ok(PublishOutcome::ManualInterventionRequired)`
    /// rather than an error.
    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError>;
}

/// Logs the request and returns a synthetic identifier without any network
/// effect. Handy for dry runs of a batch.
#[derive(Debug, Default)]
pub struct OfflinePublisher {
    published: Vec<String>,
}

impl OfflinePublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers handed out so far, in order.
    #[must_use]
    pub fn published(&self) -> &[String] {
        &self.published
    }
}

impl Publisher for OfflinePublisher {
    fn platform(&self) -> Platform {
        Platform::Offline
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let id = format!("offline_{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            id = %id,
            title = %request.title,
            body_chars = request.body.chars().count(),
            tags = request.tags.len(),
            media = request.media.len(),
            "offline publish"
        );
        self.published.push(id.clone());
        Ok(PublishOutcome::Published { id })
    }
}
