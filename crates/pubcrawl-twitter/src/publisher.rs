use pubcrawl_core::{Platform, PublishError, PublishOutcome, PublishRequest, Publisher};

use crate::client::TwitterClient;

/// Joins title and body the way a single tweet carries them.
pub(crate) fn compose_tweet(request: &PublishRequest) -> String {
    let body = request.full_body();
    let title = request.title.trim();
    if title.is_empty() || body.trim_start().starts_with(title) {
        body
    } else if body.trim().is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{body}")
    }
}

impl Publisher for TwitterClient {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn publish(&mut self, request: &PublishRequest) -> Result<PublishOutcome, PublishError> {
        let text = compose_tweet(request);
        let posted = self.post_tweet(&text, &request.media).await?;
        Ok(PublishOutcome::Published {
            id: posted.id().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_body_are_joined() {
        let req = PublishRequest::new("Launch", "We shipped it.");
        assert_eq!(compose_tweet(&req), "Launch\n\nWe shipped it.");
    }

    #[test]
    fn body_already_starting_with_title_is_not_duplicated() {
        let req = PublishRequest::new("Launch", "Launch day! We shipped it.");
        assert_eq!(compose_tweet(&req), "Launch day! We shipped it.");
    }

    #[test]
    fn tags_follow_body() {
        let req = PublishRequest::new("", "Hello").with_tags(vec!["rust".into()]);
        assert_eq!(compose_tweet(&req), "Hello\n\n#rust");
    }
}
