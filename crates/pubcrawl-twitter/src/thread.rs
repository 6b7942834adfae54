//! Replies and threads.
//!
//! A reply can only be posted against a [`PostedTweet`], so each tweet in a
//! thread is chained to the one the API actually created before it.

use pubcrawl_core::PublishError;

use crate::client::{validate_text, PostedTweet, TwitterClient};

impl TwitterClient {
    /// Posts `text` as a reply to `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`TwitterClient::post_tweet`].
    pub async fn post_reply(
        &self,
        text: &str,
        parent: &PostedTweet,
    ) -> Result<PostedTweet, PublishError> {
        self.create_reply(text, parent).await
    }

    /// Posts `texts` as a thread: the first as a standalone tweet, each later
    /// one as a reply to its predecessor. Returns the ids in posting order.
    ///
    /// Every text is validated before the first call, so an over-long entry
    /// never leaves a half-posted thread behind.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] if `texts` is empty or any entry is invalid.
    /// - [`PublishError::ThreadInterrupted`] if a post fails after at least
    ///   one tweet went out; `posted` holds the ids already created.
    /// - The first post's error unchanged if nothing was posted.
    pub async fn post_thread<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<String>, PublishError> {
        let Some((first, rest)) = texts.split_first() else {
            return Err(PublishError::Invalid("thread has no tweets".to_string()));
        };
        for text in texts {
            validate_text(text.as_ref())?;
        }

        let mut previous = self.post_tweet(first.as_ref(), &[]).await?;
        let mut posted = vec![previous.id().to_string()];

        for (index, text) in rest.iter().enumerate() {
            match self.post_reply(text.as_ref(), &previous).await {
                Ok(reply) => {
                    posted.push(reply.id().to_string());
                    previous = reply;
                }
                Err(source) => {
                    tracing::error!(
                        position = index + 2,
                        total = texts.len(),
                        posted = posted.len(),
                        error = %source,
                        "thread interrupted"
                    );
                    return Err(PublishError::ThreadInterrupted {
                        posted,
                        source: Box::new(source),
                    });
                }
            }
        }

        tracing::info!(tweets = posted.len(), "thread posted");
        Ok(posted)
    }
}
