//! X (Twitter) API v2 publisher: tweets, media, threads and deletes, with
//! rate-limit retry shared from `pubcrawl-core`.

pub mod client;
mod publisher;
mod thread;
pub(crate) mod types;

pub use client::{PostedTweet, TwitterClient, MAX_TWEET_CHARS};
