//! Shared building blocks for the pubcrawl publishers and crawlers.
//!
//! Everything a component needs before it touches the network lives here:
//! configuration, the error taxonomy, request/result types, the rate-limit
//! retry loop, the dedup ledger and the batch runner that ties a ledger to a
//! [`Publisher`].

pub mod app_config;
pub mod batch;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod ledger;
pub mod publisher;
pub mod retry;
pub mod template;
pub mod text;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use batch::{load_queue, BatchReport, BatchRunner, QueueItem};
pub use config::{load_app_config, load_app_config_from_env};
pub use cookie::{cookie_value, parse_cookie_string};
pub use credentials::{
    BilibiliCredentials, TwitterCredentials, XiaohongshuCredentials, ZhihuCredentials,
};
pub use error::{ConfigError, PublishError};
pub use ledger::DedupLedger;
pub use publisher::{OfflinePublisher, Publisher};
pub use retry::{retry_rate_limited, Attempt, RateLimitState, RetryPolicy};
pub use template::{extract_variables, render_template};
pub use types::{CrawlRecord, MediaRef, Platform, PublishOutcome, PublishRequest};
