//! Bilibili dynamic (动态) publisher over the web API, authenticated with a
//! browser cookie.

pub mod client;
mod types;

pub use client::{BilibiliClient, MAX_DYNAMIC_CHARS};
