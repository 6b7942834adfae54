//! Per-platform credential bundles.
//!
//! Obtained through the `AppConfig::*_credentials` accessors so that a
//! missing variable fails when the component is built, not mid-call.

use std::path::PathBuf;

#[derive(Clone)]
pub struct TwitterCredentials {
    /// OAuth 2.0 user-context access token.
    pub access_token: String,
}

#[derive(Clone)]
pub struct BilibiliCredentials {
    /// Raw `Cookie` header value; must carry `SESSDATA` and `bili_jct`.
    pub cookie: String,
}

#[derive(Clone)]
pub struct XiaohongshuCredentials {
    pub cookie: String,
}

/// Zhihu authenticates through an already-logged-in browser profile.
#[derive(Debug, Clone)]
pub struct ZhihuCredentials {
    pub profile_dir: PathBuf,
}

impl std::fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for BilibiliCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BilibiliCredentials")
            .field("cookie", &"[redacted]")
            .finish()
    }
}

impl std::fmt::Debug for XiaohongshuCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XiaohongshuCredentials")
            .field("cookie", &"[redacted]")
            .finish()
    }
}
