//! Xiaohongshu cookie checks.
//!
//! A pasted cookie string cannot be verified without loading a page, but the
//! presence of the session cookies the site sets after login is a good
//! enough signal to refuse an obviously logged-out cookie up front.

use pubcrawl_core::{parse_cookie_string, PublishError};

use crate::driver::BrowserCookie;

/// Cookies the site sets after login, weighted by how reliably each one
/// indicates a live session.
const LOGIN_COOKIE_WEIGHTS: &[(&str, u32)] = &[
    ("a1", 15),
    ("webId", 10),
    ("web_session", 8),
    ("userId", 8),
    ("sessionId", 5),
    ("acw_tc", 3),
    ("abRequestId", 2),
];

/// Lowest score accepted as logged in.
pub const MIN_LOGIN_SCORE: u32 = 5;

/// How confident the score makes us that the cookie belongs to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginConfidence {
    High,
    Medium,
    Low,
    None,
}

/// Sum of the weights of the login cookies present in `pairs`.
#[must_use]
pub fn login_score(pairs: &[(String, String)]) -> u32 {
    pairs
        .iter()
        .filter_map(|(name, _)| {
            LOGIN_COOKIE_WEIGHTS
                .iter()
                .find(|(known, _)| *known == name.as_str())
                .map(|(_, weight)| *weight)
        })
        .sum()
}

#[must_use]
pub fn login_confidence(pairs: &[(String, String)]) -> LoginConfidence {
    let score = login_score(pairs);
    let auth = pairs
        .iter()
        .filter(|(name, _)| matches!(name.as_str(), "a1" | "webId" | "web_session"))
        .count();
    if score >= 20 && auth >= 2 {
        LoginConfidence::High
    } else if score >= 10 && auth >= 1 {
        LoginConfidence::Medium
    } else if score >= MIN_LOGIN_SCORE {
        LoginConfidence::Low
    } else {
        LoginConfidence::None
    }
}

/// Parse `raw` and reject it unless it looks like a logged-in session.
///
/// # Errors
///
/// Returns [`PublishError::SessionInvalid`] when the login score is below
/// [`MIN_LOGIN_SCORE`].
pub fn require_login_cookies(raw: &str) -> Result<Vec<(String, String)>, PublishError> {
    let pairs = parse_cookie_string(raw);
    let score = login_score(&pairs);
    let confidence = login_confidence(&pairs);
    tracing::debug!(cookies = pairs.len(), score, ?confidence, "checked login cookies");
    if score < MIN_LOGIN_SCORE {
        return Err(PublishError::SessionInvalid(format!(
            "cookie does not look logged in (login score {score}, need {MIN_LOGIN_SCORE})"
        )));
    }
    Ok(pairs)
}

/// `pairs` scoped to `domain`, ready for injection.
#[must_use]
pub fn for_domain(pairs: &[(String, String)], domain: &str) -> Vec<BrowserCookie> {
    pairs
        .iter()
        .map(|(name, value)| BrowserCookie {
            name: name.clone(),
            value: value.clone(),
            domain: domain.to_string(),
        })
        .collect()
}
