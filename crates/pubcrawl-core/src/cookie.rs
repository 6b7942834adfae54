//! `Cookie` header strings as copied out of a logged-in browser.

/// Split `name=value; name2=value2` into trimmed pairs.
///
/// Pieces without `=` or with an empty name are skipped. Values may contain
/// `=`; only the first one separates name from value.
#[must_use]
pub fn parse_cookie_string(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|piece| {
            let (name, value) = piece.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Value of the first cookie called `name`, if present and non-empty.
#[must_use]
pub fn cookie_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(n, v)| n == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}
