//! `{{ name }}` placeholder substitution for queued posts.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::Regex;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder regex is valid"))
}

/// Replace every `{{ name }}` in `template` with `variables[name]`.
///
/// Placeholders with no matching variable are left as written.
#[must_use]
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> String {
    placeholder()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of all placeholders in `template`, sorted and deduplicated.
#[must_use]
pub fn extract_variables(template: &str) -> BTreeSet<String> {
    placeholder()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}
