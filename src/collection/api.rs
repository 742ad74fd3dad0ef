use once_cell::sync::Lazy;
use regex::RegexSet;
use serde_json::Value;

use super::{raw_url, retain_requests, tag_name};

static API_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)/api/",
        r"(?i)/v[0-9]+/",
        r"(?i)/graphql",
        r"(?i)/rest/",
        r"(?i)/json/",
        r"(?i)/endpoint/",
        r"(?i)/[a-z0-9-]+_v[0-9]+",
    ])
    .unwrap()
});

static NON_API_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)\.html$",
        r"(?i)\.php$",
        r"(?i)/static/",
        r"(?i)/assets/",
        r"(?i)/images/",
        r"(?i)/css/",
        r"(?i)/js/",
        r"(?i)/favicon\.ico",
    ])
    .unwrap()
});

/// Whether a request URL looks like an API endpoint rather than a page or
/// static asset.
pub fn is_api_url(url: &Value) -> bool {
    let raw = raw_url(url);
    API_PATTERNS.is_match(&raw) && !NON_API_PATTERNS.is_match(&raw)
}

/// Keep only API requests (and the folders holding them). Returns how many
/// requests were dropped.
pub fn filter_api(collection: &mut Value) -> usize {
    tag_name(collection, "API");
    match collection.get_mut("item").and_then(Value::as_array_mut) {
        Some(items) => retain_requests(items, &mut is_api_url),
        None => 0,
    }
}
