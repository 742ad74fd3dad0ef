use regex::RegexBuilder;
use serde_json::Value;

use super::{raw_url, retain_requests, tag_name};

/// Keep only requests whose host contains `base_url` (case-insensitive),
/// plus the folders holding them. Returns how many requests were dropped.
///
/// Fails only if the pattern exceeds the regex size limit, in which case the
/// collection is left untouched.
pub fn filter_base_url(collection: &mut Value, base_url: &str) -> Result<usize, regex::Error> {
    let host = RegexBuilder::new(&format!(r"https?://[^/]*{}", regex::escape(base_url)))
        .case_insensitive(true)
        .build()?;

    tag_name(collection, base_url);
    let dropped = match collection.get_mut("item").and_then(Value::as_array_mut) {
        Some(items) => retain_requests(items, &mut |url: &Value| host.is_match(&raw_url(url))),
        None => 0,
    };
    Ok(dropped)
}
