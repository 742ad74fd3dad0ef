use std::collections::HashSet;

use serde_json::Value;

use super::{raw_url, request_url, tag_name};

/// A request URL without its query string or fragment.
pub fn normalize_url(url: &Value) -> String {
    let raw = raw_url(url);
    raw.split(['?', '#']).next().unwrap_or_default().to_string()
}

/// Drop every request whose normalized URL already appeared earlier in the
/// collection. Unlike a flat pass over the top-level `item` array, this walks
/// into folders depth-first with one set of seen URLs for the whole tree, so
/// a request inside a folder is removed when the same URL appeared earlier in
/// another folder or at the top level. Folders themselves stay in place, even
/// when emptied. Returns the number of requests removed.
pub fn dedupe(collection: &mut Value) -> usize {
    tag_name(collection, "Deduped");
    let mut seen = HashSet::new();
    match collection.get_mut("item").and_then(Value::as_array_mut) {
        Some(items) => dedupe_items(items, &mut seen),
        None => 0,
    }
}

fn dedupe_items(items: &mut Vec<Value>, seen: &mut HashSet<String>) -> usize {
    let mut removed = 0;
    items.retain_mut(|item| {
        if let Some(url) = request_url(item) {
            if !seen.insert(normalize_url(url)) {
                removed += 1;
                return false;
            }
        } else if let Some(children) = item.get_mut("item").and_then(Value::as_array_mut) {
            removed += dedupe_items(children, seen);
        }
        true
    });
    removed
}
