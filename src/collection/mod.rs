//! Postman collection filters.
//!
//! Each transform walks the collection's `item` tree, drops requests that do
//! not qualify, keeps folders that still contain something, and tags the
//! collection's `info.name` with what was done to it. Files are read and
//! written as pretty JSON next to the input unless told otherwise.

mod api;
mod base_url;
mod dedupe;

pub use api::{filter_api, is_api_url};
pub use base_url::filter_base_url;
pub use dedupe::{dedupe, normalize_url};

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use crate::error::CollectionError;

pub async fn load(path: &Path) -> Result<Value, CollectionError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CollectionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CollectionError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if !value.get("item").map(Value::is_array).unwrap_or(false) {
        return Err(CollectionError::NotACollection(path.to_path_buf()));
    }
    Ok(value)
}

pub async fn save(path: &Path, collection: &Value) -> Result<(), CollectionError> {
    let io_err = |source| CollectionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let text = serde_json::to_string_pretty(collection).map_err(|source| CollectionError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, text).await.map_err(io_err)
}

/// `<dir>/<stem>_<suffix>.json`, where `dir` is `output_dir` or the input's
/// own directory.
pub fn derived_path(input: &Path, suffix: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "collection".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}_{}.json", stem, suffix))
}

/// The raw URL string of a request's `url`, which Postman stores either as a
/// plain string or as an object with a `raw` field.
pub(crate) fn raw_url(url: &Value) -> String {
    match url {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("raw")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

/// The `request.url` of an item, if it is a request.
pub(crate) fn request_url(item: &Value) -> Option<&Value> {
    item.get("request")?.get("url")
}

/// Append ` [tag]` to the collection's display name.
pub(crate) fn tag_name(collection: &mut Value, tag: &str) {
    let Some(root) = collection.as_object_mut() else {
        return;
    };
    let info = root
        .entry("info")
        .or_insert_with(|| Value::Object(Map::new()));
    if !info.is_object() {
        *info = Value::Object(Map::new());
    }
    let name = info
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Collection")
        .to_string();
    info["name"] = Value::String(format!("{} [{}]", name, tag));
}

/// Keep requests for which `keep` holds and folders that still have
/// children after filtering. Returns how many requests were dropped.
pub(crate) fn retain_requests<F>(items: &mut Vec<Value>, keep: &mut F) -> usize
where
    F: FnMut(&Value) -> bool,
{
    let mut removed = 0;
    items.retain_mut(|item| {
        if let Some(url) = request_url(item) {
            let kept = keep(url);
            if !kept {
                removed += 1;
            }
            kept
        } else if let Some(children) = item.get_mut("item").and_then(Value::as_array_mut) {
            removed += retain_requests(children, &mut *keep);
            !children.is_empty()
        } else {
            false
        }
    });
    removed
}

/// Deduplicate `input`, then keep only its API requests. Returns the paths
/// of the deduplicated and API-only files.
pub async fn run_pipeline(
    input: &Path,
    output_dir: Option<&Path>,
) -> Result<(PathBuf, PathBuf), CollectionError> {
    info!("Processing collection {}", input.display());
    let mut collection = load(input).await?;

    let removed = dedupe(&mut collection);
    let deduped_path = derived_path(input, "deduped", output_dir);
    save(&deduped_path, &collection).await?;
    info!(
        "Removed {} duplicate(s). Saved to {}",
        removed,
        deduped_path.display()
    );

    let dropped = filter_api(&mut collection);
    let api_path = derived_path(input, "api", output_dir);
    save(&api_path, &collection).await?;
    info!(
        "Dropped {} non-API request(s). Saved to {}",
        dropped,
        api_path.display()
    );

    Ok((deduped_path, api_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derived_path() {
        assert_eq!(
            derived_path(Path::new("dir/shop.postman.json"), "api", None),
            PathBuf::from("dir/shop.postman_api.json")
        );
        assert_eq!(
            derived_path(Path::new("shop.json"), "deduped", Some(Path::new("out"))),
            PathBuf::from("out/shop_deduped.json")
        );
    }

    #[test]
    fn test_raw_url_forms() {
        assert_eq!(raw_url(&json!("https://a/x")), "https://a/x");
        assert_eq!(raw_url(&json!({"raw": "https://a/y", "host": ["a"]})), "https://a/y");
        assert_eq!(raw_url(&json!({"host": ["a"]})), "");
    }

    #[test]
    fn test_tag_name_defaults() {
        let mut collection = json!({"item": []});
        tag_name(&mut collection, "API");
        assert_eq!(collection["info"]["name"], "Collection [API]");

        let mut collection = json!({"info": {"name": "Shop"}, "item": []});
        tag_name(&mut collection, "Deduped");
        assert_eq!(collection["info"]["name"], "Shop [Deduped]");
    }

    #[test]
    fn test_retain_drops_empty_folders_and_non_requests() {
        let mut items = vec![
            json!({"name": "folder", "item": [{"request": {"url": "https://a/drop"}}]}),
            json!({"name": "keep", "request": {"url": "https://a/keep"}}),
            json!({"name": "stray"}),
        ];
        let removed =
            retain_requests(&mut items, &mut |url: &Value| raw_url(url).ends_with("keep"));
        assert_eq!(removed, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "keep");
    }
}
