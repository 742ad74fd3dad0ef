use serde_json::{json, Value};

use github_dork_helper_lib::collection;
use github_dork_helper_lib::CollectionError;

fn sample() -> Value {
    json!({
        "info": {"name": "Shop", "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},
        "item": [
            {"name": "cart", "request": {"method": "GET", "url": {"raw": "https://shop.example.com/api/cart?id=1"}}},
            {"name": "cart again", "request": {"method": "GET", "url": {"raw": "https://shop.example.com/api/cart?id=2"}}},
            {"name": "home", "request": {"method": "GET", "url": "https://shop.example.com/index.html"}},
            {"name": "v1", "item": [
                {"name": "users", "request": {"method": "GET", "url": "https://shop.example.com/v1/users"}},
                {"name": "logo", "request": {"method": "GET", "url": "https://shop.example.com/assets/logo.png"}}
            ]}
        ]
    })
}

#[tokio::test]
async fn test_pipeline_writes_deduped_and_api_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shop.json");
    tokio::fs::write(&input, serde_json::to_string(&sample()).unwrap())
        .await
        .unwrap();

    let (deduped_path, api_path) = collection::run_pipeline(&input, None).await.unwrap();
    assert_eq!(deduped_path, dir.path().join("shop_deduped.json"));
    assert_eq!(api_path, dir.path().join("shop_api.json"));

    let deduped = collection::load(&deduped_path).await.unwrap();
    assert_eq!(deduped["info"]["name"], "Shop [Deduped]");
    assert_eq!(deduped["item"].as_array().unwrap().len(), 3);

    let api = collection::load(&api_path).await.unwrap();
    assert_eq!(api["info"]["name"], "Shop [Deduped] [API]");
    let items = api["item"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "cart");
    assert_eq!(items[1]["item"].as_array().unwrap().len(), 1);
    assert_eq!(items[1]["item"][0]["name"], "users");

    // The input is left untouched.
    let original = collection::load(&input).await.unwrap();
    assert_eq!(original, sample());
}

#[tokio::test]
async fn test_pipeline_respects_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shop.json");
    let out = dir.path().join("derived");
    tokio::fs::write(&input, serde_json::to_string(&sample()).unwrap())
        .await
        .unwrap();

    let (deduped_path, api_path) = collection::run_pipeline(&input, Some(&out)).await.unwrap();
    assert_eq!(deduped_path, out.join("shop_deduped.json"));
    assert!(api_path.exists());
}

#[tokio::test]
async fn test_base_url_output_is_pretty_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shop.json");
    tokio::fs::write(&input, serde_json::to_string(&sample()).unwrap())
        .await
        .unwrap();

    let mut data = collection::load(&input).await.unwrap();
    collection::filter_base_url(&mut data, "shop.example.com").unwrap();
    let output = collection::derived_path(&input, "shop.example.com", None);
    collection::save(&output, &data).await.unwrap();

    let text = tokio::fs::read_to_string(&output).await.unwrap();
    assert!(text.starts_with("{\n  \""));
    let saved: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(saved["info"]["name"], "Shop [shop.example.com]");
    assert_eq!(saved["item"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_load_rejects_non_collections() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("not_a_collection.json");
    tokio::fs::write(&input, r#"{"info": {"name": "x"}}"#).await.unwrap();

    let err = collection::load(&input).await.unwrap_err();
    assert!(matches!(err, CollectionError::NotACollection(_)));

    tokio::fs::write(&input, "{not json").await.unwrap();
    let err = collection::load(&input).await.unwrap_err();
    assert!(matches!(err, CollectionError::Json { .. }));
}
