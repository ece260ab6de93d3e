use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use seedbank_generate::{ChatPrompt, CompletionBackend, GenerationError};
use seedbank_server::{AppState, Config, build_router};
use seedbank_store::DatasetStore;

struct ScriptedBackend {
    response: String,
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(
        &self,
        _prompt: &ChatPrompt,
        _timeout: Duration,
    ) -> Result<String, GenerationError> {
        Ok(self.response.clone())
    }
}

struct TestService {
    router: Router,
    store: DatasetStore,
    _dir: TempDir,
}

fn service(dynamic_v2: bool, backend_response: Option<&str>) -> TestService {
    let dir = TempDir::new().expect("tempdir");
    let config = Config {
        data_base_path: dir.path().to_path_buf(),
        dynamic_v2_mode: dynamic_v2,
        ..Config::default()
    };
    let store = DatasetStore::new(dir.path());
    let backend: Option<Arc<dyn CompletionBackend>> = backend_response.map(|response| {
        Arc::new(ScriptedBackend {
            response: response.to_string(),
        }) as Arc<dyn CompletionBackend>
    });
    let router = build_router(AppState::new(config, None, store.clone(), backend));
    TestService {
        router,
        store,
        _dir: dir,
    }
}

async fn seed_movies(store: &DatasetStore, count: usize) {
    let records: Vec<Value> = (1..=count)
        .map(|id| {
            let category = ["drama", "horror", "scifi"][id % 3];
            json!({
                "id": id,
                "title": format!("Movie {id}"),
                "category": category,
            })
        })
        .collect();
    store.append("movies", "movies", records).await.unwrap();
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send_json(router: &Router, method: &str, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_degrades_without_database() {
    let service = service(false, None);
    let (status, body) = get(&service.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database_pool_operational"], json!(false));
    assert_eq!(body["status"], json!("degraded"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn seeds_resolve_matches_the_derivation_formula() {
    let service = service(false, None);
    let (status, body) = get(
        &service.router,
        "/seeds/resolve?base=42&v3_enabled=false",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // (42 * 29 + 7) % 300 + 1 == 27; v2 mirrors the base.
    assert_eq!(body, json!({"base": 42, "v1": 27, "v2": 42, "v3": null}));
}

#[tokio::test]
async fn seeds_resolve_post_accepts_configs_and_clamps() {
    let service = service(false, None);
    let payload = json!({
        "seed_value": 1500,
        "v1_config": {"max": 10, "multiplier": 3, "offset": 1},
        "v2_config": {"max": 7, "multiplier": 2, "offset": 0}
    });
    let (status, body) = send_json(&service.router, "POST", "/seeds/resolve", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["base"], json!(999));
    // (999 * 3 + 1) % 10 + 1 == 9; v2 ignores its config entirely.
    assert_eq!(body["v1"], json!(9));
    assert_eq!(body["v2"], json!(999));
    assert_eq!(body["v3"], json!((999 * 71 + 3) % 100 + 1));
}

#[tokio::test]
async fn load_missing_pool_is_404() {
    let service = service(true, None);
    let (status, body) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies",
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("not_found"));
}

#[tokio::test]
async fn load_returns_full_pool_when_selection_disabled() {
    let service = service(false, None);
    seed_movies(&service.store, 12).await;
    let (status, body) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies&seed_value=5&limit=3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(12));
    assert_eq!(body["metadata"]["totalAvailable"], json!(12));
}

#[tokio::test]
async fn load_selects_deterministically_when_enabled() {
    let service = service(true, None);
    seed_movies(&service.store, 12).await;
    let uri = "/datasets/load?project_key=movies&entity_type=movies&seed_value=5&limit=3";
    let (status, first) = get(&service.router, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["count"], json!(3));
    assert_eq!(first["metadata"]["method"], json!("select"));
    let (_, second) = get(&service.router, uri).await;
    assert_eq!(first["data"], second["data"]);

    // Across a handful of seeds, the subsets cannot all coincide.
    let mut distinct = std::collections::HashSet::new();
    for seed in 1..=5 {
        let (_, body) = get(
            &service.router,
            &format!("/datasets/load?project_key=movies&entity_type=movies&seed_value={seed}&limit=3"),
        )
        .await;
        distinct.insert(body["data"].to_string());
    }
    assert!(distinct.len() > 1);
}

#[tokio::test]
async fn load_shuffle_and_distribute_methods_work() {
    let service = service(true, None);
    seed_movies(&service.store, 12).await;

    let (status, shuffled) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies&seed_value=9&limit=5&method=shuffle",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shuffled["count"], json!(5));

    let (status, distributed) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies&seed_value=9&limit=6&method=distribute",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(distributed["count"], json!(6));
    // Three categories, six records: an even two per category.
    for category in ["drama", "horror", "scifi"] {
        let count = distributed["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|record| record["category"] == json!(category))
            .count();
        assert_eq!(count, 2, "category {category}");
    }
}

#[tokio::test]
async fn load_filter_method_restricts_categories() {
    let service = service(true, None);
    seed_movies(&service.store, 12).await;
    let (status, body) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies&seed_value=2&limit=2&method=filter&filter_key=category&filter_values=horror,scifi",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for record in body["data"].as_array().unwrap() {
        assert_ne!(record["category"], json!("drama"));
    }
}

#[tokio::test]
async fn load_rejects_unknown_method() {
    let service = service(true, None);
    seed_movies(&service.store, 3).await;
    let (status, body) = get(
        &service.router,
        "/datasets/load?project_key=movies&entity_type=movies&method=random",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));
}

#[tokio::test]
async fn pools_lists_seeded_datasets() {
    let service = service(false, None);
    seed_movies(&service.store, 4).await;
    let (status, body) = get(&service.router, "/datasets/pools").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["pools"][0]["project_key"], json!("movies"));
    assert_eq!(body["pools"][0]["records"], json!(4));
}

#[tokio::test]
async fn events_answer_503_without_database() {
    let service = service(false, None);
    let payload = json!({"web_url": "https://ex.com/page", "data": {"kind": "click"}});
    let (status, body) = send_json(&service.router, "POST", "/save_events/", &payload).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], json!("database_unavailable"));
}

#[tokio::test]
async fn malformed_event_url_is_400_even_without_database() {
    let service = service(false, None);
    let payload = json!({"web_url": "not a url", "data": {}});
    let (status, body) = send_json(&service.router, "POST", "/save_events/", &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid_url"));
}

#[tokio::test]
async fn get_events_requires_web_url() {
    let service = service(false, None);
    let (status, body) = get(&service.router, "/get_events/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));
}

#[tokio::test]
async fn generation_without_api_key_is_500() {
    let service = service(false, None);
    let payload = json!({
        "interface_definition": "movies:\n  id: number",
        "examples": [{"id": 1}]
    });
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate", &payload).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("generation_failure"));
}

#[tokio::test]
async fn generate_returns_records_without_persisting_by_default() {
    let service = service(false, Some(r#"[{"id": 100, "title": "Fresh"}]"#));
    let payload = json!({
        "interface_definition": "movies:\n  id: number\n  title: string",
        "examples": [{"id": 1, "title": "Seed"}],
        "count": 1
    });
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate", &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["saved_path"], Value::Null);
    assert!(service.store.load("movies", Some("movies")).is_empty());
}

#[tokio::test]
async fn generate_persists_when_asked() {
    let service = service(false, Some(r#"[{"id": 100, "title": "Fresh"}]"#));
    let payload = json!({
        "interface_definition": "movies:\n  id: number\n  title: string",
        "examples": [{"id": 1, "title": "Seed"}],
        "count": 1,
        "project_key": "movies",
        "entity_type": "movies",
        "save_to_file": true
    });
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate", &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["saved_path"].is_string());
    assert_eq!(service.store.load("movies", Some("movies")).len(), 1);
}

#[tokio::test]
async fn schema_validation_failures_are_422_with_index() {
    let service = service(false, Some(r#"[{"id": 1}, {"title": "no id"}]"#));
    let payload = json!({
        "interface_definition": "movies:\n  id: number",
        "examples": [{"id": 1}],
        "count": 2,
        "json_schema": {"type": "object", "required": ["id"]}
    });
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate", &payload).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!("schema_validation"));
    assert_eq!(body["record_index"], json!(1));
}

#[tokio::test]
async fn generate_smart_without_examples_is_404() {
    let service = service(false, Some("[]"));
    let payload = json!({"project_key": "movies", "entity_type": "movies", "count": 5});
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate-smart", &payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("not_found"));
}

#[tokio::test]
async fn generate_smart_appends_inferred_records() {
    let service = service(
        false,
        Some("```json\n[{\"id\": 50, \"title\": \"Generated\", \"category\": \"drama\"}]\n```"),
    );
    seed_movies(&service.store, 3).await;
    let payload = json!({
        "project_key": "movies",
        "entity_type": "movies",
        "count": 1,
        "mode": "append"
    });
    let (status, body) =
        send_json(&service.router, "POST", "/datasets/generate-smart", &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], json!(1));
    assert!(body["saved_path"].is_string());
    assert_eq!(service.store.load("movies", Some("movies")).len(), 4);
}

#[tokio::test]
async fn generate_smart_replace_mode_rolls_over() {
    let service = service(
        false,
        Some(r#"[{"id": 90, "title": "Rolled", "category": "scifi"}]"#),
    );
    seed_movies(&service.store, 3).await;
    let payload = json!({
        "project_key": "movies",
        "entity_type": "movies",
        "count": 1,
        "mode": "replace"
    });
    let (status, _body) =
        send_json(&service.router, "POST", "/datasets/generate-smart", &payload).await;
    assert_eq!(status, StatusCode::CREATED);
    // Replace starts a new file; the original pool remains in the index.
    assert_eq!(service.store.load("movies", Some("movies")).len(), 4);
    assert_eq!(service.store.pools()[0].files, 2);
}
