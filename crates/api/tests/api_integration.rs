//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryBucketRepository;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_default_state(InMemoryBucketRepository::new());
    api::create_app(state, get_metrics_handle())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_bucket(app: &axum::Router, body: Value) -> String {
    let (status, json) = send(app, "POST", "/buckets", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn add_item(app: &axum::Router, bucket_id: &str, name: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/buckets/{bucket_id}/items"),
        Some(json!({ "name": name })),
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "buckets");
}

#[tokio::test]
async fn test_create_bucket_with_default_size() {
    let app = setup();

    let (status, json) = send(&app, "POST", "/buckets", Some(json!({ "name": "tools" }))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "tools");
    assert_eq!(json["size"], 5);
    assert_eq!(json["version"], 1);
    assert_eq!(json["is_full"], false);
}

#[tokio::test]
async fn test_create_bucket_with_negative_size_conflicts() {
    let app = setup();

    let (status, json) = send(&app, "POST", "/buckets", Some(json!({ "size": -1 }))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("Invalid bucket size"));
}

#[tokio::test]
async fn test_fourth_item_in_bucket_of_three_conflicts() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 3 })).await;

    for name in ["a", "b", "c"] {
        let (status, _) = add_item(&app, &id, name).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = add_item(&app, &id, "d").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("full"));

    let (status, json) = send(&app, "GET", &format!("/buckets/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["item_count"], 3);
    assert_eq!(json["is_full"], true);
}

#[tokio::test]
async fn test_zero_capacity_bucket_rejects_items() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 0 })).await;

    let (status, _) = add_item(&app, &id, "anything").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_get_unknown_bucket_returns_404() {
    let app = setup();
    let uri = format!("/buckets/{}", uuid::Uuid::new_v4());

    let (status, json) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_invalid_bucket_id_returns_400() {
    let app = setup();

    let (status, _) = send(&app, "GET", "/buckets/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resize_below_occupancy_conflicts() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 4 })).await;
    add_item(&app, &id, "a").await;
    add_item(&app, &id, "b").await;

    let uri = format!("/buckets/{id}");
    let (status, _) = send(&app, "PUT", &uri, Some(json!({ "size": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(&app, "PUT", &uri, Some(json!({ "name": "pair", "size": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "pair");
    assert_eq!(json["size"], 2);
    assert_eq!(json["is_full"], true);
}

#[tokio::test]
async fn test_item_crud() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 2 })).await;

    let (status, json) = add_item(&app, &id, "hammer").await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = json["id"].as_str().unwrap().to_string();
    let item_uri = format!("/buckets/{id}/items/{item_id}");

    let (status, json) = send(&app, "GET", &item_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "hammer");

    let body = json!({ "name": "mallet", "description": "rubber" });
    let (status, json) = send(&app, "PUT", &item_uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "rubber");

    let (status, _) = send(&app, "DELETE", &item_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &item_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_items_sorted() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 3 })).await;
    for name in ["b", "c", "a"] {
        add_item(&app, &id, name).await;
    }

    let (status, json) = send(&app, "GET", &format!("/buckets/{id}/items?sort=name"), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_delete_bucket() {
    let app = setup();
    let id = create_bucket(&app, json!({})).await;
    let uri = format!("/buckets/{id}");

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_buckets_filters_sorts_and_pages() {
    let app = setup();
    let full = create_bucket(&app, json!({ "name": "full", "size": 1 })).await;
    add_item(&app, &full, "x").await;
    create_bucket(&app, json!({ "name": "small", "size": 2 })).await;
    create_bucket(&app, json!({ "name": "large", "size": 8 })).await;
    create_bucket(&app, json!({ "name": "medium", "size": 4 })).await;

    let names = |json: &Value| -> Vec<String> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|b| b["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, json) = send(&app, "GET", "/buckets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&json), vec!["full", "small", "large", "medium"]);

    let (_, json) = send(&app, "GET", "/buckets?full=true", None).await;
    assert_eq!(names(&json), vec!["full"]);

    let (_, json) = send(&app, "GET", "/buckets?full=false&sort=-size", None).await;
    assert_eq!(names(&json), vec!["large", "medium", "small"]);

    let (_, json) = send(&app, "GET", "/buckets?min_size=2&max_size=4&sort=size", None).await;
    assert_eq!(names(&json), vec!["small", "medium"]);

    let (_, json) = send(&app, "GET", "/buckets?sort=name&offset=1&limit=2", None).await;
    assert_eq!(names(&json), vec!["large", "medium"]);
}

#[tokio::test]
async fn test_list_buckets_rejects_bad_sort() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/buckets?sort=colour", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("colour"));

    let (status, _) = send(&app, "GET", "/buckets?sort=items", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let id = create_bucket(&app, json!({ "size": 0 })).await;
    add_item(&app, &id, "rejected").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("buckets_created_total"));
    assert!(text.contains("bucket_capacity_rejections_total"));
}
