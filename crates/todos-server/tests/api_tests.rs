//! End-to-end API tests: real router, real LMDB-backed store.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use todos_core::testing::TestContext;
use todos_core::{CategoryPolicy, StoreOptions, TodoStore};
use todos_server::{TodosServer, config::Config, router};

/// Build an app over a fresh store rooted in the test's temp directory
fn test_app(ctx: &TestContext, config: Config) -> Router {
    let store = TodoStore::with_options(
        ctx.path().join("todos"),
        StoreOptions {
            map_size: config.todos.map_size,
            policy: config.todos.category_policy,
            categories: config.todos.categories.clone(),
        },
    );
    router(TodosServer::new(Arc::new(store), &config))
}

fn default_app(ctx: &TestContext) -> Router {
    test_app(ctx, Config::default())
}

/// Test helper to make HTTP requests
async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    let request = if let Some(body) = body {
        request_builder.body(Body::from(body.to_string())).unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let body = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, body)
}

#[tokio::test]
async fn add_without_body_is_rejected() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(&app, Method::POST, "/api/todos/add", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No body!"}));
}

#[tokio::test]
async fn add_with_malformed_json_is_rejected() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/todos/add")
        .header("content-type", "application/json")
        .body(Body::from("not json at all"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body, json!({"message": "No body!"}));
}

#[tokio::test]
async fn add_without_description_is_rejected() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) =
        make_request(&app, Method::POST, "/api/todos/add", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No description!"}));
}

#[tokio::test]
async fn add_without_category_is_rejected() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "buy milk"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No category!"}));
}

#[tokio::test]
async fn add_with_unknown_category_is_rejected_by_default() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "prune roses", "category": "gardening"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "Unknown category!"}));

    // Nothing was persisted.
    let (status, todos) = make_request(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(todos, json!([]));
}

#[tokio::test]
async fn add_persists_and_acknowledges() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "buy milk", "category": "shopping"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "addTodo"}));

    let (status, todos) = make_request(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        todos,
        json!([{
            "id": 1,
            "description": "buy milk",
            "category": "shopping",
            "done": false,
        }])
    );
}

#[tokio::test]
async fn list_on_fresh_server_returns_empty_array() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(&app, Method::GET, "/api/todos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

/// The create flow checks fields in order and ends with a persisted record.
///
/// Runs with membership checking off so any non-blank category passes, which
/// keeps this test purely about the field-order pipeline.
#[tokio::test]
async fn create_flow_checks_fields_in_order() {
    let ctx = TestContext::new();
    let mut config = Config::default();
    config.todos.category_policy = CategoryPolicy::Off;
    let app = test_app(&ctx, config);

    let (status, body) =
        make_request(&app, Method::POST, "/api/todos/add", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No description!"}));

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "No category!"}));

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "x", "category": "y"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "addTodo"}));

    let (status, todos) = make_request(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        todos,
        json!([{
            "id": 1,
            "description": "x",
            "category": "y",
            "done": false,
        }])
    );
}

#[tokio::test]
async fn store_policy_surfaces_membership_as_storage_error() {
    let ctx = TestContext::new();
    let mut config = Config::default();
    config.todos.category_policy = CategoryPolicy::Store;
    let app = test_app(&ctx, config);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "prune roses", "category": "gardening"})),
    )
    .await;

    // The handler waves it through; the store's schema check rejects it.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"message": "storage error"}));

    let (status, todos) = make_request(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(todos, json!([]));
}

#[tokio::test]
async fn concurrent_adds_all_persist() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let mut handles = vec![];
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            make_request(
                &app,
                Method::POST,
                "/api/todos/add",
                Some(json!({"description": format!("task {i}"), "category": "hobby"})),
            )
            .await
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "addTodo"}));
    }

    let (status, todos) = make_request(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    let todos = todos.as_array().unwrap().clone();
    assert_eq!(todos.len(), 8);

    // Ids are unique and the listing is in id order.
    let ids: Vec<u64> = todos
        .iter()
        .map(|todo| todo["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
}

#[tokio::test]
async fn health_tracks_store_state() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    // Fresh server: lazily unconnected store is healthy.
    let (status, health) = make_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "Healthy");
    assert_eq!(health["store"]["connected"], json!(false));
    assert_eq!(health["store"].get("todos"), None);

    make_request(
        &app,
        Method::POST,
        "/api/todos/add",
        Some(json!({"description": "buy milk", "category": "shopping"})),
    )
    .await;

    let (status, health) = make_request(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "Healthy");
    assert_eq!(health["store"]["connected"], json!(true));
    assert_eq!(health["store"]["todos"], json!(1));
    assert!(health["version"].as_str().is_some_and(|v| !v.is_empty()));
}

#[tokio::test]
async fn root_serves_health_too() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, body) = make_request(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Healthy");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, _) = make_request(&app, Method::GET, "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_route_only_accepts_post() {
    let ctx = TestContext::new();
    let app = default_app(&ctx);

    let (status, _) = make_request(&app, Method::GET, "/api/todos/add", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
