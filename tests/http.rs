use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use retarget::{
    application::{
        demo::{UserStore, header_target_id, register_demo_targets},
        revalidate::{RevalidationResponse, RevalidationService},
    },
    infra::http::{
        HEADER_INSTANCE, HttpState, REQUEST_ID_HEADER, REVALIDATE_HEADER, RevalidationSummary,
        build_router,
    },
    targets::TargetRegistry,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

fn app() -> (Router, Arc<UserStore>) {
    let registry = Arc::new(TargetRegistry::new());
    let store = Arc::new(UserStore::default());
    let demo = register_demo_targets(&registry, Arc::clone(&store));
    let state = HttpState {
        demo,
        store: Arc::clone(&store),
        revalidation: RevalidationService::new(registry),
    };
    (build_router(state), store)
}

fn update_name(name: &str, revalidate: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/update-name")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(payload) = revalidate {
        builder = builder.header(REVALIDATE_HEADER, payload);
    }
    builder
        .body(Body::from(format!("name={name}")))
        .expect("request should build")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("body should collect");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn index_embeds_render_table() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/")
        .body(Body::empty())
        .expect("request should build");

    let response = app.oneshot(request).await.expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let html = body_text(response).await;
    let id = header_target_id();
    assert!(html.contains(&format!(
        r#"<x-target type="{id}" name="{HEADER_INSTANCE}">"#
    )));
    assert!(html.contains("Hello, Ryan!"));
    assert!(html.contains(&format!(r#"window.__TARGETS__ = new Map([["{HEADER_INSTANCE}",["{id}""#)));
}

#[tokio::test]
async fn update_name_rerenders_requested_targets() {
    let (app, store) = app();
    let payload = json!([[header_target_id(), { "name": HEADER_INSTANCE, "title": "Targets Example" }]])
        .to_string();

    let response = app
        .oneshot(update_name("Ada", Some(payload)))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .extensions()
            .get::<RevalidationSummary>()
            .map(|summary| summary.requested),
        Some(1)
    );

    let body: RevalidationResponse =
        serde_json::from_str(&body_text(response).await).expect("json response");
    assert_eq!(body.content.len(), 1);
    assert!(body.content[0].contains("Hello, Ada!"));
    assert_eq!(store.user_name().await, "Ada");

    let targets: Value = serde_json::from_str(&body.targets).expect("table is json");
    assert_eq!(targets[0][0], HEADER_INSTANCE);
    assert_eq!(targets[0][1][0], header_target_id().as_str());
}

#[tokio::test]
async fn update_name_requires_revalidation_header() {
    let (app, store) = app();

    let response = app
        .oneshot(update_name("Ada", None))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.user_name().await, "Ryan");
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let (app, _) = app();

    let response = app
        .oneshot(update_name("Ada", Some(r#"[["id-without-props"]]"#.to_string())))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_target_is_not_found_and_leaves_store_unchanged() {
    let (app, store) = app();
    let payload = json!([["0000000000000000000000000000000000000000", { "name": "x" }]]).to_string();

    let response = app
        .oneshot(update_name("Mallory", Some(payload)))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(store.user_name().await, "Ryan");
}

#[tokio::test]
async fn duplicate_instance_names_conflict() {
    let (app, _) = app();
    let id = header_target_id();
    let payload = json!([
        [id.as_str(), { "name": HEADER_INSTANCE }],
        [id.as_str(), { "name": HEADER_INSTANCE }]
    ])
    .to_string();

    let response = app
        .oneshot(update_name("Ada", Some(payload)))
        .await
        .expect("router should respond");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn serves_client_script_and_health() {
    let (app, _) = app();

    let script = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/app.js")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(script.status(), StatusCode::OK);
    let content_type = script
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("javascript"));
    assert!(body_text(script).await.contains("X-Revalidate"));

    let health = app
        .oneshot(
            Request::builder()
                .uri("/_health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");
    assert_eq!(health.status(), StatusCode::NO_CONTENT);
}
