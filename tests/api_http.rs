// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tempfile::TempDir;
use tower::ServiceExt as _; // for `oneshot`

use dream_journal_analyzer::ai_adapter::{
    CachingClient, DynLlmClient, LlmClient, LlmError, LlmFuture, MockProvider,
};
use dream_journal_analyzer::api::{self, AppState};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Upstream that always fails the same way.
struct FailingClient(fn() -> LlmError);

impl LlmClient for FailingClient {
    fn complete<'a>(&'a self, _prompt: &'a str) -> LlmFuture<'a> {
        let err = (self.0)();
        Box::pin(async move { Err(err) })
    }
    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

fn mock_router(answer: &str) -> (Router, TempDir) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let client: DynLlmClient = Arc::new(CachingClient::new(
        MockProvider::new(answer),
        tmp.path().to_path_buf(),
        10,
    ));
    (api::router(AppState::new(client)), tmp)
}

fn failing_router(err: fn() -> LlmError) -> Router {
    api::router(AppState::new(Arc::new(FailingClient(err))))
}

fn post_json(uri: &str, body: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build POST")
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _tmp) = mock_router("x");
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(String::from_utf8(bytes.to_vec()).unwrap(), "ok");
}

#[tokio::test]
async fn relay_returns_llm_text() {
    let (app, _tmp) = mock_router("**Primary Emotion**: awe");
    let resp = app
        .oneshot(post_json("/api/analyze", json!({ "prompt": "Analyze my dream" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["text"], "**Primary Emotion**: awe");
}

#[tokio::test]
async fn relay_requires_prompt() {
    for body in [json!({}), json!({ "prompt": "" }), json!({ "prompt": null })] {
        let (app, _tmp) = mock_router("x");
        let resp = app.oneshot(post_json("/api/analyze", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_json(resp).await["error"], "Prompt required");
    }
}

#[tokio::test]
async fn relay_forwards_whitespace_prompt() {
    let (app, _tmp) = mock_router("still dreaming");
    let resp = app
        .oneshot(post_json("/api/analyze", json!({ "prompt": "   " })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["text"], "still dreaming");
}

#[tokio::test]
async fn relay_unreadable_body_is_a_server_error() {
    let (app, _tmp) = mock_router("x");
    let req = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .body(Body::from("prompt=hi"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(resp).await["error"], "Failed to analyze dream");
}

#[tokio::test]
async fn relay_rejects_other_methods() {
    let (app, _tmp) = mock_router("x");
    let req = Request::builder()
        .method("GET")
        .uri("/api/analyze")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(read_json(resp).await["error"], "Method not allowed");
}

#[tokio::test]
async fn relay_maps_upstream_failures() {
    let cases: [(fn() -> LlmError, StatusCode, &str); 4] = [
        (
            || LlmError::Upstream {
                status: 401,
                body: "bad key".into(),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
            "OpenAI request failed",
        ),
        (
            || LlmError::EmptyResponse,
            StatusCode::INTERNAL_SERVER_ERROR,
            "No text returned",
        ),
        (
            || LlmError::DailyLimit(3),
            StatusCode::TOO_MANY_REQUESTS,
            "Daily analysis limit reached",
        ),
        (
            || LlmError::Disabled,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to analyze dream",
        ),
    ];
    for (err, status, message) in cases {
        let app = failing_router(err);
        let resp = app
            .oneshot(post_json("/api/analyze", json!({ "prompt": "p" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), status);
        assert_eq!(read_json(resp).await["error"], message);
    }
}

#[tokio::test]
async fn dream_analysis_resolves_emotion_from_text() {
    let (app, _tmp) = mock_router("Intro\n**Primary Emotions**: fear and confusion\n");
    let resp = app
        .oneshot(post_json(
            "/api/dreams/analyze",
            json!({
                "description": "Chased through a maze",
                "emotion": "",
                "recurring": "yes",
                "symbols": "maze"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["emotion"], "fear");
    assert_eq!(v["fallback"], false);
    assert_eq!(v["provider"], "mock");
    assert!(v.get("analyzed_at").is_some(), "missing 'analyzed_at'");
}

#[tokio::test]
async fn dream_analysis_falls_back_when_llm_fails() {
    let app = failing_router(|| LlmError::EmptyResponse);
    let resp = app
        .oneshot(post_json(
            "/api/dreams/analyze",
            json!({ "description": "A garden of butterflies", "emotion": "Joyful" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["fallback"], true);
    assert_eq!(v["emotion"], "joyful");
    assert!(v["text"].as_str().unwrap().contains("The Joyful during this dream"));
}

#[tokio::test]
async fn dream_analysis_requires_description() {
    let (app, _tmp) = mock_router("x");
    let resp = app
        .oneshot(post_json("/api/dreams/analyze", json!({ "description": "  " })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(resp).await["error"], "Please describe your dream first!");
}

#[tokio::test]
async fn emotion_endpoint_rederives_list_values() {
    let (app, _tmp) = mock_router("x");
    let resp = app
        .oneshot(post_json(
            "/api/emotion",
            json!({ "emotion": "joy, anxiety", "interpretation": "**Primary Emotion**: peace" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["emotion"], "peace");
}

#[tokio::test]
async fn emotion_endpoint_tolerates_missing_fields() {
    let (app, _tmp) = mock_router("x");
    let resp = app
        .oneshot(post_json("/api/emotion", json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["emotion"], "unknown");
}

#[tokio::test]
async fn summary_counts_resolved_labels() {
    let (app, _tmp) = mock_router("x");
    let resp = app
        .oneshot(post_json(
            "/api/emotion/summary",
            json!([
                { "emotion": "Fear", "interpretation": "", "recurring": "yes" },
                { "emotion": "", "interpretation": "1. **Primary Emotion**: fear" },
                { "emotion": "calm", "interpretation": "" }
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["total"], 3);
    assert_eq!(v["recurring"], 1);
    assert_eq!(v["top"], "fear");
    assert_eq!(v["counts"][0], json!({ "emotion": "fear", "count": 2 }));
    assert_eq!(v["counts"][1], json!({ "emotion": "calm", "count": 1 }));
}
