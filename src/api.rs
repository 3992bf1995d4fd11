use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::analyze::ai_adapter::{LlmClient, LlmError};
use crate::analyze::{self, DreamAnalysis, DynLlmClient};
use crate::config::AiConfig;
use crate::debug::{self, RequestKind};
use crate::emotion::{self, DreamRecord, EmotionSummary, StoredDreamRecord};
use crate::prompt::DreamRequest;

#[derive(Clone)]
pub struct AppState {
    llm: DynLlmClient,
}

impl AppState {
    pub fn new(llm: DynLlmClient) -> Self {
        Self { llm }
    }

    /// Build from `AiConfig::load_default()` and the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = AiConfig::load_default()?;
        Ok(Self::new(analyze::build_client_from_config(&cfg)?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/analyze",
            post(relay_prompt).fallback(method_not_allowed),
        )
        .route("/api/dreams/analyze", post(analyze_dream))
        .route("/api/emotion", post(resolve_emotion))
        .route("/api/emotion/summary", post(emotion_summary))
        .merge(debug::router())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Convenience for the binary: state from config + router.
pub fn create_router() -> anyhow::Result<Router> {
    Ok(router(AppState::from_env()?))
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

/// JSON error body `{"error": "..."}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Upstream { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "OpenAI request failed")
            }
            LlmError::EmptyResponse => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "No text returned")
            }
            LlmError::DailyLimit(_) => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, "Daily analysis limit reached")
            }
            LlmError::Disabled | LlmError::MissingApiKey(_) | LlmError::Transport(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze dream")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Body {
            error: String,
        }
        (self.status, Json(Body { error: self.message })).into_response()
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

#[derive(Deserialize)]
struct RelayReq {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Serialize)]
struct RelayResp {
    text: String,
}

async fn relay_prompt(
    State(state): State<AppState>,
    body: Result<Json<RelayReq>, JsonRejection>,
) -> Result<Json<RelayResp>, ApiError> {
    debug::record_request(RequestKind::Relay);
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "unreadable relay payload");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to analyze dream")
    })?;
    // Only an absent or empty prompt is refused; whitespace is forwarded upstream.
    let prompt = req
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Prompt required"))?;

    let started = Instant::now();
    let res = analyze::relay(state.llm.as_ref(), &prompt).await;
    debug::record_latency(started.elapsed().as_millis());

    match res {
        Ok(text) => Ok(Json(RelayResp { text })),
        Err(e) => {
            error!(provider = state.llm.provider_name(), error = %e, "Analyze error");
            Err(e.into())
        }
    }
}

async fn analyze_dream(
    State(state): State<AppState>,
    body: Result<Json<DreamRequest>, JsonRejection>,
) -> Result<Json<DreamAnalysis>, ApiError> {
    debug::record_request(RequestKind::Dream);
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "rejected dream payload");
        ApiError::bad_request(e.body_text())
    })?;

    let started = Instant::now();
    let out = analyze::analyze_dream(state.llm.as_ref(), &req)
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    debug::record_latency(started.elapsed().as_millis());
    if out.fallback {
        debug::record_fallback();
    }
    Ok(Json(out))
}

#[derive(Serialize)]
struct EmotionResp {
    emotion: String,
}

async fn resolve_emotion(Json(record): Json<StoredDreamRecord>) -> Json<EmotionResp> {
    let (label, source) = emotion::resolve(&record);
    metrics::counter!("emotion_resolved_total", "source" => source.as_str()).increment(1);
    Json(EmotionResp { emotion: label })
}

async fn emotion_summary(Json(records): Json<Vec<DreamRecord>>) -> Json<EmotionSummary> {
    Json(emotion::summarize(&records))
}
