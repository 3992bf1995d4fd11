// src/analyze/mod.rs
//! Analysis pipeline entry: prompt -> LLM -> interpretation + primary emotion.

pub mod ai_adapter;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyze::ai_adapter::{LlmClient, LlmError};
use crate::emotion::{self, StoredDreamRecord};
use crate::prompt::{build_prompt, fallback_analysis, DreamRequest};

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{build_client_from_config, DynLlmClient};

/// Result returned by the /api/dreams/analyze endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DreamAnalysis {
    pub text: String,
    pub emotion: String,
    /// True when the LLM failed and the canned analysis was used.
    pub fallback: bool,
    pub provider: &'static str,
    pub analyzed_at: DateTime<Utc>,
}

/// Forward a raw prompt to the LLM. Records an outcome counter per provider.
pub async fn relay(client: &dyn LlmClient, prompt: &str) -> Result<String, LlmError> {
    let provider = client.provider_name();
    let res = client.complete(prompt).await;
    let outcome = match &res {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::counter!("llm_requests_total", "provider" => provider, "outcome" => outcome)
        .increment(1);
    res
}

/// Full dream flow. The only hard failure is an invalid request; LLM failures degrade
/// to the canned analysis.
pub async fn analyze_dream(
    client: &dyn LlmClient,
    req: &DreamRequest,
) -> anyhow::Result<DreamAnalysis> {
    req.validate()?;
    let prompt = build_prompt(req);
    let id = crate::debug::anon_hash(&prompt);

    let (text, fallback) = match relay(client, &prompt).await {
        Ok(text) => (text, false),
        Err(e) => {
            warn!(
                %id,
                provider = client.provider_name(),
                error = %e,
                "LLM analysis failed; using fallback"
            );
            (fallback_analysis(req), true)
        }
    };

    let record = StoredDreamRecord::new(req.emotion.clone().unwrap_or_default(), text.clone());
    let (label, source) = emotion::resolve(&record);
    metrics::counter!("emotion_resolved_total", "source" => source.as_str()).increment(1);
    info!(%id, fallback, emotion = %label, source = source.as_str(), "dream analyzed");

    Ok(DreamAnalysis {
        text,
        emotion: label,
        fallback,
        provider: client.provider_name(),
        analyzed_at: Utc::now(),
    })
}
