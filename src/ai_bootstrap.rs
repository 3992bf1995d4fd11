// src/ai_bootstrap.rs
use crate::analyze::ai_adapter::LlmClient;
use crate::analyze::{build_client_from_config, DynLlmClient};
use crate::config::AiConfig;
use crate::emotion::extract_primary_emotion;
use tracing::{info, warn};

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub client: DynLlmClient,
}

impl AiRuntime {
    pub fn from_config(cfg: AiConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: never log the key itself.
        info!(
            "AI cfg loaded: provider={}, model={}, enabled={}, daily_limit={}, key_present={}",
            cfg.provider,
            cfg.model_name(),
            cfg.enabled,
            cfg.daily_limit,
            cfg.resolve_api_key().is_some()
        );
        let client = build_client_from_config(&cfg)?;
        Ok(Self { cfg, client })
    }

    pub fn load_default() -> anyhow::Result<Self> {
        Self::from_config(AiConfig::load_default()?)
    }

    /// One-off smoke test of the configured provider. Never fails; logs the outcome.
    /// Consumes one unit of the daily budget unless the probe answer is cached.
    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("AI quick_probe skipped: AI is disabled in config");
            return;
        }
        let sample = "Reply with a single markdown line of the form `**Primary Emotion**: <emotion>` for a dream about walking through a quiet forest at dawn.";
        match self.client.complete(sample).await {
            Ok(text) => info!(
                provider = self.client.provider_name(),
                emotion = %extract_primary_emotion(&text),
                "AI quick_probe ok"
            ),
            Err(e) => warn!(
                provider = self.client.provider_name(),
                error = %e,
                "AI quick_probe failed"
            ),
        }
    }
}
