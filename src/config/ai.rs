// src/config/ai.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/ai.toml";
pub const DEFAULT_JSON_PATH: &str = "config/ai.json";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

fn default_provider() -> String {
    "openai".to_string()
}
fn default_max_output_tokens() -> u32 {
    2000
}
fn default_daily_limit() -> u32 {
    50
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

/// Upstream LLM vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Mock,
}

impl ProviderKind {
    /// Case-insensitive; "claude" is accepted as an alias for Anthropic.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    fn key_env(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Mock => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "openai" | "anthropic" | "claude" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default when absent.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Real upstream calls per day; cache hits do not count.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// "ENV" means: read OPENAI_API_KEY / ANTHROPIC_API_KEY (by provider)
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: None,
            max_output_tokens: default_max_output_tokens(),
            daily_limit: default_daily_limit(),
            api_key: default_api_key(),
            cache_dir: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading AI config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = Self::parse(&content, &ext)
            .with_context(|| format!("parsing AI config at {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Resolve using env var + fallbacks:
    /// 1) $AI_CONFIG_PATH
    /// 2) config/ai.toml
    /// 3) config/ai.json
    /// 4) defaults (AI disabled)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_AI_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_AI_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        Ok(Self::default())
    }

    fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        if hint_ext == "toml" {
            return Ok(toml::from_str(s)?);
        }
        if let Ok(cfg) = serde_json::from_str::<Self>(s) {
            return Ok(cfg);
        }
        toml::from_str(s).map_err(|e| anyhow!("unsupported AI config format: {e}"))
    }

    fn sanitized(mut self) -> Self {
        self.provider = self.provider.trim().to_ascii_lowercase();
        if self.max_output_tokens == 0 {
            self.max_output_tokens = default_max_output_tokens();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        if self.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            self.model = None;
        }
        self
    }

    pub fn provider_kind(&self) -> Option<ProviderKind> {
        ProviderKind::parse(&self.provider)
    }

    pub fn model_name(&self) -> String {
        if let Some(m) = &self.model {
            return m.clone();
        }
        match self.provider_kind() {
            Some(ProviderKind::Anthropic) => DEFAULT_ANTHROPIC_MODEL.to_string(),
            _ => DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// The literal key, or the provider's env var when configured as "ENV".
    /// Missing or blank keys resolve to `None`.
    pub fn resolve_api_key(&self) -> Option<String> {
        let key = if self.api_key.trim().eq_ignore_ascii_case("env") {
            let var = self.provider_kind()?.key_env()?;
            env::var(var).ok()?
        } else {
            self.api_key.clone()
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("cache/llm"))
    }
}
