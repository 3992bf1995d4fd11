//! LLM adapter: provider abstraction + file cache + daily limit.
//!
//! Providers do the remote call; `CachingClient` wraps any provider with a prompt-keyed
//! file cache and a per-day budget of real upstream calls.

use std::fs;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{AiConfig, ProviderKind};

const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = "dream-journal-analyzer/0.1";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM analysis is disabled")]
    Disabled,
    #[error("missing API key for provider `{0}`")]
    MissingApiKey(&'static str),
    #[error("daily limit of {0} upstream calls reached")]
    DailyLimit(u32),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("upstream returned no text")]
    EmptyResponse,
}

impl LlmError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Disabled => "disabled",
            LlmError::MissingApiKey(_) => "missing_key",
            LlmError::DailyLimit(_) => "daily_limit",
            LlmError::Transport(_) => "transport",
            LlmError::Upstream { .. } => "upstream",
            LlmError::EmptyResponse => "empty",
        }
    }
}

pub type LlmFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// Trait object used by handlers and tests.
pub trait LlmClient: Send + Sync {
    /// Send `prompt` upstream and return the generated markdown.
    fn complete<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a>;
    /// Provider name for diagnostics/metrics.
    fn provider_name(&self) -> &'static str;
}

pub type DynLlmClient = Arc<dyn LlmClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the configured provider wrapped with caching + daily limit.
pub fn build_client_from_config(config: &AiConfig) -> anyhow::Result<DynLlmClient> {
    let test_mock = std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false);
    let kind = if test_mock {
        ProviderKind::Mock
    } else if !config.enabled {
        return Ok(Arc::new(DisabledClient));
    } else {
        config
            .provider_kind()
            .ok_or_else(|| anyhow::anyhow!("Unsupported provider in config: {}", config.provider))?
    };

    let dir = config.cache_dir();
    let limit = config.daily_limit;
    let client: DynLlmClient = match kind {
        ProviderKind::Mock => Arc::new(CachingClient::new(MockProvider::default(), dir, limit)),
        ProviderKind::OpenAi => {
            Arc::new(CachingClient::new(OpenAiProvider::from_config(config)?, dir, limit))
        }
        ProviderKind::Anthropic => {
            Arc::new(CachingClient::new(AnthropicProvider::from_config(config)?, dir, limit))
        }
    };
    Ok(client)
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does a *real* remote call. Separated so the same caching
/// wrapper serves production and tests.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a>;
    fn name(&self) -> &'static str;
}

fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(http)
}

/// Read the body of a non-2xx response for diagnostics.
async fn upstream_error(resp: reqwest::Response) -> LlmError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    LlmError::Upstream { status, body }
}

/// OpenAI provider (Responses API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiResponse {
    #[serde(default)]
    pub output: Vec<OpenAiOutput>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAiOutput {
    #[serde(default)]
    pub content: Vec<TypedText>,
}

/// A `{ "type": ..., "text": ... }` content item, shared by both vendors.
#[derive(Debug, Deserialize)]
pub struct TypedText {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

fn join_typed(items: impl Iterator<Item = TypedText>, kind: &str) -> Option<String> {
    let joined = items
        .filter(|c| c.kind == kind)
        .filter_map(|c| c.text)
        .collect::<Vec<_>>()
        .join("\n");
    (!joined.is_empty()).then_some(joined)
}

/// Join every `output_text` item across all output messages.
pub fn openai_output_text(resp: OpenAiResponse) -> Option<String> {
    join_typed(
        resp.output.into_iter().flat_map(|o| o.content),
        "output_text",
    )
}

impl OpenAiProvider {
    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(cfg.timeout_secs)?,
            api_key: cfg.resolve_api_key(),
            model: cfg.model_name(),
            max_output_tokens: cfg.max_output_tokens,
        })
    }
}

impl Provider for OpenAiProvider {
    fn fetch<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or(LlmError::MissingApiKey("openai"))?;

            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                input: &'a str,
                max_output_tokens: u32,
            }

            let resp = self
                .http
                .post(OPENAI_RESPONSES_URL)
                .bearer_auth(api_key)
                .json(&Req {
                    model: &self.model,
                    input: prompt,
                    max_output_tokens: self.max_output_tokens,
                })
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(upstream_error(resp).await);
            }
            let body: OpenAiResponse = resp.json().await?;
            openai_output_text(body).ok_or(LlmError::EmptyResponse)
        })
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Anthropic provider (Messages API).
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    #[serde(default)]
    pub content: Vec<TypedText>,
}

/// Join every `text` content block.
pub fn anthropic_output_text(resp: AnthropicResponse) -> Option<String> {
    join_typed(resp.content.into_iter(), "text")
}

impl AnthropicProvider {
    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: http_client(cfg.timeout_secs)?,
            api_key: cfg.resolve_api_key(),
            model: cfg.model_name(),
            max_tokens: cfg.max_output_tokens,
        })
    }
}

impl Provider for AnthropicProvider {
    fn fetch<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async move {
            let api_key = self
                .api_key
                .as_deref()
                .ok_or(LlmError::MissingApiKey("anthropic"))?;

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                max_tokens: u32,
                messages: Vec<Msg<'a>>,
            }

            let resp = self
                .http
                .post(ANTHROPIC_MESSAGES_URL)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&Req {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    messages: vec![Msg {
                        role: "user",
                        content: prompt,
                    }],
                })
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(upstream_error(resp).await);
            }
            let body: AnthropicResponse = resp.json().await?;
            anthropic_output_text(body).ok_or(LlmError::EmptyResponse)
        })
    }
    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Always fails with `Disabled`; used when AI is turned off.
pub struct DisabledClient;

impl LlmClient for DisabledClient {
    fn complete<'a>(&'a self, _prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(async { Err(LlmError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

pub const MOCK_ANALYSIS: &str = "1. **Primary Emotion**: Curiosity, wonder\n\
2. **Symbolic Interpretation**: The imagery points to exploring unfamiliar parts of yourself.\n\
3. **Practical Insights**: Note which places in the dream felt most inviting.";

/// Deterministic provider for tests/local runs. Counts calls that reach it.
pub struct MockProvider {
    pub fixed: String,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(MOCK_ANALYSIS)
    }
}

impl Provider for MockProvider {
    fn fetch<'a>(&'a self, _prompt: &'a str) -> LlmFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching client wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// Counter state is guarded by a `Mutex`; cache files are written atomically via rename.
pub struct CachingClient<P: Provider> {
    inner: P,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Mutex<DailyCounter>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCompletion {
    text: String,
}

impl<P: Provider> CachingClient<P> {
    pub fn new(inner: P, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!(dir = %cache_dir.display(), error = %e, "LLM cache dir unavailable");
        }
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Real upstream calls made today.
    pub fn calls_today(&self) -> u32 {
        self.counter.lock().expect("poisoned counter").count
    }

    fn release_slot(&self) {
        let mut g = self.counter.lock().expect("poisoned counter");
        // A reservation from yesterday was already wiped by the reset.
        if !g.is_expired() {
            g.count = g.count.saturating_sub(1);
            let _ = save_daily_counter(&self.cache_dir, &g);
        }
    }

    async fn complete_impl(&self, prompt: &str) -> Result<String, LlmError> {
        // 1) Cache lookup; hits never touch the budget.
        let key = cache_key(self.inner.name(), prompt);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            debug!(provider = self.inner.name(), %key, "LLM cache hit");
            return Ok(hit.text);
        }

        // 2) Reserve a slot under the lock so concurrent callers cannot overshoot.
        {
            let mut g = self.counter.lock().expect("poisoned counter");
            if g.is_expired() {
                g.reset_to_today();
            }
            if g.count >= self.daily_limit_max {
                return Err(LlmError::DailyLimit(self.daily_limit_max));
            }
            g.count = g.count.saturating_add(1);
            let _ = save_daily_counter(&self.cache_dir, &g);
        }

        // 3) Real call; failures hand the slot back.
        let text = match self.inner.fetch(prompt).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.release_slot();
                return Err(LlmError::EmptyResponse);
            }
            Err(e) => {
                self.release_slot();
                return Err(e);
            }
        };
        let cached = CachedCompletion { text: text.clone() };
        if let Err(e) = write_cache_file(&self.cache_dir, &key, &cached) {
            warn!(error = %e, "LLM cache write failed");
        }
        Ok(text)
    }
}

impl<P: Provider> LlmClient for CachingClient<P> {
    fn complete<'a>(&'a self, prompt: &'a str) -> LlmFuture<'a> {
        Box::pin(self.complete_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

fn cache_key(provider: &str, prompt: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<CachedCompletion> {
    let s = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&s).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &CachedCompletion) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}
impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}
impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)?;
    Ok(())
}
