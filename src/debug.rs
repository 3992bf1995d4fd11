//! Dev diagnostics: anonymized ids for logs, the dev-log gate, and lightweight
//! request stats served under `/debug/stats`.

use std::{collections::VecDeque, sync::Mutex};

use axum::{routing::get, Json, Router};
use once_cell::sync::Lazy;
use serde::Serialize;

const LAT_CAP: usize = 200;
const SLOW_REQ_MS: u128 = 5_000;

pub const ENV_DEV_LOG: &str = "DREAM_DEV_LOG";

#[derive(Default, Clone, Serialize)]
pub struct Stats {
    pub total_requests: u64,
    pub relay_requests: u64,
    pub dream_requests: u64,
    pub fallback_responses: u64,
    pub last_slow_ms: Option<u128>,
    pub rolling_avg_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub enum RequestKind {
    Relay,
    Dream,
}

static STATS: Lazy<Mutex<Stats>> = Lazy::new(|| Mutex::new(Stats::default()));
static LAT_MS: Lazy<Mutex<VecDeque<u128>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(LAT_CAP)));

/// Short SHA-256 prefix of `text`, safe to log in place of dream content.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// DREAM_DEV_LOG=1 AND dev env (debug build or SHUTTLE_ENV in {local,development,dev}).
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Stateless routes, mergeable into any app router.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/debug/stats", get(stats))
}

pub fn record_request(kind: RequestKind) {
    let mut s = STATS.lock().expect("stats mutex poisoned");
    s.total_requests += 1;
    match kind {
        RequestKind::Relay => s.relay_requests += 1,
        RequestKind::Dream => s.dream_requests += 1,
    }
}

pub fn record_fallback() {
    STATS.lock().expect("stats mutex poisoned").fallback_responses += 1;
}

pub fn record_latency(lat_ms: u128) {
    let avg = {
        let mut q = LAT_MS.lock().expect("latency mutex poisoned");
        if q.len() >= LAT_CAP {
            q.pop_front();
        }
        q.push_back(lat_ms);
        let sum: u128 = q.iter().copied().sum();
        sum as f64 / q.len() as f64
    };

    let mut s = STATS.lock().expect("stats mutex poisoned");
    s.rolling_avg_ms = Some(avg);
    if lat_ms > SLOW_REQ_MS {
        s.last_slow_ms = Some(lat_ms);
    }
}

pub fn snapshot() -> Stats {
    STATS.lock().expect("stats mutex poisoned").clone()
}

async fn stats() -> Json<Stats> {
    Json(snapshot())
}
