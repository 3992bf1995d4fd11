// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod debug;
pub mod emotion;
pub mod metrics;
pub mod prompt;

// Analysis pipeline (prompt -> LLM adapter -> emotion)
pub mod analyze;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::{router, AppState};
pub use crate::emotion::{extract_primary_emotion, get_dream_emotion, StoredDreamRecord, UNKNOWN};
pub use crate::prompt::{build_prompt, DreamRequest, Recurrence};
