// src/emotion/mod.rs
//! Primary-emotion resolution for dream interpretations.
//!
//! Entry points:
//! - `extract_primary_emotion(text)` derives a label from LLM markdown.
//! - `get_dream_emotion(record)` trusts a clean stored label, otherwise re-derives.
//!
//! Both are total: absence of information always degrades to [`UNKNOWN`].

pub mod extract;
pub mod keywords;
pub mod summary;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::emotion::extract::{clean_candidate, normalize};
pub use crate::emotion::keywords::{base_form, scan_keywords, EMOTION_KEYWORDS};
pub use crate::emotion::summary::{summarize, DreamRecord, EmotionCount, EmotionSummary};

/// Sentinel label returned when nothing can be determined.
pub const UNKNOWN: &str = "unknown";

/// Placeholder the journal form stores when the user skipped the emotion field.
const NOT_SPECIFIED: &str = "not specified";

/// The persisted fields relevant for emotion resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDreamRecord {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub interpretation: String,
}

impl StoredDreamRecord {
    pub fn new(emotion: impl Into<String>, interpretation: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
            interpretation: interpretation.into(),
        }
    }
}

/// Which strategy produced a label. Used for logs and metrics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmotionSource {
    Stored,
    Pattern,
    Keyword,
    Unknown,
}

impl EmotionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionSource::Stored => "stored",
            EmotionSource::Pattern => "pattern",
            EmotionSource::Keyword => "keyword",
            EmotionSource::Unknown => "unknown",
        }
    }
}

/// Extract the first "Primary Emotion" from an LLM analysis.
///
/// Order: numbered heading, inline heading, heading followed by a bullet list,
/// then the keyword fallback over the first 500 characters.
pub fn extract_primary_emotion(analysis_text: &str) -> String {
    resolve_from_text(analysis_text).0
}

/// Resolve the label for a persisted dream.
pub fn get_dream_emotion(record: &StoredDreamRecord) -> String {
    resolve(record).0
}

/// Like [`get_dream_emotion`], but also reports which strategy won.
pub fn resolve(record: &StoredDreamRecord) -> (String, EmotionSource) {
    let stored = record.emotion.trim().to_lowercase();
    if is_trusted_label(&stored) {
        debug!(target: "emotion", source = "stored", label = %stored);
        return (stored, EmotionSource::Stored);
    }
    resolve_from_text(&record.interpretation)
}

/// Like [`extract_primary_emotion`], but also reports which strategy won.
pub fn resolve_from_text(analysis_text: &str) -> (String, EmotionSource) {
    let text = normalize(analysis_text);
    if text.is_empty() {
        return (UNKNOWN.to_string(), EmotionSource::Unknown);
    }
    let id = crate::debug::anon_hash(&text);

    if let Some(label) = extract::find_declared(&text) {
        debug!(target: "emotion", %id, source = "pattern", label = %label);
        return (label, EmotionSource::Pattern);
    }
    if let Some(label) = scan_keywords(&text) {
        debug!(target: "emotion", %id, source = "keyword", label = %label);
        return (label, EmotionSource::Keyword);
    }

    debug!(target: "emotion", %id, "no emotion found");
    (UNKNOWN.to_string(), EmotionSource::Unknown)
}

/// A stored label is trusted when it is a single, non-placeholder value.
fn is_trusted_label(stored: &str) -> bool {
    !stored.is_empty()
        && stored != NOT_SPECIFIED
        && stored != UNKNOWN
        && !stored.contains(',')
        && !stored.contains(" and ")
}
