// src/emotion/keywords.rs
//! Keyword fallback used when no structured declaration is present.

/// Ordered vocabulary. Priority is list order, not position in the text.
pub const EMOTION_KEYWORDS: &[&str] = &[
    "anxiety",
    "anxious",
    "fear",
    "afraid",
    "scared",
    "joy",
    "joyful",
    "happy",
    "sadness",
    "sad",
    "anger",
    "angry",
    "confusion",
    "confused",
    "peace",
    "peaceful",
    "calm",
    "excitement",
    "excited",
    "nostalgia",
    "nostalgic",
    "curiosity",
    "curious",
];

/// Only this many leading characters are scanned.
pub const SCAN_WINDOW_CHARS: usize = 500;

const ADJECTIVE_SUFFIXES: &[&str] = &["ious", "ful", "ed"];
const NOUN_SUFFIX: &str = "ness";

/// Return the base form of the first vocabulary entry found in the scan window.
pub fn scan_keywords(text: &str) -> Option<String> {
    let window: String = text.chars().take(SCAN_WINDOW_CHARS).collect::<String>().to_lowercase();
    EMOTION_KEYWORDS
        .iter()
        .find(|kw| window.contains(*kw))
        .map(|kw| base_form(kw))
}

/// Crude stemming: one optional `ious`/`ful`/`ed` strip, then one optional `ness` strip.
pub fn base_form(word: &str) -> String {
    let stem = ADJECTIVE_SUFFIXES
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .unwrap_or(word);
    stem.strip_suffix(NOUN_SUFFIX).unwrap_or(stem).to_string()
}
