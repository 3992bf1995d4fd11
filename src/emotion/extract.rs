// src/emotion/extract.rs
//! Structural extraction of a "Primary Emotion(s)" declaration.
//!
//! Three patterns are tried in decreasing order of structural confidence. A pattern
//! whose capture cleans to nothing does not count as a result; the next one is tried.

use once_cell::sync::Lazy;
use regex::Regex;

/// `1. **Primary Emotion(s)**: value` at the start of the text or of a line.
static NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\n)\s*1\.\s*\*\*Primary Emotions?\*\*\s*:?\s*([^\n]+)")
        .expect("numbered heading regex")
});

/// `**Primary Emotion(s)**: value` anywhere.
static SAME_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*Primary Emotions?\*\*\s*:?\s*([^\n]+)").expect("same-line heading regex")
});

/// `**Primary Emotion(s)**:` followed by a bullet list on the next lines.
static HEADING_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\*Primary Emotions?\*\*\s*:?\s*\n+((?:[-*•]\s*[^\n]+\n?)+)")
        .expect("heading-list regex")
});

static FIRST_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-*•]\s*([^\n]+)").expect("bullet regex"));

static LEADING_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-*•]\s*").expect("leading bullet regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static LIST_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[,;/]|\s+and\s+").expect("list separator regex"));
static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(the|a|an)\s+").expect("article regex"));
static TRAILING_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+(emotion|emotions|feeling|feelings)$").expect("suffix regex")
});

/// One extraction attempt over normalized text.
type Strategy = fn(&str) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("numbered", numbered_heading),
    ("same_line", same_line_heading),
    ("heading_list", heading_then_list),
];

/// CRLF to LF, then trim.
pub fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n").trim().to_string()
}

/// Run the structural strategies over normalized text; first usable label wins.
pub fn find_declared(text: &str) -> Option<String> {
    STRATEGIES.iter().find_map(|(name, attempt)| {
        let hit = attempt(text);
        if hit.is_some() {
            tracing::trace!(target: "emotion", strategy = *name, "structural match");
        }
        hit
    })
}

fn numbered_heading(text: &str) -> Option<String> {
    let caps = NUMBERED.captures(text)?;
    clean_candidate(caps.get(1)?.as_str())
}

fn same_line_heading(text: &str) -> Option<String> {
    let caps = SAME_LINE.captures(text)?;
    clean_candidate(caps.get(1)?.as_str())
}

fn heading_then_list(text: &str) -> Option<String> {
    let block = HEADING_LIST.captures(text)?.get(1)?.as_str();
    let first = FIRST_BULLET.captures(block)?.get(1)?.as_str();
    clean_candidate(first)
}

/// Reduce a raw matched fragment to a single lowercase emotion token.
///
/// Returns `None` when nothing usable remains.
pub fn clean_candidate(raw: &str) -> Option<String> {
    let unmarked = raw.replace("**", "").replace('`', "");
    // Parentheses go; the words inside them stay.
    let clean = unmarked.replace(['(', ')'], "");
    let clean = LEADING_BULLET.replace(&clean, "");
    let clean = WHITESPACE.replace_all(&clean, " ");

    let first = LIST_SEPARATOR
        .split(clean.trim())
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if first.is_empty() {
        return None;
    }

    let out = LEADING_ARTICLE.replace(&first, "");
    let out = TRAILING_SUFFIX.replace(&out, "");
    let out = LEADING_BULLET.replace(&out, "");
    let out = out.trim();

    if out.is_empty() {
        None
    } else {
        Some(out.to_string())
    }
}
