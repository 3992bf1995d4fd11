// src/emotion/summary.rs
//! Aggregate view over a batch of journal entries: how often each emotion shows up.

use serde::{Deserialize, Serialize};

use super::{resolve, EmotionSource, StoredDreamRecord};

/// A journal entry as sent by the client for aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DreamRecord {
    #[serde(default)]
    pub emotion: String,
    #[serde(default)]
    pub interpretation: String,
    /// "yes" | "no" as stored by the journal form.
    #[serde(default)]
    pub recurring: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmotionSummary {
    pub total: usize,
    pub recurring: usize,
    pub top: Option<String>,
    pub counts: Vec<EmotionCount>,
}

/// Count resolved labels. Sorted by count descending; ties keep first-appearance order.
pub fn summarize(records: &[DreamRecord]) -> EmotionSummary {
    let mut counts: Vec<EmotionCount> = Vec::new();
    let mut recurring = 0;

    for r in records {
        if r
            .recurring
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("yes"))
        {
            recurring += 1;
        }

        let stored = StoredDreamRecord::new(r.emotion.clone(), r.interpretation.clone());
        let (label, source) = resolve(&stored);
        metrics::counter!("emotion_resolved_total", "source" => source.as_str()).increment(1);
        if source == EmotionSource::Unknown {
            tracing::debug!(target: "emotion", "summary entry without a determinable emotion");
        }

        match counts.iter_mut().find(|c| c.emotion == label) {
            Some(c) => c.count += 1,
            None => counts.push(EmotionCount {
                emotion: label,
                count: 1,
            }),
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));

    EmotionSummary {
        total: records.len(),
        recurring,
        top: counts.first().map(|c| c.emotion.clone()),
        counts,
    }
}
