// tests/emotion_extract.rs
// End-to-end checks of primary-emotion resolution on realistic LLM output.

use dream_journal_analyzer::emotion::{resolve, EmotionSource, EMOTION_KEYWORDS};
use dream_journal_analyzer::{
    extract_primary_emotion, get_dream_emotion, StoredDreamRecord, UNKNOWN,
};

const NUMBERED_REPORT: &str = "## Dream Analysis\r\n\r\n\
1. **Primary Emotion**: Joy, Anxiety\r\n\
2. **Symbolic Interpretation**: The open door stands for opportunity.\r\n\
3. **Psychological Insights**: You may be ready for change.\r\n";

const LIST_REPORT: &str = "**Symbolic Interpretation:** The old house is memory.\n\n\
**Primary Emotions**:\n\
- Nostalgia (strong)\n\
- Peace\n\n\
**Practical Insights:**\n- Write down what rooms you remember.";

#[test]
fn numbered_report() {
    assert_eq!(extract_primary_emotion(NUMBERED_REPORT), "joy");
}

#[test]
fn list_report() {
    assert_eq!(extract_primary_emotion(LIST_REPORT), "nostalgia");
}

#[test]
fn inline_declaration_with_conjunction() {
    let text = "Your dream is vivid.\n**Primary Emotions**: fear and confusion\n**Symbols**: a dark lake";
    assert_eq!(extract_primary_emotion(text), "fear");
}

#[test]
fn declaration_wins_over_earlier_keywords() {
    let text = "You felt happy at first.\n**Primary Emotion**: `Dread`";
    assert_eq!(extract_primary_emotion(text), "dread");
}

#[test]
fn unstructured_text_uses_keyword_fallback() {
    let text = "In this dream you were feeling quite anxious about missing the train.";
    assert_eq!(extract_primary_emotion(text), "anx");
}

#[test]
fn keyword_beyond_first_500_chars_is_ignored() {
    let text = format!("{} Overall the mood was peaceful.", "The corridor went on. ".repeat(30));
    assert!(text.find("peaceful").unwrap() > 500);
    assert_eq!(extract_primary_emotion(&text), UNKNOWN);
}

#[test]
fn empty_inputs_collapse_to_unknown() {
    for input in ["", " ", "\r\n\r\n", "\t"] {
        assert_eq!(extract_primary_emotion(input), UNKNOWN);
        assert_eq!(get_dream_emotion(&StoredDreamRecord::new("", input)), UNKNOWN);
    }
}

#[test]
fn label_is_never_empty_or_multi_valued() {
    let samples = [
        NUMBERED_REPORT,
        LIST_REPORT,
        "**Primary Emotion**:",
        "**Primary Emotions**: ,;/",
        "1. **Primary Emotion**: the feeling",
        "random words",
    ];
    for s in samples {
        let label = extract_primary_emotion(s);
        assert!(!label.is_empty(), "empty label for {s:?}");
        assert!(!label.contains(','), "multi-valued label {label:?}");
        assert_eq!(label, label.to_lowercase());
    }
}

#[test]
fn clean_stored_label_is_trusted_verbatim() {
    for stored in ["Joy", "  GRIEF  ", "bittersweet longing"] {
        let rec = StoredDreamRecord::new(stored, "1. **Primary Emotion**: fear");
        assert_eq!(get_dream_emotion(&rec), stored.trim().to_lowercase());
        assert_eq!(resolve(&rec).1, EmotionSource::Stored);
    }
}

#[test]
fn untrusted_stored_labels_trigger_rederivation() {
    let interpretation = "**Primary Emotion**: peace";
    for stored in ["joy, anxiety", "joy and fear", "Not specified", "unknown", "   "] {
        let rec = StoredDreamRecord::new(stored, interpretation);
        assert_eq!(get_dream_emotion(&rec), "peace", "stored={stored:?}");
    }
}

#[test]
fn stored_record_deserializes_with_missing_fields() {
    let rec: StoredDreamRecord = serde_json::from_str(r#"{"emotion":"Calm"}"#).unwrap();
    assert_eq!(get_dream_emotion(&rec), "calm");
    let rec: StoredDreamRecord = serde_json::from_str("{}").unwrap();
    assert_eq!(get_dream_emotion(&rec), UNKNOWN);
}

#[test]
fn every_vocabulary_entry_is_detected_alone() {
    for kw in EMOTION_KEYWORDS {
        let label = extract_primary_emotion(&format!("It was a {kw} night."));
        assert_ne!(label, UNKNOWN, "keyword {kw} not detected");
        assert!(kw.starts_with(&label), "{label} is not a prefix of {kw}");
    }
}

#[test]
fn repeated_calls_agree() {
    for s in [NUMBERED_REPORT, LIST_REPORT, "calm seas"] {
        assert_eq!(extract_primary_emotion(s), extract_primary_emotion(s));
    }
}
