// src/prompt.rs
//! Dream submission -> LLM prompt, plus the canned analysis shown when the LLM is unavailable.

use serde::{Deserialize, Serialize};

/// Whether the user reports the dream as a recurring theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Yes,
    No,
}

/// Journal form payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DreamRequest {
    pub description: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub recurring: Option<Recurrence>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub symbols: Option<String>,
    #[serde(default)]
    pub recent_events: Option<String>,
}

impl DreamRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.description.trim().is_empty() {
            anyhow::bail!("Please describe your dream first!");
        }
        Ok(())
    }

    fn is_recurring(&self) -> bool {
        self.recurring == Some(Recurrence::Yes)
    }
}

/// Optional fields count as absent when blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

const PREAMBLE: &str = "You are an expert dream analyst with knowledge of Jungian psychology, symbolism, and the subconscious mind. Analyze the following dream in detail:";

/// Build the analysis prompt sent to the LLM.
pub fn build_prompt(req: &DreamRequest) -> String {
    let mut lines: Vec<String> = vec![
        PREAMBLE.to_string(),
        String::new(),
        format!("Dream Description: {}", req.description.trim()),
        String::new(),
    ];

    if let Some(e) = present(&req.emotion) {
        lines.push(format!("Emotions Felt: {e}"));
    }
    match req.recurring {
        Some(Recurrence::Yes) => {
            lines.push("Recurring Theme: Yes, this is a recurring dream or theme".to_string())
        }
        Some(Recurrence::No) => {
            lines.push("Recurring Theme: No, this is a standalone dream".to_string())
        }
        None => {}
    }
    if let Some(t) = present(&req.time) {
        lines.push(format!("When Dream Occurred: {t}"));
    }
    if let Some(s) = present(&req.symbols) {
        lines.push(format!("Notable Symbols/Elements: {s}"));
    }
    if let Some(r) = present(&req.recent_events) {
        lines.push(format!("Recent Life Events: {r}"));
    }

    lines.push(String::new());
    lines.push("Please provide a comprehensive analysis that includes:".to_string());
    lines.push(
        "1. **Symbolic Interpretation**: What the main symbols and imagery might represent"
            .to_string(),
    );
    lines.push(
        "2. **Emotional Context**: How the emotions relate to the dream's meaning".to_string(),
    );
    lines.push(
        "3. **Psychological Insights**: Potential connections to the dreamer's subconscious or waking life"
            .to_string(),
    );
    lines.push(
        "4. **Archetypal Themes**: Any universal patterns or archetypes present".to_string(),
    );
    if req.is_recurring() {
        lines.push(
            "5. **Recurring Theme Analysis**: Why this theme keeps appearing and what it might be trying to communicate"
                .to_string(),
        );
    }
    lines.push(
        "6. **Practical Insights**: Actionable reflections or questions for the dreamer to consider"
            .to_string(),
    );
    lines.push(String::new());
    lines.push(
        "Keep the tone warm, insightful, and empowering. Format using markdown with bold headings."
            .to_string(),
    );

    lines.join("\n")
}

/// Static analysis returned when the LLM call fails.
pub fn fallback_analysis(req: &DreamRequest) -> String {
    let felt = present(&req.emotion).unwrap_or("emotions you experienced");

    let mut sections = vec![
        "**Symbolic Interpretation:**\nThe imagery in your dream points to transformation and personal growth. Settings in dreams often symbolize the mind or inner world, while recurring objects and creatures can stand for change that is already under way.".to_string(),
        format!(
            "**Emotional Context:**\nThe {felt} during this dream provide important context about your subconscious state. This emotional tone suggests you may be in a period of personal development."
        ),
        "**Psychological Insights:**\nYour subconscious is processing themes of change and transformation. The setting suggests you're in a receptive state for this growth.".to_string(),
        "**Archetypal Themes:**\nThis dream taps into the archetypal journey of metamorphosis and rebirth, a pattern found across cultures.".to_string(),
    ];
    if req.is_recurring() {
        sections.push("**Recurring Theme Analysis:**\nSince this is a recurring theme, your subconscious is emphasizing the importance of this message. Pay attention to what aspects of transformation you might be resisting or embracing in your waking life.".to_string());
    }
    sections.push(
        "**Practical Insights:**\n- Journal about areas of your life where you're experiencing or seeking change\n- Reflect on what \"transformation\" means to you currently\n- Notice if similar imagery appears in future dreams\n- Consider speaking with a therapist if the dream feels particularly significant".to_string(),
    );

    sections.join("\n\n")
}
