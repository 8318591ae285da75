//! Voice, persona, and scenario lookup tables.
//!
//! Static data consulted while building vendor configuration. Unknown
//! keys always fall back to a sensible default rather than failing;
//! subjects and scenarios are open-ended client input.

use serde::Serialize;

use super::types::TutorPersonality;

/// Feature flags requested for tutor sessions.
pub const TUTOR_FEATURES: &[&str] = &[
    "real_time_transcription",
    "emotion_detection",
    "adaptive_responses",
    "pronunciation_feedback",
    "interrupt_handling",
];

/// Feature flags requested for language-practice sessions.
pub const PRACTICE_FEATURES: &[&str] = &[
    "real_time_transcription",
    "pronunciation_scoring",
    "grammar_correction",
    "vocabulary_suggestions",
    "cultural_context",
];

/// Correction style sent for language-practice sessions.
pub const DEFAULT_CORRECTION_STYLE: &str = "supportive";

/// Resolve the tutor persona for a subject and learning style.
pub fn tutor_personality(subject: &str, learning_style: &str) -> TutorPersonality {
    let (tone, pace, examples, encouragement) = match (subject, learning_style) {
        ("math", "visual") => ("analytical", "moderate", "geometric", "logical"),
        ("math", "auditory") => ("rhythmic", "varied", "pattern-based", "verbal"),
        ("language", "visual") => ("descriptive", "steady", "imagery-rich", "expressive"),
        _ => ("friendly", "adaptive", "practical", "supportive"),
    };

    TutorPersonality {
        tone: tone.to_string(),
        pace: pace.to_string(),
        examples: examples.to_string(),
        encouragement: encouragement.to_string(),
    }
}

/// Pick the tutor voice model for a subject.
pub fn tutor_voice(subject: &str) -> &'static str {
    match subject {
        "math" => "tutor_analytical_sarah",
        "science" => "tutor_curious_james",
        "language" => "tutor_expressive_emma",
        "history" => "tutor_narrative_michael",
        "programming" => "tutor_technical_alex",
        _ => "tutor_friendly_sarah",
    }
}

/// Voice model for language practice: a native speaker of the target language.
pub fn practice_voice(target_language: &str) -> String {
    format!("native_{}", target_language)
}

// ============================================================================
// Scenarios
// ============================================================================

/// Conversational frame for a language-practice scenario, handed back to
/// the client alongside the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioContext {
    pub setting: &'static str,
    pub vocabulary_focus: &'static [&'static str],
    pub cultural_notes: &'static [&'static str],
}

/// Look up a known scenario's context. Unknown scenarios have none.
pub fn scenario_context(scenario: &str) -> Option<ScenarioContext> {
    match scenario {
        "restaurant" => Some(ScenarioContext {
            setting: "casual_dining",
            vocabulary_focus: &["food", "ordering", "preferences"],
            cultural_notes: &["tipping", "etiquette"],
        }),
        "business" => Some(ScenarioContext {
            setting: "professional",
            vocabulary_focus: &["formal", "negotiations", "presentations"],
            cultural_notes: &["greetings", "hierarchy"],
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_matches_subject_and_style() {
        let persona = tutor_personality("math", "visual");
        assert_eq!(persona.tone, "analytical");
        assert_eq!(persona.examples, "geometric");

        let persona = tutor_personality("math", "auditory");
        assert_eq!(persona.pace, "varied");
    }

    #[test]
    fn unknown_subject_or_style_falls_back() {
        for (subject, style) in [("astronomy", "visual"), ("math", "kinesthetic"), ("", "")] {
            let persona = tutor_personality(subject, style);
            assert_eq!(persona.tone, "friendly");
            assert_eq!(persona.encouragement, "supportive");
        }
    }

    #[test]
    fn voices_cover_known_subjects_with_default() {
        assert_eq!(tutor_voice("science"), "tutor_curious_james");
        assert_eq!(tutor_voice("philosophy"), "tutor_friendly_sarah");
        assert_eq!(practice_voice("es"), "native_es");
    }

    #[test]
    fn scenario_lookup_is_partial() {
        let restaurant = scenario_context("restaurant").unwrap();
        assert_eq!(restaurant.setting, "casual_dining");
        assert!(restaurant.vocabulary_focus.contains(&"ordering"));

        assert!(scenario_context("space_station").is_none());
    }
}
