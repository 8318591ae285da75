//! Pronunciation analysis on top of the vendor's speech capabilities.
//!
//! The vendor returns an opaque analysis result; this module parses the
//! fields it understands, fills defaults for anything missing, and derives
//! human-readable improvement suggestions from the scores.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::vendor::{VendorError, VendorGateway};

/// Overall score below which the general slow-down suggestion applies.
const LOW_OVERALL_SCORE: f64 = 0.7;

/// Per-phoneme score below which a focused suggestion applies.
const LOW_PHONEME_SCORE: f64 = 0.6;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("vendor unavailable: {0}")]
    Vendor(#[from] VendorError),

    #[error("malformed analysis result: {0}")]
    MalformedResult(String),
}

pub type Result<T> = std::result::Result<T, SpeechError>;

// ============================================================================
// Analysis Types
// ============================================================================

/// Score for one phoneme within an analyzed utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeScore {
    pub phoneme: String,
    pub score: f64,
}

/// Structured pronunciation analysis derived from a vendor result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PronunciationAnalysis {
    pub overall_score: f64,
    pub phoneme_scores: Vec<PhonemeScore>,
    pub fluency_score: f64,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_feedback_url: Option<String>,
}

/// The fields this module reads out of the vendor's opaque result.
/// Anything the vendor omits defaults to zero or empty.
#[derive(Debug, Default, Deserialize)]
struct VendorAnalysis {
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    phoneme_scores: Vec<PhonemeScore>,
    #[serde(default)]
    fluency_score: f64,
    #[serde(default)]
    audio_feedback_url: Option<String>,
}

/// Pronunciation guide for a single word.
#[derive(Debug, Clone, Serialize)]
pub struct PronunciationGuide {
    pub word: String,
    pub ipa: String,
    pub syllables: Vec<String>,
    pub audio_url: String,
    pub tips: Vec<String>,
}

/// One well-known pronunciation difficulty for a language pair.
#[derive(Debug, Clone, Serialize)]
pub struct CommonMistake {
    pub sound: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
    pub tip: &'static str,
}

// ============================================================================
// Analyzer
// ============================================================================

/// Speech analyzer backed by the vendor gateway.
#[derive(Clone)]
pub struct SpeechAnalyzer {
    gateway: Arc<dyn VendorGateway>,
}

impl SpeechAnalyzer {
    pub fn new(gateway: Arc<dyn VendorGateway>) -> Self {
        Self { gateway }
    }

    /// Analyze pronunciation accuracy of an utterance.
    ///
    /// `target_text` is what the speaker was attempting, when known.
    pub async fn analyze_pronunciation(
        &self,
        audio: Bytes,
        target_text: Option<&str>,
        language: &str,
    ) -> Result<PronunciationAnalysis> {
        debug!(
            language = %language,
            has_target = target_text.is_some(),
            audio_bytes = audio.len(),
            "Analyzing pronunciation"
        );

        let raw = self.gateway.analyze_speech(audio, "pronunciation").await?;
        let analysis: VendorAnalysis = serde_json::from_value(raw)
            .map_err(|e| SpeechError::MalformedResult(e.to_string()))?;

        let suggestions = generate_suggestions(&analysis);
        Ok(PronunciationAnalysis {
            overall_score: analysis.overall_score,
            phoneme_scores: analysis.phoneme_scores,
            fluency_score: analysis.fluency_score,
            suggestions,
            audio_feedback_url: analysis.audio_feedback_url,
        })
    }

    /// Pronunciation guide for one word.
    ///
    /// TODO: fetch from the vendor's pronunciation-guide endpoint once it
    /// is exposed; until then this serves placeholder guide data.
    pub fn pronunciation_guide(&self, word: &str) -> PronunciationGuide {
        PronunciationGuide {
            word: word.to_string(),
            ipa: "[pronunciation]".to_string(),
            syllables: vec!["syl".to_string(), "la".to_string(), "bles".to_string()],
            audio_url: format!("https://api.omnidim.io/audio/pronounce/{}", word),
            tips: vec![
                "Focus on the first syllable".to_string(),
                "The 'r' sound is soft".to_string(),
            ],
        }
    }
}

/// Improvement suggestions derived from the analysis scores.
fn generate_suggestions(analysis: &VendorAnalysis) -> Vec<String> {
    let mut suggestions = Vec::new();

    if analysis.overall_score < LOW_OVERALL_SCORE {
        suggestions.push("Practice speaking more slowly and clearly".to_string());
    }

    for phoneme in &analysis.phoneme_scores {
        if phoneme.score < LOW_PHONEME_SCORE {
            suggestions.push(format!("Focus on pronouncing '{}' sounds", phoneme.phoneme));
        }
    }

    suggestions
}

/// Well-known pronunciation difficulties for a (target, native) language pair.
pub fn common_mistakes(target_language: &str, native_language: &str) -> &'static [CommonMistake] {
    match (target_language, native_language) {
        ("en", "es") => &[
            CommonMistake {
                sound: "th",
                description: "The 'th' sound doesn't exist in Spanish",
                examples: &["think", "that"],
                tip: "Place tongue between teeth",
            },
            CommonMistake {
                sound: "v/b",
                description: "Spanish speakers often confuse v and b",
                examples: &["very/berry", "vine/bine"],
                tip: "V uses teeth on lower lip",
            },
        ],
        _ => &[],
    }
}
