//! Adaptive difficulty and pacing decisions.
//!
//! Two independent pure decisions: which difficulty level the next piece
//! of content should target, and how fast to pace it. Callers compose
//! them into a content-request configuration; nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Performance score above which content moves up one level.
pub const PROMOTE_THRESHOLD: f64 = 0.85;

/// Performance score below which content moves down one level.
pub const DEMOTE_THRESHOLD: f64 = 0.60;

/// Assumed performance for a user with no session history yet.
pub const DEFAULT_PERFORMANCE: f64 = 0.5;

/// How many recent sessions feed the rolling performance score.
pub const PERFORMANCE_WINDOW: usize = 5;

// ============================================================================
// Difficulty Levels
// ============================================================================

/// Ordered content difficulty levels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Beginner,
    Elementary,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLevel {
    /// The next level up, or `self` at the top of the scale.
    #[must_use]
    pub fn promoted(self) -> Self {
        match self {
            Self::Beginner => Self::Elementary,
            Self::Elementary => Self::Intermediate,
            Self::Intermediate => Self::Advanced,
            Self::Advanced | Self::Expert => Self::Expert,
        }
    }

    /// The next level down, or `self` at the bottom of the scale.
    #[must_use]
    pub fn demoted(self) -> Self {
        match self {
            Self::Beginner | Self::Elementary => Self::Beginner,
            Self::Intermediate => Self::Elementary,
            Self::Advanced => Self::Intermediate,
            Self::Expert => Self::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Elementary => "elementary",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick the difficulty for the next piece of content.
///
/// Scores above [`PROMOTE_THRESHOLD`] move up one level, scores below
/// [`DEMOTE_THRESHOLD`] move down one, anything in between keeps the
/// current level. Already being at either end of the scale is not an
/// error; the level simply stays put.
#[must_use]
pub fn next_difficulty(current: DifficultyLevel, performance_score: f64) -> DifficultyLevel {
    if performance_score > PROMOTE_THRESHOLD {
        current.promoted()
    } else if performance_score < DEMOTE_THRESHOLD {
        current.demoted()
    } else {
        current
    }
}

// ============================================================================
// Pacing
// ============================================================================

/// Content pacing relative to the default delivery speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Slower,
    Normal,
    Faster,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slower => "slower",
            Self::Normal => "normal",
            Self::Faster => "faster",
        }
    }
}

/// Pick the pacing for the next piece of content from affect + accuracy.
///
/// A frustrated or confused user always gets slower pacing; a bored user
/// who is also accurate gets faster pacing; everyone else stays at normal.
/// Independent of [`next_difficulty`].
#[must_use]
pub fn pace(emotion: &str, accuracy: f64) -> Pace {
    match emotion {
        "frustrated" | "confused" => Pace::Slower,
        "bored" if accuracy > 0.8 => Pace::Faster,
        _ => Pace::Normal,
    }
}

// ============================================================================
// Rolling Performance
// ============================================================================

/// Rolling performance score: the mean comprehension over the most recent
/// sessions (at most [`PERFORMANCE_WINDOW`]), with missing scores counted
/// as zero. A user with no history scores [`DEFAULT_PERFORMANCE`].
#[must_use]
pub fn performance_from_recent(comprehension_scores: &[Option<f64>]) -> f64 {
    let window = &comprehension_scores[..comprehension_scores.len().min(PERFORMANCE_WINDOW)];
    if window.is_empty() {
        return DEFAULT_PERFORMANCE;
    }
    let total: f64 = window.iter().map(|s| s.unwrap_or(0.0)).sum();
    total / window.len() as f64
}

/// Composed difficulty + pacing decision for one content request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptivePlan {
    pub difficulty: DifficultyLevel,
    pub pace: Pace,
    pub performance_score: f64,
}

impl AdaptivePlan {
    /// Compose the two independent decisions for a content request.
    #[must_use]
    pub fn new(
        current: DifficultyLevel,
        performance_score: f64,
        emotion: &str,
        accuracy: f64,
    ) -> Self {
        Self {
            difficulty: next_difficulty(current, performance_score),
            pace: pace(emotion, accuracy),
            performance_score,
        }
    }
}
