//! SM-2 spaced-repetition scheduling.
//!
//! Pure next-review computation: given the quality of the most recent
//! review and the item's current scheduling state, produce the next
//! interval, ease factor, and repetition count. No I/O happens here;
//! persistence and due-date arithmetic live in [`crate::learning::reviews`].

use thiserror::Error;

/// Lower bound for the ease factor. SM-2 never lets an item's interval
/// growth rate drop below this.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Quality at or above this grade counts as a pass.
pub const PASS_QUALITY: u8 = 3;

/// Highest valid review quality grade.
pub const MAX_QUALITY: u8 = 5;

/// A review quality grade outside the 0-5 range.
///
/// Out-of-range quality is a caller bug (a grading UI sending garbage),
/// so it is rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("review quality must be 0-{MAX_QUALITY}, got {quality}")]
pub struct InvalidQuality {
    pub quality: u8,
}

/// Result of one next-review computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextReview {
    /// Days until the item is due again. Always >= 1.
    pub interval_days: u32,
    /// Updated ease factor. Always >= [`MIN_EASE_FACTOR`].
    pub ease_factor: f64,
    /// Consecutive qualifying reviews. Reset to 0 on failure.
    pub repetitions: u32,
}

/// Compute the next review schedule for an item (SM-2).
///
/// `quality` grades the review just performed (0 = complete failure,
/// 5 = perfect recall); a grade of [`PASS_QUALITY`] or higher counts as
/// a pass. `repetitions`, `ease_factor`, and `interval_days` are the
/// item's state prior to this review, with `ease_factor >= 1.3` and
/// `interval_days >= 1`.
///
/// On a pass the repetition count grows and the interval follows the
/// 1 -> 6 -> ceil(interval * ease) progression. On a failure the item
/// starts over at a one-day interval. The ease factor is updated in both
/// cases and never drops below [`MIN_EASE_FACTOR`].
pub fn compute_next_review(
    quality: u8,
    repetitions: u32,
    ease_factor: f64,
    interval_days: u32,
) -> Result<NextReview, InvalidQuality> {
    if quality > MAX_QUALITY {
        return Err(InvalidQuality { quality });
    }

    let (new_interval, new_repetitions) = if quality >= PASS_QUALITY {
        let interval = match repetitions {
            0 => 1,
            1 => 6,
            _ => (f64::from(interval_days) * ease_factor).ceil() as u32,
        };
        (interval, repetitions + 1)
    } else {
        (1, 0)
    };

    let penalty = f64::from(MAX_QUALITY - quality);
    let new_ease = (ease_factor + 0.1 - penalty * (0.08 + penalty * 0.02)).max(MIN_EASE_FACTOR);

    Ok(NextReview {
        interval_days: new_interval,
        ease_factor: new_ease,
        repetitions: new_repetitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn first_pass_schedules_one_day() {
        for quality in PASS_QUALITY..=MAX_QUALITY {
            let next = compute_next_review(quality, 0, 2.5, 1).unwrap();
            assert_eq!(next.interval_days, 1);
            assert_eq!(next.repetitions, 1);
        }
    }

    #[test]
    fn second_pass_schedules_six_days() {
        for quality in PASS_QUALITY..=MAX_QUALITY {
            let next = compute_next_review(quality, 1, 2.5, 1).unwrap();
            assert_eq!(next.interval_days, 6);
            assert_eq!(next.repetitions, 2);
        }
    }

    #[test]
    fn later_passes_grow_by_ease_factor() {
        let next = compute_next_review(5, 2, 2.5, 6).unwrap();
        assert_eq!(next.interval_days, 15); // ceil(6 * 2.5)
        assert_eq!(next.repetitions, 3);
        assert_close(next.ease_factor, 2.6); // 2.5 + 0.1, no penalty at quality 5
    }

    #[test]
    fn failure_resets_regardless_of_prior_state() {
        for quality in 0..PASS_QUALITY {
            let next = compute_next_review(quality, 7, 2.8, 120).unwrap();
            assert_eq!(next.interval_days, 1);
            assert_eq!(next.repetitions, 0);
        }
    }

    #[test]
    fn failure_applies_ease_penalty() {
        let next = compute_next_review(1, 3, 2.0, 15).unwrap();
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetitions, 0);
        // 2.0 + 0.1 - 4 * (0.08 + 4 * 0.02) = 1.46
        assert_close(next.ease_factor, 1.46);
    }

    #[test]
    fn ease_factor_never_drops_below_minimum() {
        for quality in 0..=MAX_QUALITY {
            for _ in 0..3 {
                let next = compute_next_review(quality, 0, MIN_EASE_FACTOR, 1).unwrap();
                assert!(next.ease_factor >= MIN_EASE_FACTOR);
            }
        }
        // Worst case from the floor: quality 0 on an already-minimal item.
        let next = compute_next_review(0, 5, MIN_EASE_FACTOR, 30).unwrap();
        assert_close(next.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn boundary_quality_counts_as_pass() {
        let next = compute_next_review(PASS_QUALITY, 0, 2.5, 1).unwrap();
        assert_eq!(next.repetitions, 1);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let err = compute_next_review(6, 0, 2.5, 1).unwrap_err();
        assert_eq!(err, InvalidQuality { quality: 6 });
        assert!(compute_next_review(200, 3, 2.5, 10).is_err());
    }

    #[test]
    fn interval_stays_at_least_one_day() {
        // Minimal ease on a long streak still produces a growing interval.
        let next = compute_next_review(3, 4, MIN_EASE_FACTOR, 1).unwrap();
        assert!(next.interval_days >= 1);
        assert_eq!(next.interval_days, 2); // ceil(1 * 1.3)
    }
}
