//! Decay scoring — the "forgotten-ness" metric driving resurfacing order
//!
//! Formula: days_since_save × (1 − engagement), rounded to 2 decimals.
//!
//!   0.0          = fresh or fully engaged, nothing to resurface
//!   growing      = old and unused, resurface candidate
//!
//! Engagement is clamped to [0, 1]; a `created_at` in the future clamps the
//! day count to 0 so the score can never go negative.

use chrono::{DateTime, Utc};

/// Compute the decay score for a save as of `now`.
/// Pure function — no side effects, no failure modes.
pub fn decay_score_at(
    created_at: DateTime<Utc>,
    engagement_score: f64,
    now: DateTime<Utc>,
) -> f64 {
    let days_since_save = (now - created_at).num_days().max(0) as f64;
    let engagement = engagement_score.clamp(0.0, 1.0);
    let decay = days_since_save * (1.0 - engagement);
    (decay * 100.0).round() / 100.0
}

/// Compute the decay score for a save as of the current time.
pub fn decay_score(created_at: DateTime<Utc>, engagement_score: f64) -> f64 {
    decay_score_at(created_at, engagement_score, Utc::now())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_save_scores_zero() {
        let now = Utc::now();
        assert_eq!(decay_score_at(now, 0.0, now), 0.0);
        assert_eq!(decay_score_at(now, 1.0, now), 0.0);
    }

    #[test]
    fn test_ten_days_no_engagement_scores_ten() {
        let now = Utc::now();
        let created = now - Duration::days(10);
        assert_eq!(decay_score_at(created, 0.0, now), 10.0);
    }

    #[test]
    fn test_full_engagement_always_scores_zero() {
        let now = Utc::now();
        let created = now - Duration::days(365);
        assert_eq!(decay_score_at(created, 1.0, now), 0.0);
    }

    #[test]
    fn test_engagement_clamped_below_zero() {
        let now = Utc::now();
        let created = now - Duration::days(7);
        assert_eq!(
            decay_score_at(created, -5.0, now),
            decay_score_at(created, 0.0, now)
        );
    }

    #[test]
    fn test_engagement_clamped_above_one() {
        let now = Utc::now();
        let created = now - Duration::days(7);
        assert_eq!(
            decay_score_at(created, 5.0, now),
            decay_score_at(created, 1.0, now)
        );
    }

    #[test]
    fn test_one_day_partial_engagement_rounds_to_two_decimals() {
        let now = Utc::now();
        let created = now - Duration::days(1);
        assert_eq!(decay_score_at(created, 0.8, now), 0.20);
    }

    #[test]
    fn test_future_created_at_clamps_to_zero() {
        let now = Utc::now();
        let created = now + Duration::days(3);
        assert_eq!(decay_score_at(created, 0.0, now), 0.0);
    }

    #[test]
    fn test_partial_days_truncate() {
        let now = Utc::now();
        // 47 hours is 1 whole day
        let created = now - Duration::hours(47);
        assert_eq!(decay_score_at(created, 0.0, now), 1.0);
    }

    #[test]
    fn test_score_is_never_negative() {
        let now = Utc::now();
        for days in [-10i64, 0, 1, 100] {
            for engagement in [-2.0, 0.0, 0.5, 1.0, 3.0] {
                let created = now - Duration::days(days);
                assert!(decay_score_at(created, engagement, now) >= 0.0);
            }
        }
    }
}
