//! Progress rules applied after every answer.
//!
//! Pure: callers load the prior record, apply an attempt and persist the
//! result themselves.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Thresholds;
use crate::models::{MasteryLevel, ProgressRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptResult {
    pub correct_answers: u32,
    pub total_attempts: u32,
    pub streak: u32,
    pub accuracy: f64,
    pub mastery_level: MasteryLevel,
    pub needs_review: bool,
    pub last_studied: DateTime<Utc>,
}

impl AttemptResult {
    pub fn into_record(self, user_id: &str, flashcard_id: i64) -> ProgressRecord {
        ProgressRecord {
            user_id: user_id.to_string(),
            flashcard_id,
            correct_answers: self.correct_answers,
            total_attempts: self.total_attempts,
            streak: self.streak,
            last_studied: self.last_studied,
            needs_review: self.needs_review,
            mastery_level: self.mastery_level,
        }
    }
}

pub fn apply_attempt(
    prior: Option<&ProgressRecord>,
    correct: bool,
    now: DateTime<Utc>,
    thresholds: &Thresholds,
) -> AttemptResult {
    let (prior_correct, prior_attempts, prior_streak) = prior
        .map(|p| (p.correct_answers, p.total_attempts, p.streak))
        .unwrap_or((0, 0, 0));

    let correct_answers = if correct {
        prior_correct + 1
    } else {
        prior_correct
    };
    let total_attempts = prior_attempts + 1;
    let streak = if correct { prior_streak + 1 } else { 0 };
    let accuracy = accuracy(correct_answers, total_attempts);

    AttemptResult {
        correct_answers,
        total_attempts,
        streak,
        accuracy,
        mastery_level: mastery_for(accuracy, total_attempts, thresholds),
        needs_review: !correct || accuracy < thresholds.review_accuracy,
        last_studied: now,
    }
}

pub fn accuracy(correct_answers: u32, total_attempts: u32) -> f64 {
    if total_attempts == 0 {
        0.0
    } else {
        correct_answers as f64 / total_attempts as f64
    }
}

// First matching tier wins
pub fn mastery_for(accuracy: f64, total_attempts: u32, t: &Thresholds) -> MasteryLevel {
    if accuracy >= t.mastered_accuracy && total_attempts >= t.mastered_attempts {
        MasteryLevel::Mastered
    } else if accuracy >= t.advanced_accuracy && total_attempts >= t.advanced_attempts {
        MasteryLevel::Advanced
    } else if accuracy >= t.intermediate_accuracy && total_attempts >= t.intermediate_attempts {
        MasteryLevel::Intermediate
    } else {
        MasteryLevel::Beginner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    fn prior(correct: u32, attempts: u32, streak: u32) -> ProgressRecord {
        ProgressRecord {
            user_id: "ana".to_string(),
            flashcard_id: 1,
            correct_answers: correct,
            total_attempts: attempts,
            streak,
            last_studied: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            needs_review: false,
            mastery_level: MasteryLevel::Beginner,
        }
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn third_correct_answer_reaches_mastered() {
            let t = Thresholds::default();
            let r = apply_attempt(Some(&prior(2, 2, 2)), true, now(), &t);

            assert_eq!(r.correct_answers, 3);
            assert_eq!(r.total_attempts, 3);
            assert_eq!(r.streak, 3);
            assert_eq!(r.accuracy, 1.0);
            assert_eq!(r.mastery_level, MasteryLevel::Mastered);
            assert!(!r.needs_review);
            assert_eq!(r.last_studied, now());
        }

        #[test]
        fn first_attempt_incorrect() {
            let t = Thresholds::default();
            let r = apply_attempt(None, false, now(), &t);

            assert_eq!(r.correct_answers, 0);
            assert_eq!(r.total_attempts, 1);
            assert_eq!(r.streak, 0);
            assert_eq!(r.accuracy, 0.0);
            assert_eq!(r.mastery_level, MasteryLevel::Beginner);
            assert!(r.needs_review);
        }

        #[test]
        fn first_attempt_correct_stays_beginner() {
            // one attempt is below every tier's minimum
            let r = apply_attempt(None, true, now(), &Thresholds::default());
            assert_eq!(r.mastery_level, MasteryLevel::Beginner);
            assert!(!r.needs_review);
            assert_eq!(r.streak, 1);
        }
    }

    mod counter_tests {
        use super::*;

        #[test]
        fn correct_answer_increments_streak_and_count() {
            let t = Thresholds::default();
            for (c, a, s) in [(0, 0, 0), (3, 5, 1), (10, 40, 7)] {
                let r = apply_attempt(Some(&prior(c, a, s)), true, now(), &t);
                assert_eq!(r.streak, s + 1);
                assert_eq!(r.correct_answers, c + 1);
                assert_eq!(r.total_attempts, a + 1);
            }
        }

        #[test]
        fn incorrect_answer_resets_streak() {
            let t = Thresholds::default();
            for (c, a, s) in [(0, 0, 0), (3, 5, 1), (40, 40, 40)] {
                let r = apply_attempt(Some(&prior(c, a, s)), false, now(), &t);
                assert_eq!(r.streak, 0);
                assert_eq!(r.correct_answers, c);
                assert_eq!(r.total_attempts, a + 1);
            }
        }

        #[test]
        fn incorrect_always_needs_review() {
            let t = Thresholds::default();
            let r = apply_attempt(Some(&prior(99, 99, 99)), false, now(), &t);
            assert!(r.accuracy > 0.98);
            assert!(r.needs_review);
        }

        #[test]
        fn low_accuracy_needs_review_even_when_correct() {
            let t = Thresholds::default();
            // 2 / 4 = 0.5 < 0.7
            let r = apply_attempt(Some(&prior(1, 3, 0)), true, now(), &t);
            assert_eq!(r.accuracy, 0.5);
            assert!(r.needs_review);
        }
    }

    mod mastery_tests {
        use super::*;

        #[test]
        fn tiers_follow_precedence() {
            let t = Thresholds::default();
            assert_eq!(mastery_for(0.90, 3, &t), MasteryLevel::Mastered);
            assert_eq!(mastery_for(0.90, 2, &t), MasteryLevel::Advanced);
            assert_eq!(mastery_for(0.75, 2, &t), MasteryLevel::Advanced);
            assert_eq!(mastery_for(0.74, 10, &t), MasteryLevel::Intermediate);
            assert_eq!(mastery_for(0.50, 2, &t), MasteryLevel::Intermediate);
            assert_eq!(mastery_for(0.49, 10, &t), MasteryLevel::Beginner);
            assert_eq!(mastery_for(1.0, 1, &t), MasteryLevel::Beginner);
        }

        #[test]
        fn monotonic_in_accuracy_for_fixed_attempts() {
            let t = Thresholds::default();
            for attempts in 3..12u32 {
                let mut last = MasteryLevel::Beginner;
                for correct in 0..=attempts {
                    let level = mastery_for(accuracy(correct, attempts), attempts, &t);
                    assert!(level >= last, "{}/{} dropped tier", correct, attempts);
                    last = level;
                }
            }
        }

        #[test]
        fn custom_thresholds_are_honoured() {
            let t = Thresholds {
                mastered_accuracy: 1.0,
                mastered_attempts: 5,
                ..Thresholds::default()
            };
            assert_eq!(mastery_for(1.0, 4, &t), MasteryLevel::Advanced);
            assert_eq!(mastery_for(1.0, 5, &t), MasteryLevel::Mastered);
        }
    }

    #[test]
    fn accuracy_guards_zero_attempts() {
        assert_eq!(accuracy(0, 0), 0.0);
    }

    #[test]
    fn into_record_keeps_result_fields() {
        let r = apply_attempt(None, true, now(), &Thresholds::default());
        let record = r.clone().into_record("ana", 42);
        assert_eq!(record.user_id, "ana");
        assert_eq!(record.flashcard_id, 42);
        assert_eq!(record.total_attempts, r.total_attempts);
        assert_eq!(record.mastery_level, r.mastery_level);
        assert_eq!(record.last_studied, now());
    }
}
