//! Behavioral pattern detectors.
//!
//! Each detector is a pure function over the windowed signal slice that
//! returns at most one candidate nudge. Detectors do no I/O and hold no
//! state — temporal logic lives in the buffer and the engine.
//!
//! [`default_detectors`] returns the registry in precedence order. The
//! engine runs the list top to bottom and takes the first candidate, so an
//! earlier detector preempts a later one even when the later one would have
//! carried a higher priority. That ordering is a deliberate, test-visible
//! contract — reorder with care.

use chrono::Duration;
use serde_json::json;

use crate::types::{BehaviorSignal, NudgeKind, NudgePriority, SignalKind, SuggestedAction};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A fully-formed nudge candidate, minus the identity the engine assigns on
/// acceptance. Expiry is relative — the engine resolves it against "now"
/// when the candidate is accepted, not when the detector ran.
#[derive(Debug, Clone)]
pub struct CandidateNudge {
    pub kind: NudgeKind,
    pub priority: NudgePriority,
    pub message: String,
    pub detailed_message: Option<String>,
    pub suggested_action: Option<SuggestedAction>,
    pub trigger_signals: Vec<SignalKind>,
    pub expires_in: Duration,
}

/// Function signature for a detector.
pub type DetectorFn = fn(&[&BehaviorSignal]) -> Option<CandidateNudge>;

/// A named detector in the precedence list.
pub struct Detector {
    pub name: &'static str,
    pub detect: DetectorFn,
}

/// The built-in detector set, in precedence order (first match wins).
pub fn default_detectors() -> Vec<Detector> {
    vec![
        Detector { name: "hesitation", detect: detect_hesitation },
        Detector { name: "error_streak", detect: detect_error_streak },
        Detector { name: "frustration", detect: detect_frustration },
        Detector { name: "engagement_drop", detect: detect_engagement_drop },
        Detector { name: "confidence_divergence", detect: detect_confidence_divergence },
        Detector { name: "procrastination", detect: detect_procrastination },
        Detector { name: "review_overdue", detect: detect_review_overdue },
        Detector { name: "streak_at_risk", detect: detect_streak_at_risk },
        Detector { name: "mastery_plateau", detect: detect_mastery_plateau },
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Count windowed signals of `kind` with intensity strictly above `floor`.
fn count_over(window: &[&BehaviorSignal], kind: SignalKind, floor: f64) -> usize {
    window
        .iter()
        .filter(|signal| signal.kind == kind && signal.intensity > floor)
        .count()
}

/// First windowed signal of `kind` with intensity strictly above `floor`.
fn first_over<'a>(
    window: &[&'a BehaviorSignal],
    kind: SignalKind,
    floor: f64,
) -> Option<&'a BehaviorSignal> {
    window
        .iter()
        .find(|signal| signal.kind == kind && signal.intensity > floor)
        .copied()
}

/// First windowed signal of `kind`, any intensity.
fn first_of<'a>(window: &[&'a BehaviorSignal], kind: SignalKind) -> Option<&'a BehaviorSignal> {
    window.iter().find(|signal| signal.kind == kind).copied()
}

// ---------------------------------------------------------------------------
// Detector 1: Hesitation
// ---------------------------------------------------------------------------

/// ≥3 hesitation signals above 0.6 → suggest a different practice mode.
pub fn detect_hesitation(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    let count = count_over(window, SignalKind::Hesitation, 0.6);
    if count < 3 {
        return None;
    }

    Some(CandidateNudge {
        kind: NudgeKind::TryDifferentMode,
        priority: NudgePriority::Medium,
        message: "Feeling stuck? A different practice mode might help.".to_string(),
        detailed_message: Some(format!(
            "You've paused {} times in the last few minutes. Switching to flashcards \
             or a worked example often gets things moving again.",
            count
        )),
        suggested_action: Some(SuggestedAction {
            label: "Switch mode".to_string(),
            action: "switch_mode".to_string(),
            data: None,
        }),
        trigger_signals: vec![SignalKind::Hesitation],
        expires_in: Duration::minutes(10),
    })
}

// ---------------------------------------------------------------------------
// Detector 2: Error streak
// ---------------------------------------------------------------------------

/// ≥2 error_streak signals above 0.5 → likely shared misconception.
pub fn detect_error_streak(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    if count_over(window, SignalKind::ErrorStreak, 0.5) < 2 {
        return None;
    }

    Some(CandidateNudge {
        kind: NudgeKind::MisconceptionAlert,
        priority: NudgePriority::High,
        message: "These errors look related — there may be one idea worth untangling."
            .to_string(),
        detailed_message: Some(
            "Several recent answers missed in the same way. A short review of the \
             underlying concept usually fixes the whole cluster at once."
                .to_string(),
        ),
        suggested_action: Some(SuggestedAction {
            label: "Review the concept".to_string(),
            action: "open_concept_review".to_string(),
            data: None,
        }),
        trigger_signals: vec![SignalKind::ErrorStreak],
        expires_in: Duration::minutes(15),
    })
}

// ---------------------------------------------------------------------------
// Detector 3: Frustration
// ---------------------------------------------------------------------------

/// ≥2 frustration signals above 0.7 → suggest a short break. Short expiry:
/// a break suggestion is stale within minutes.
pub fn detect_frustration(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    if count_over(window, SignalKind::Frustration, 0.7) < 2 {
        return None;
    }

    Some(CandidateNudge {
        kind: NudgeKind::TakeBreak,
        priority: NudgePriority::High,
        message: "This seems frustrating. A short break often helps more than pushing through."
            .to_string(),
        detailed_message: None,
        suggested_action: Some(SuggestedAction {
            label: "Take a 5-minute break".to_string(),
            action: "take_break".to_string(),
            data: Some(json!({ "minutes": 5 })),
        }),
        trigger_signals: vec![SignalKind::Frustration],
        expires_in: Duration::minutes(5),
    })
}

// ---------------------------------------------------------------------------
// Detector 4: Engagement drop
// ---------------------------------------------------------------------------

/// ≥1 engagement_drop signal above 0.5 → offer a change of pace.
pub fn detect_engagement_drop(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    first_over(window, SignalKind::EngagementDrop, 0.5)?;

    Some(CandidateNudge {
        kind: NudgeKind::ReEngage,
        priority: NudgePriority::Low,
        message: "Want to try something different?".to_string(),
        detailed_message: Some(
            "Your activity has tapered off. A quick challenge or a new topic can \
             re-spark the session."
                .to_string(),
        ),
        suggested_action: Some(SuggestedAction {
            label: "Show me something new".to_string(),
            action: "suggest_activity".to_string(),
            data: None,
        }),
        trigger_signals: vec![SignalKind::EngagementDrop],
        expires_in: Duration::minutes(10),
    })
}

// ---------------------------------------------------------------------------
// Detector 5: Confidence divergence
// ---------------------------------------------------------------------------

/// ≥1 confidence_divergence signal above 0.6. Branches on metadata:
/// `studentConfidence > aiConfidence` means overconfidence → reality check;
/// otherwise (including missing metadata) → encouragement.
pub fn detect_confidence_divergence(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    let signal = first_over(window, SignalKind::ConfidenceDivergence, 0.6)?;

    let student = signal.metadata_f64("studentConfidence");
    let ai = signal.metadata_f64("aiConfidence");
    let overconfident = matches!((student, ai), (Some(s), Some(a)) if s > a);

    if overconfident {
        Some(CandidateNudge {
            kind: NudgeKind::ConfidenceCheck,
            priority: NudgePriority::Medium,
            message: "You may be more confident than your recent accuracy supports."
                .to_string(),
            detailed_message: Some(
                "Your self-rating is running ahead of your results here. A short \
                 check quiz will show whether the gap is real."
                    .to_string(),
            ),
            suggested_action: Some(SuggestedAction {
                label: "Take a quick check".to_string(),
                action: "start_check_quiz".to_string(),
                data: None,
            }),
            trigger_signals: vec![SignalKind::ConfidenceDivergence],
            expires_in: Duration::minutes(10),
        })
    } else {
        Some(CandidateNudge {
            kind: NudgeKind::Encouragement,
            priority: NudgePriority::Medium,
            message: "You're doing better than you think.".to_string(),
            detailed_message: Some(
                "Your accuracy is ahead of your self-rating. Trust the results."
                    .to_string(),
            ),
            suggested_action: None,
            trigger_signals: vec![SignalKind::ConfidenceDivergence],
            expires_in: Duration::minutes(15),
        })
    }
}

// ---------------------------------------------------------------------------
// Detector 6: Procrastination
// ---------------------------------------------------------------------------

/// ≥1 procrastination signal above 0.5 → lower the activation barrier.
pub fn detect_procrastination(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    first_over(window, SignalKind::Procrastination, 0.5)?;

    Some(CandidateNudge {
        kind: NudgeKind::StartSmall,
        priority: NudgePriority::Low,
        message: "Starting is the hardest part — try just one quick question.".to_string(),
        detailed_message: None,
        suggested_action: Some(SuggestedAction {
            label: "One question".to_string(),
            action: "start_micro_session".to_string(),
            data: Some(json!({ "questions": 1 })),
        }),
        trigger_signals: vec![SignalKind::Procrastination],
        expires_in: Duration::minutes(30),
    })
}

// ---------------------------------------------------------------------------
// Detector 7: Review overdue
// ---------------------------------------------------------------------------

/// ≥1 review_overdue signal, any intensity. Escalates to high priority
/// when `overdueCount` > 5; missing metadata falls back to medium.
pub fn detect_review_overdue(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    let signal = first_of(window, SignalKind::ReviewOverdue)?;

    let overdue = signal.metadata_i64("overdueCount");
    let priority = match overdue {
        Some(n) if n > 5 => NudgePriority::High,
        _ => NudgePriority::Medium,
    };
    let message = match overdue {
        Some(n) => format!("{} reviews are overdue — a quick session keeps them fresh.", n),
        None => "You have reviews waiting — a quick session keeps them fresh.".to_string(),
    };

    Some(CandidateNudge {
        kind: NudgeKind::ReviewReminder,
        priority,
        message,
        detailed_message: Some(
            "Spaced review works best when items are caught close to their due date. \
             The longer they sit, the more relearning it takes."
                .to_string(),
        ),
        suggested_action: Some(SuggestedAction {
            label: "Start review".to_string(),
            action: "start_review".to_string(),
            data: overdue.map(|n| json!({ "overdueCount": n })),
        }),
        trigger_signals: vec![SignalKind::ReviewOverdue],
        expires_in: Duration::minutes(60),
    })
}

// ---------------------------------------------------------------------------
// Detector 8: Streak at risk
// ---------------------------------------------------------------------------

/// ≥1 streak_at_risk signal, any intensity. Escalates to high priority when
/// `currentStreak` > 7; missing metadata falls back to medium.
pub fn detect_streak_at_risk(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    let signal = first_of(window, SignalKind::StreakAtRisk)?;

    let streak = signal.metadata_i64("currentStreak");
    let priority = match streak {
        Some(n) if n > 7 => NudgePriority::High,
        _ => NudgePriority::Medium,
    };
    let message = match streak {
        Some(n) => format!(
            "Your {}-day streak is about to break — one exercise keeps it alive.",
            n
        ),
        None => "Your streak is about to break — one exercise keeps it alive.".to_string(),
    };

    Some(CandidateNudge {
        kind: NudgeKind::StreakReminder,
        priority,
        message,
        detailed_message: None,
        suggested_action: Some(SuggestedAction {
            label: "Keep the streak".to_string(),
            action: "quick_exercise".to_string(),
            data: streak.map(|n| json!({ "currentStreak": n })),
        }),
        trigger_signals: vec![SignalKind::StreakAtRisk],
        expires_in: Duration::minutes(120),
    })
}

// ---------------------------------------------------------------------------
// Detector 9: Mastery plateau
// ---------------------------------------------------------------------------

/// ≥1 mastery_plateau signal above 0.5 → suggest harder material.
pub fn detect_mastery_plateau(window: &[&BehaviorSignal]) -> Option<CandidateNudge> {
    first_over(window, SignalKind::MasteryPlateau, 0.5)?;

    Some(CandidateNudge {
        kind: NudgeKind::ChallengeSuggestion,
        priority: NudgePriority::Medium,
        message: "Your progress here has leveled off — ready for harder material?".to_string(),
        detailed_message: Some(
            "Accuracy has been flat at this difficulty for a while. Stepping up is \
             usually what restarts improvement."
                .to_string(),
        ),
        suggested_action: Some(SuggestedAction {
            label: "Raise the difficulty".to_string(),
            action: "raise_difficulty".to_string(),
            data: None,
        }),
        trigger_signals: vec![SignalKind::MasteryPlateau],
        expires_in: Duration::minutes(20),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::BehaviorSignal;

    fn signals(entries: &[(SignalKind, f64)]) -> Vec<BehaviorSignal> {
        let now = Utc::now();
        entries
            .iter()
            .map(|(kind, intensity)| BehaviorSignal::at(*kind, *intensity, now))
            .collect()
    }

    fn window(owned: &[BehaviorSignal]) -> Vec<&BehaviorSignal> {
        owned.iter().collect()
    }

    #[test]
    fn test_registry_order_is_the_documented_precedence() {
        let names: Vec<&str> = default_detectors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "hesitation",
                "error_streak",
                "frustration",
                "engagement_drop",
                "confidence_divergence",
                "procrastination",
                "review_overdue",
                "streak_at_risk",
                "mastery_plateau",
            ]
        );
    }

    #[test]
    fn test_hesitation_needs_three_qualifying_signals() {
        let two = signals(&[(SignalKind::Hesitation, 0.7), (SignalKind::Hesitation, 0.9)]);
        assert!(detect_hesitation(&window(&two)).is_none());

        let three = signals(&[
            (SignalKind::Hesitation, 0.7),
            (SignalKind::Hesitation, 0.9),
            (SignalKind::Hesitation, 0.61),
        ]);
        let nudge = detect_hesitation(&window(&three)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::TryDifferentMode);
        assert_eq!(nudge.priority, NudgePriority::Medium);
        assert_eq!(nudge.expires_in, Duration::minutes(10));
        assert_eq!(nudge.trigger_signals, vec![SignalKind::Hesitation]);
    }

    #[test]
    fn test_intensity_threshold_is_strict() {
        // Exactly 0.6 does not count toward the hesitation threshold.
        let at_floor = signals(&[
            (SignalKind::Hesitation, 0.6),
            (SignalKind::Hesitation, 0.6),
            (SignalKind::Hesitation, 0.6),
        ]);
        assert!(detect_hesitation(&window(&at_floor)).is_none());
    }

    #[test]
    fn test_unrelated_signals_do_not_count() {
        let mixed = signals(&[
            (SignalKind::Frustration, 0.9),
            (SignalKind::Frustration, 0.9),
            (SignalKind::Hesitation, 0.9),
        ]);
        assert!(detect_hesitation(&window(&mixed)).is_none());
    }

    #[test]
    fn test_error_streak_fires_high_priority() {
        let owned = signals(&[(SignalKind::ErrorStreak, 0.6), (SignalKind::ErrorStreak, 0.51)]);
        let nudge = detect_error_streak(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::MisconceptionAlert);
        assert_eq!(nudge.priority, NudgePriority::High);
        assert_eq!(nudge.expires_in, Duration::minutes(15));
    }

    #[test]
    fn test_frustration_needs_two_above_point_seven() {
        let weak = signals(&[(SignalKind::Frustration, 0.7), (SignalKind::Frustration, 0.7)]);
        assert!(detect_frustration(&window(&weak)).is_none());

        let strong = signals(&[(SignalKind::Frustration, 0.71), (SignalKind::Frustration, 0.8)]);
        let nudge = detect_frustration(&window(&strong)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::TakeBreak);
        assert_eq!(nudge.expires_in, Duration::minutes(5));
    }

    #[test]
    fn test_engagement_drop_single_signal() {
        let owned = signals(&[(SignalKind::EngagementDrop, 0.6)]);
        let nudge = detect_engagement_drop(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::ReEngage);
        assert_eq!(nudge.priority, NudgePriority::Low);
    }

    #[test]
    fn test_confidence_divergence_overconfident_branch() {
        let signal = BehaviorSignal::new(SignalKind::ConfidenceDivergence, 0.8)
            .with_metadata("studentConfidence", json!(0.9))
            .with_metadata("aiConfidence", json!(0.5));
        let owned = vec![signal];

        let nudge = detect_confidence_divergence(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::ConfidenceCheck);
        assert_eq!(nudge.expires_in, Duration::minutes(10));
    }

    #[test]
    fn test_confidence_divergence_underconfident_branch() {
        let signal = BehaviorSignal::new(SignalKind::ConfidenceDivergence, 0.8)
            .with_metadata("studentConfidence", json!(0.3))
            .with_metadata("aiConfidence", json!(0.8));
        let owned = vec![signal];

        let nudge = detect_confidence_divergence(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::Encouragement);
        assert_eq!(nudge.expires_in, Duration::minutes(15));
    }

    #[test]
    fn test_confidence_divergence_missing_metadata_encourages() {
        let owned = signals(&[(SignalKind::ConfidenceDivergence, 0.7)]);
        let nudge = detect_confidence_divergence(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::Encouragement);
    }

    #[test]
    fn test_review_overdue_escalates_on_count() {
        let mild = BehaviorSignal::new(SignalKind::ReviewOverdue, 0.2)
            .with_metadata("overdueCount", json!(3));
        let owned = vec![mild];
        let nudge = detect_review_overdue(&window(&owned)).expect("should fire");
        assert_eq!(nudge.priority, NudgePriority::Medium);
        assert!(nudge.message.contains("3 reviews"));

        let heavy = BehaviorSignal::new(SignalKind::ReviewOverdue, 0.2)
            .with_metadata("overdueCount", json!(9));
        let owned = vec![heavy];
        let nudge = detect_review_overdue(&window(&owned)).expect("should fire");
        assert_eq!(nudge.priority, NudgePriority::High);
    }

    #[test]
    fn test_review_overdue_ignores_intensity_and_missing_count() {
        // Fires at any intensity, and degrades to a generic message at
        // medium priority without metadata.
        let owned = signals(&[(SignalKind::ReviewOverdue, 0.0)]);
        let nudge = detect_review_overdue(&window(&owned)).expect("should fire");
        assert_eq!(nudge.priority, NudgePriority::Medium);
        assert!(nudge.message.contains("reviews waiting"));
        assert!(nudge.suggested_action.unwrap().data.is_none());
    }

    #[test]
    fn test_streak_at_risk_message_embeds_streak_length() {
        let signal = BehaviorSignal::new(SignalKind::StreakAtRisk, 0.5)
            .with_metadata("currentStreak", json!(10));
        let owned = vec![signal];

        let nudge = detect_streak_at_risk(&window(&owned)).expect("should fire");
        assert!(nudge.message.contains("10-day streak"), "got: {}", nudge.message);
        assert_eq!(nudge.priority, NudgePriority::High);
        assert_eq!(nudge.expires_in, Duration::minutes(120));
    }

    #[test]
    fn test_streak_at_risk_short_streak_stays_medium() {
        let signal = BehaviorSignal::new(SignalKind::StreakAtRisk, 0.5)
            .with_metadata("currentStreak", json!(7));
        let owned = vec![signal];
        let nudge = detect_streak_at_risk(&window(&owned)).expect("should fire");
        assert_eq!(nudge.priority, NudgePriority::Medium);
    }

    #[test]
    fn test_mastery_plateau_fires_above_half() {
        let owned = signals(&[(SignalKind::MasteryPlateau, 0.51)]);
        let nudge = detect_mastery_plateau(&window(&owned)).expect("should fire");
        assert_eq!(nudge.kind, NudgeKind::ChallengeSuggestion);
        assert_eq!(nudge.expires_in, Duration::minutes(20));

        let weak = signals(&[(SignalKind::MasteryPlateau, 0.5)]);
        assert!(detect_mastery_plateau(&window(&weak)).is_none());
    }

    #[test]
    fn test_unmatched_kinds_fire_nothing() {
        let owned = signals(&[
            (SignalKind::SuccessStreak, 1.0),
            (SignalKind::TopicSwitch, 1.0),
            (SignalKind::SessionResume, 1.0),
        ]);
        let w = window(&owned);
        for detector in default_detectors() {
            assert!(
                (detector.detect)(&w).is_none(),
                "{} fired on unmatched kinds",
                detector.name
            );
        }
    }
}
