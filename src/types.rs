//! Core data model: behavioral signals in, nudges out.
//!
//! Everything here crosses the API boundary to telemetry producers and the
//! delivery transport, so it all carries serde derives in camelCase.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// Kind of a behavioral telemetry signal.
///
/// Produced by upstream instrumentation (timing, grading, confidence and
/// streak trackers, spaced-repetition scheduling). Kinds with no matching
/// detector are recorded but never trigger a nudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Hesitation,
    ErrorStreak,
    Frustration,
    EngagementDrop,
    ConfidenceDivergence,
    Procrastination,
    ReviewOverdue,
    StreakAtRisk,
    MasteryPlateau,
    SuccessStreak,
    TopicSwitch,
    SessionResume,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Hesitation => "hesitation",
            SignalKind::ErrorStreak => "error_streak",
            SignalKind::Frustration => "frustration",
            SignalKind::EngagementDrop => "engagement_drop",
            SignalKind::ConfidenceDivergence => "confidence_divergence",
            SignalKind::Procrastination => "procrastination",
            SignalKind::ReviewOverdue => "review_overdue",
            SignalKind::StreakAtRisk => "streak_at_risk",
            SignalKind::MasteryPlateau => "mastery_plateau",
            SignalKind::SuccessStreak => "success_streak",
            SignalKind::TopicSwitch => "topic_switch",
            SignalKind::SessionResume => "session_resume",
        }
    }
}

/// A timestamped, intensity-scored unit of behavioral telemetry for one
/// learner. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSignal {
    pub kind: SignalKind,
    /// Signal strength in [0, 1]. Constructors clamp out-of-range values.
    pub intensity: f64,
    pub timestamp: DateTime<Utc>,
    /// Open producer-defined context (e.g. `studentConfidence`, `overdueCount`).
    /// Contents are not validated — detectors read optional fields defensively.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl BehaviorSignal {
    /// Create a signal stamped with the current time.
    pub fn new(kind: SignalKind, intensity: f64) -> Self {
        Self::at(kind, intensity, Utc::now())
    }

    /// Create a signal with an explicit timestamp (producer-side clock).
    pub fn at(kind: SignalKind, intensity: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            intensity: intensity.clamp(0.0, 1.0),
            timestamp,
            metadata: HashMap::new(),
        }
    }

    /// Attach a metadata entry (builder style).
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Read a numeric metadata field, tolerating absence and wrong types.
    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(Value::as_f64)
    }

    /// Read an integer metadata field, tolerating absence and wrong types.
    pub fn metadata_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key).and_then(Value::as_i64)
    }
}

// ---------------------------------------------------------------------------
// Nudges
// ---------------------------------------------------------------------------

/// Kind of a proactive suggestion surfaced to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeKind {
    TryDifferentMode,
    MisconceptionAlert,
    TakeBreak,
    ReEngage,
    ConfidenceCheck,
    Encouragement,
    StartSmall,
    ReviewReminder,
    StreakReminder,
    ChallengeSuggestion,
}

/// Display priority for a nudge. `Urgent` is reserved for embedders with
/// custom detectors — the built-in detector set tops out at `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NudgePriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Optional one-tap action attached to a nudge, so the UI can wire a
/// button without parsing the message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedAction {
    /// Button label shown to the learner.
    pub label: String,
    /// Machine action identifier (e.g. "switch_mode", "start_review").
    pub action: String,
    /// Optional action payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A proactive, unsolicited suggestion tracked through its lifecycle:
/// pending → delivered → responded/dismissed, or silent expiry.
///
/// Identity and content fields are fixed at creation. The four lifecycle
/// fields are each stamped at most once, in lifecycle order, by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nudge {
    pub id: String,
    pub kind: NudgeKind,
    pub priority: NudgePriority,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<SuggestedAction>,
    /// Signal kinds that caused this nudge.
    pub trigger_signals: Vec<SignalKind>,
    /// Fixed at creation, never extended.
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    /// Set alongside `responded_at`: true if the learner dismissed the nudge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<bool>,
}

impl Nudge {
    /// True once the delivery window has lapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
