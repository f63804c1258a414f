//! StudyPulse: a proactive behavioral-intervention engine.
//!
//! Consumes a stream of low-level behavioral telemetry about one learner
//! (hesitation, error bursts, frustration, disengagement, confidence
//! mismatch, idle time, overdue reviews, streak risk, plateaued progress)
//! and decides whether, what, and how urgently to surface an unsolicited
//! suggestion — a nudge — without being asked.
//!
//! The pipeline, leaves first: a bounded [`buffer::SignalBuffer`] holds the
//! recent window of signals; the [`detectors`] registry evaluates it as a
//! fixed-precedence rule list; the [`engine::NudgeEngine`] gates candidates
//! through a global cooldown and tracks accepted nudges through the
//! [`lifecycle::NudgeStore`] (pending → delivered → responded/dismissed, or
//! silent expiry). Everything is synchronous in-memory computation — no
//! I/O, no timers, no panics on malformed input.
//!
//! One engine per learner session, owned by the caller. For processes
//! serving many sessions, [`registry::SessionRegistry`] hands out one
//! locked engine per session id.

pub mod buffer;
pub mod config;
pub mod detectors;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod types;

pub use config::EngineConfig;
pub use detectors::{default_detectors, CandidateNudge, Detector, DetectorFn};
pub use engine::NudgeEngine;
pub use error::EngineConfigError;
pub use registry::SessionRegistry;
pub use types::{
    BehaviorSignal, Nudge, NudgeKind, NudgePriority, SignalKind, SuggestedAction,
};
