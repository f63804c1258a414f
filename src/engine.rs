//! The nudge engine: one instance per active learner session.
//!
//! `record_signal` is the single write path: buffer the signal, check the
//! cooldown gate, arbitrate across the detector set, and track the winning
//! candidate through the lifecycle store. Detectors run in registry order
//! and the first candidate wins — severity does not reorder them.
//!
//! Instances share no state and are not safe for concurrent mutation;
//! confine each one to a single owner (see [`crate::registry`] for the
//! multi-session case). Every time-sensitive operation has an `_at`
//! variant taking the evaluation instant explicitly, which is what the
//! tests use; the plain variants read the wall clock.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::buffer::SignalBuffer;
use crate::config::EngineConfig;
use crate::detectors::{default_detectors, CandidateNudge, Detector};
use crate::error::EngineConfigError;
use crate::lifecycle::NudgeStore;
use crate::types::{BehaviorSignal, Nudge};

/// Proactive behavioral-intervention engine for one learner session.
pub struct NudgeEngine {
    config: EngineConfig,
    buffer: SignalBuffer,
    detectors: Vec<Detector>,
    store: NudgeStore,
    /// Creation time of the last emitted nudge, across all detectors.
    last_nudge_at: Option<DateTime<Utc>>,
}

impl Default for NudgeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NudgeEngine {
    /// Engine with production defaults and the built-in detector set.
    pub fn new() -> Self {
        Self::build(EngineConfig::default(), default_detectors())
    }

    /// Engine with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self::build(config, default_detectors()))
    }

    /// Engine with a custom detector list, in precedence order. Intended
    /// for embedders and tests that need mock detectors.
    pub fn with_detectors(
        config: EngineConfig,
        detectors: Vec<Detector>,
    ) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self::build(config, detectors))
    }

    /// Caller guarantees the config is already validated.
    pub(crate) fn build(config: EngineConfig, detectors: Vec<Detector>) -> Self {
        let buffer = SignalBuffer::new(config.buffer_capacity, config.lookback());
        Self {
            config,
            buffer,
            detectors,
            store: NudgeStore::new(),
            last_nudge_at: None,
        }
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    /// Record a signal and re-evaluate. Returns a nudge when a detector
    /// fires and the cooldown allows emission, `None` otherwise.
    pub fn record_signal(&mut self, signal: BehaviorSignal) -> Option<Nudge> {
        self.record_signal_at(signal, Utc::now())
    }

    /// [`Self::record_signal`] with an explicit evaluation instant.
    pub fn record_signal_at(
        &mut self,
        signal: BehaviorSignal,
        now: DateTime<Utc>,
    ) -> Option<Nudge> {
        self.buffer.record(signal);

        // Cooldown gate: while closed, no detector runs at all.
        if !self.cooldown_open(now) {
            log::debug!("cooldown active, skipping evaluation");
            return None;
        }

        let window = self.buffer.windowed(now);
        let (name, candidate) = self.arbitrate(&window)?;
        log::info!(
            "detector {} fired: {:?} at {:?} priority",
            name,
            candidate.kind,
            candidate.priority
        );

        let nudge = finalize(candidate, now);
        self.last_nudge_at = Some(now);
        self.store.push_pending(nudge.clone());
        Some(nudge)
    }

    /// Run the detector set in precedence order and take the first
    /// candidate. Not severity-ranked: an earlier medium-priority detector
    /// preempts a later high-priority one when both qualify.
    fn arbitrate(&self, window: &[&BehaviorSignal]) -> Option<(&'static str, CandidateNudge)> {
        self.detectors
            .iter()
            .find_map(|detector| (detector.detect)(window).map(|c| (detector.name, c)))
    }

    fn cooldown_open(&self, now: DateTime<Utc>) -> bool {
        match self.last_nudge_at {
            Some(last) => now - last >= self.config.cooldown(),
            None => true,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle API (consumed by the delivery transport)
    // -----------------------------------------------------------------------

    /// Pending nudges still inside their delivery window. Expired ones are
    /// dropped as a side effect of this read.
    pub fn pending_nudges(&mut self) -> Vec<Nudge> {
        self.pending_nudges_at(Utc::now())
    }

    /// [`Self::pending_nudges`] with an explicit evaluation instant.
    pub fn pending_nudges_at(&mut self, now: DateTime<Utc>) -> Vec<Nudge> {
        self.store.pending_at(now)
    }

    /// Mark a pending nudge delivered. No-op on unknown ids.
    pub fn deliver_nudge(&mut self, id: &str) {
        self.deliver_nudge_at(id, Utc::now());
    }

    /// [`Self::deliver_nudge`] with an explicit delivery instant.
    pub fn deliver_nudge_at(&mut self, id: &str, now: DateTime<Utc>) {
        self.store.deliver(id, now);
    }

    /// Record the learner's response to a delivered nudge. No-op on
    /// unknown or undelivered ids.
    pub fn respond_to_nudge(&mut self, id: &str, dismissed: bool) {
        self.respond_to_nudge_at(id, dismissed, Utc::now());
    }

    /// [`Self::respond_to_nudge`] with an explicit response instant.
    pub fn respond_to_nudge_at(&mut self, id: &str, dismissed: bool, now: DateTime<Utc>) {
        self.store.respond(id, dismissed, now);
    }

    /// Every nudge delivered over the life of this engine, responded ones
    /// included.
    pub fn delivered_nudges(&self) -> Vec<Nudge> {
        self.store.delivered()
    }

    /// Number of signals currently buffered (windowed or not).
    pub fn signal_count(&self) -> usize {
        self.buffer.len()
    }

    /// Raw pending count without expiry pruning.
    pub fn pending_count(&self) -> usize {
        self.store.pending_len()
    }
}

/// Assign identity and resolve the relative expiry against "now" — the
/// acceptance time, not the detector evaluation time.
fn finalize(candidate: CandidateNudge, now: DateTime<Utc>) -> Nudge {
    Nudge {
        id: format!("nudge-{}", Uuid::new_v4()),
        kind: candidate.kind,
        priority: candidate.priority,
        message: candidate.message,
        detailed_message: candidate.detailed_message,
        suggested_action: candidate.suggested_action,
        trigger_signals: candidate.trigger_signals,
        expires_at: now + candidate.expires_in,
        delivered_at: None,
        responded_at: None,
        dismissed: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
