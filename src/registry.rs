//! Per-session engine ownership for service deployments.
//!
//! The engine itself is single-owner and holds no locks. When one process
//! serves many learner sessions, each session needs exactly one engine
//! behind exactly one lock — this registry provides that wiring:
//! get-or-create on first signal, drop on session end. Engines never share
//! state; the registry only owns them.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::detectors::default_detectors;
use crate::engine::NudgeEngine;
use crate::error::EngineConfigError;

/// Owns one [`NudgeEngine`] per active learner session.
pub struct SessionRegistry {
    engines: DashMap<String, Arc<Mutex<NudgeEngine>>>,
    config: EngineConfig,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Registry whose engines use production defaults.
    pub fn new() -> Self {
        Self {
            engines: DashMap::new(),
            config: EngineConfig::default(),
        }
    }

    /// Registry whose engines share a custom configuration. Validated once
    /// here, so per-session creation is infallible.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self {
            engines: DashMap::new(),
            config,
        })
    }

    /// The engine for `session_id`, created on first use. Callers lock the
    /// returned handle for the duration of each operation.
    pub fn engine(&self, session_id: &str) -> Arc<Mutex<NudgeEngine>> {
        self.engines
            .entry(session_id.to_string())
            .or_insert_with(|| {
                log::debug!("creating nudge engine for session {}", session_id);
                Arc::new(Mutex::new(NudgeEngine::build(
                    self.config.clone(),
                    default_detectors(),
                )))
            })
            .clone()
    }

    /// Drop the engine for a finished session. Returns false if the
    /// session was unknown. In-flight holders of the `Arc` keep their
    /// handle; the registry just stops tracking it.
    pub fn end_session(&self, session_id: &str) -> bool {
        self.engines.remove(session_id).is_some()
    }

    /// Ids of all sessions with a live engine.
    pub fn session_ids(&self) -> Vec<String> {
        self.engines.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
