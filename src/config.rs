//! Engine tuning knobs.
//!
//! Defaults match the production values the detector thresholds were tuned
//! against. Loadable from JSON (camelCase, per-field defaults) so an
//! embedding app can ship overrides without recompiling.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::EngineConfigError;

/// Maximum number of signals retained per session (FIFO eviction).
pub const DEFAULT_BUFFER_CAPACITY: usize = 100;

/// Trailing window of signals considered during evaluation, in minutes.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 10;

/// Minimum gap between two emitted nudges, in minutes. Applies across all
/// detectors.
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 5;

/// Upper bound for the duration fields, in minutes (one year). Values past
/// this are configuration mistakes, and `chrono::Duration::minutes` panics
/// long before i64::MAX.
pub const MAX_DURATION_MINUTES: i64 = 60 * 24 * 365;

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_lookback_minutes() -> i64 {
    DEFAULT_LOOKBACK_MINUTES
}

fn default_cooldown_minutes() -> i64 {
    DEFAULT_COOLDOWN_MINUTES
}

/// Per-engine configuration. One instance per learner session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            lookback_minutes: DEFAULT_LOOKBACK_MINUTES,
            cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot operate under.
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.buffer_capacity == 0 {
            return Err(EngineConfigError::ZeroBufferCapacity);
        }
        if self.lookback_minutes <= 0 {
            return Err(EngineConfigError::NonPositiveLookback(self.lookback_minutes));
        }
        if self.lookback_minutes > MAX_DURATION_MINUTES {
            return Err(EngineConfigError::LookbackTooLong(self.lookback_minutes));
        }
        if self.cooldown_minutes <= 0 {
            return Err(EngineConfigError::NonPositiveCooldown(self.cooldown_minutes));
        }
        if self.cooldown_minutes > MAX_DURATION_MINUTES {
            return Err(EngineConfigError::CooldownTooLong(self.cooldown_minutes));
        }
        Ok(())
    }

    /// Lookback window as a duration.
    pub fn lookback(&self) -> Duration {
        Duration::minutes(self.lookback_minutes)
    }

    /// Cooldown gap as a duration.
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.cooldown_minutes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
