//! Error types for engine configuration.
//!
//! The runtime core is infallible by design — malformed signals and unknown
//! ids degrade to "no nudge" / no-op. Configuration validation is the one
//! surface that can reject input.

use thiserror::Error;

/// Rejections from [`crate::EngineConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineConfigError {
    #[error("signal buffer capacity must be at least 1")]
    ZeroBufferCapacity,

    #[error("lookback window must be positive, got {0} minutes")]
    NonPositiveLookback(i64),

    #[error("lookback window exceeds one year, got {0} minutes")]
    LookbackTooLong(i64),

    #[error("nudge cooldown must be positive, got {0} minutes")]
    NonPositiveCooldown(i64),

    #[error("nudge cooldown exceeds one year, got {0} minutes")]
    CooldownTooLong(i64),
}
