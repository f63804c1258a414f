//! Bounded, time-windowed store of recent behavioral signals for one
//! learner session.
//!
//! Pure in-memory ring: capacity-bounded with FIFO eviction, evaluation
//! reads the trailing lookback window in insertion order.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};

use crate::types::BehaviorSignal;

/// Fixed-capacity signal ring for one session.
#[derive(Debug)]
pub struct SignalBuffer {
    signals: VecDeque<BehaviorSignal>,
    capacity: usize,
    lookback: Duration,
}

impl SignalBuffer {
    pub fn new(capacity: usize, lookback: Duration) -> Self {
        Self {
            signals: VecDeque::with_capacity(capacity),
            capacity,
            lookback,
        }
    }

    /// Append a signal, evicting the oldest entry when at capacity.
    /// Metadata contents are taken as-is — detectors read them defensively.
    pub fn record(&mut self, signal: BehaviorSignal) {
        if self.signals.len() == self.capacity {
            self.signals.pop_front();
        }
        self.signals.push_back(signal);
    }

    /// Signals with a timestamp inside the lookback window ending at `now`,
    /// in insertion order.
    pub fn windowed(&self, now: DateTime<Utc>) -> Vec<&BehaviorSignal> {
        let cutoff = now - self.lookback;
        self.signals
            .iter()
            .filter(|signal| signal.timestamp > cutoff)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
