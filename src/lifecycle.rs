//! Nudge lifecycle store: pending → delivered → responded/dismissed.
//!
//! Expiry is lazy. Pending nudges whose window has lapsed are pruned when
//! the pending set is read, not by a background timer — and they are
//! dropped without a terminal record. `deliver` and `respond` are
//! idempotent no-ops on unknown ids, so the transport can replay safely.

use chrono::{DateTime, Utc};

use crate::types::Nudge;

/// Tracks every nudge emitted for one engine instance.
#[derive(Debug, Default)]
pub struct NudgeStore {
    pending: Vec<Nudge>,
    delivered: Vec<Nudge>,
}

impl NudgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly-emitted nudge as pending.
    pub fn push_pending(&mut self, nudge: Nudge) {
        self.pending.push(nudge);
    }

    /// Pending nudges still inside their delivery window at `now`.
    ///
    /// Expired entries are dropped here as a side effect of the read; they
    /// are not moved to any terminal collection.
    pub fn pending_at(&mut self, now: DateTime<Utc>) -> Vec<Nudge> {
        let before = self.pending.len();
        self.pending.retain(|nudge| !nudge.is_expired(now));
        let lapsed = before - self.pending.len();
        if lapsed > 0 {
            log::debug!("dropped {} expired pending nudge(s)", lapsed);
        }
        self.pending.clone()
    }

    /// Move a nudge from pending to delivered, stamping `deliveredAt`.
    /// No-op if the id is not in the pending set.
    pub fn deliver(&mut self, id: &str, now: DateTime<Utc>) {
        let Some(pos) = self.pending.iter().position(|nudge| nudge.id == id) else {
            log::debug!("deliver_nudge: {} not pending, ignoring", id);
            return;
        };

        let mut nudge = self.pending.remove(pos);
        nudge.delivered_at = Some(now);
        log::info!("nudge {} delivered ({:?})", nudge.id, nudge.kind);
        self.delivered.push(nudge);
    }

    /// Stamp `respondedAt` and the dismissed flag on a delivered nudge.
    /// No-op if the id is not among delivered nudges or was already
    /// responded to — each lifecycle field is set at most once.
    pub fn respond(&mut self, id: &str, dismissed: bool, now: DateTime<Utc>) {
        let Some(nudge) = self
            .delivered
            .iter_mut()
            .find(|nudge| nudge.id == id && nudge.responded_at.is_none())
        else {
            log::debug!("respond_to_nudge: {} not awaiting response, ignoring", id);
            return;
        };

        nudge.responded_at = Some(now);
        nudge.dismissed = Some(dismissed);
        log::info!(
            "nudge {} {} by learner",
            nudge.id,
            if dismissed { "dismissed" } else { "accepted" }
        );
    }

    /// Every nudge ever delivered for this engine, including responded ones.
    pub fn delivered(&self) -> Vec<Nudge> {
        self.delivered.clone()
    }

    /// Raw pending count, without expiry pruning. Used for the
    /// null-result invariant: a rejected evaluation leaves this unchanged.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::types::{NudgeKind, NudgePriority, SignalKind};

    fn nudge(id: &str, expires_at: DateTime<Utc>) -> Nudge {
        Nudge {
            id: id.to_string(),
            kind: NudgeKind::ReviewReminder,
            priority: NudgePriority::Medium,
            message: "test".to_string(),
            detailed_message: None,
            suggested_action: None,
            trigger_signals: vec![SignalKind::ReviewOverdue],
            expires_at,
            delivered_at: None,
            responded_at: None,
            dismissed: None,
        }
    }

    #[test]
    fn test_pending_excludes_expired_and_drops_them() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-live", now + Duration::minutes(5)));
        store.push_pending(nudge("nudge-lapsed", now - Duration::seconds(1)));

        let pending = store.pending_at(now);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "nudge-live");
        // The lapsed nudge is gone, not parked anywhere.
        assert_eq!(store.pending_len(), 1);
        assert!(store.delivered().is_empty());
    }

    #[test]
    fn test_lapsed_nudge_stays_pending_until_read() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-lapsed", now - Duration::minutes(1)));

        // No read has happened, so the nudge is still formally pending.
        assert_eq!(store.pending_len(), 1);
        assert!(store.pending_at(now).is_empty());
        assert_eq!(store.pending_len(), 0);
    }

    #[test]
    fn test_deliver_moves_and_stamps() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));

        store.deliver("nudge-a", now);
        assert_eq!(store.pending_len(), 0);

        let delivered = store.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].delivered_at, Some(now));
        assert!(delivered[0].responded_at.is_none());
    }

    #[test]
    fn test_deliver_unknown_id_is_noop() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));

        store.deliver("nudge-missing", now);
        assert_eq!(store.pending_len(), 1);
        assert!(store.delivered().is_empty());
    }

    #[test]
    fn test_deliver_twice_does_not_duplicate() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));

        store.deliver("nudge-a", now);
        store.deliver("nudge-a", now + Duration::seconds(30));

        let delivered = store.delivered();
        assert_eq!(delivered.len(), 1);
        // First delivery timestamp wins.
        assert_eq!(delivered[0].delivered_at, Some(now));
    }

    #[test]
    fn test_respond_requires_delivery() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));

        // Responding to an undelivered nudge is a no-op.
        store.respond("nudge-a", false, now);
        assert_eq!(store.pending_len(), 1);

        store.deliver("nudge-a", now);
        store.respond("nudge-a", true, now + Duration::minutes(1));

        let delivered = store.delivered();
        assert_eq!(delivered[0].dismissed, Some(true));
        assert_eq!(delivered[0].responded_at, Some(now + Duration::minutes(1)));
    }

    #[test]
    fn test_respond_stamps_only_once() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));
        store.deliver("nudge-a", now);

        store.respond("nudge-a", false, now);
        store.respond("nudge-a", true, now + Duration::minutes(2));

        let delivered = store.delivered();
        // Second response ignored: flags unchanged.
        assert_eq!(delivered[0].dismissed, Some(false));
        assert_eq!(delivered[0].responded_at, Some(now));
    }

    #[test]
    fn test_delivered_includes_responded() {
        let now = Utc::now();
        let mut store = NudgeStore::new();
        store.push_pending(nudge("nudge-a", now + Duration::minutes(10)));
        store.push_pending(nudge("nudge-b", now + Duration::minutes(10)));
        store.deliver("nudge-a", now);
        store.deliver("nudge-b", now);
        store.respond("nudge-a", true, now);

        assert_eq!(store.delivered().len(), 2);
    }
}
