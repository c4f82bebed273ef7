//! Single-slot debounced content saver.
//!
//! Rapid edits to one document coalesce into a single persist issued after
//! a quiet period. The slot holds at most one pending save: scheduling a
//! save for a *different* document hands the previous one back to the
//! caller, which must persist it immediately — a prior document's edits are
//! never silently dropped.
//!
//! This is deliberately a write-back cache of capacity one, not a queue.
//! The saver itself does no I/O and keeps no clock beyond deadline
//! arithmetic; `VaultStore` drives it.

use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Quiet period before a scheduled content save becomes due.
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// A content edit waiting for its quiet period to elapse.
#[derive(Debug)]
pub struct PendingSave {
    pub doc_id: i64,
    pub content: Value,
    pub due: Instant,
}

/// The single-slot outbox.
pub struct DebouncedSaver {
    slot: Option<PendingSave>,
    quiet: Duration,
}

impl DebouncedSaver {
    pub fn new() -> Self {
        Self::with_quiet_period(QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self { slot: None, quiet }
    }

    /// Schedules a content save, restarting the quiet period.
    ///
    /// Returns a displaced pending save when the slot held an edit for a
    /// different document; the caller must persist it before anything else.
    pub fn schedule(&mut self, doc_id: i64, content: Value) -> Option<PendingSave> {
        let fresh = PendingSave {
            doc_id,
            content,
            due: Instant::now() + self.quiet,
        };
        let displaced = match self.slot.take() {
            Some(prev) if prev.doc_id != doc_id => Some(prev),
            _ => None,
        };
        self.slot = Some(fresh);
        displaced
    }

    /// Takes the pending save if its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<PendingSave> {
        if self.slot.as_ref().is_some_and(|p| now >= p.due) {
            self.slot.take()
        } else {
            None
        }
    }

    /// Takes the pending save unconditionally (flush).
    pub fn take_pending(&mut self) -> Option<PendingSave> {
        self.slot.take()
    }

    /// Time until the pending save is due, `None` when the slot is empty.
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.slot.as_ref().map(|p| p.due.saturating_duration_since(now))
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

impl Default for DebouncedSaver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn same_document_coalesces_and_restarts_quiet_period() {
        let mut saver = DebouncedSaver::new();

        assert!(saver.schedule(1, json!("draft one")).is_none());
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(saver.schedule(1, json!("draft two")).is_none());

        // First deadline has passed, but the edit restarted the period
        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(saver.take_due(Instant::now()).is_none());

        tokio::time::advance(Duration::from_millis(200)).await;
        let due = saver.take_due(Instant::now()).unwrap();
        assert_eq!(due.doc_id, 1);
        assert_eq!(due.content, json!("draft two"));
        assert!(saver.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn different_document_displaces_pending_save() {
        let mut saver = DebouncedSaver::new();

        assert!(saver.schedule(1, json!("doc one edit")).is_none());
        let displaced = saver.schedule(2, json!("doc two edit")).unwrap();

        assert_eq!(displaced.doc_id, 1);
        assert_eq!(displaced.content, json!("doc one edit"));

        // Doc two remains scheduled with a full quiet period
        assert!(saver.take_due(Instant::now()).is_none());
        tokio::time::advance(QUIET_PERIOD).await;
        assert_eq!(saver.take_due(Instant::now()).unwrap().doc_id, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_takes_regardless_of_deadline() {
        let mut saver = DebouncedSaver::new();
        saver.schedule(1, json!("edit"));

        let pending = saver.take_pending().unwrap();
        assert_eq!(pending.doc_id, 1);
        assert!(saver.is_empty());
        assert!(saver.due_in(Instant::now()).is_none());
    }
}
