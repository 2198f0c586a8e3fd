//! Bounded, non-blocking session event outbox.
//!
//! The producer never waits on the consumer. Progress events (`chips`,
//! `candidates`) are dropped once fewer than two slots are free, which keeps
//! the last slot for the single terminal event. A consumer that has gone
//! away cancels the session.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use reelid_models::SessionUpdate;

use crate::metrics;

#[derive(Debug)]
pub struct SessionOutbox {
    tx: mpsc::Sender<SessionUpdate>,
    cancel: CancellationToken,
}

impl SessionOutbox {
    pub(crate) fn new(tx: mpsc::Sender<SessionUpdate>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }

    /// Queue a progress event. Returns whether it was queued.
    pub fn emit_progress(&self, update: SessionUpdate) -> bool {
        if self.consumer_gone() {
            return false;
        }

        let event_type = update.update_type().as_str();
        if self.tx.capacity() <= 1 {
            warn!(event_type, "Event buffer full, dropping progress event");
            metrics::record_event_dropped(event_type);
            return false;
        }

        self.send(update)
    }

    /// Queue the terminal event into the reserved slot.
    pub fn emit_terminal(&self, update: SessionUpdate) -> bool {
        if self.consumer_gone() {
            return false;
        }
        self.send(update)
    }

    fn send(&self, update: SessionUpdate) -> bool {
        match self.tx.try_send(update) {
            Ok(()) => true,
            Err(TrySendError::Full(update)) => {
                let event_type = update.update_type().as_str();
                warn!(event_type, "Event buffer full, dropping event");
                metrics::record_event_dropped(event_type);
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.on_consumer_gone();
                false
            }
        }
    }

    fn consumer_gone(&self) -> bool {
        if self.tx.is_closed() {
            self.on_consumer_gone();
            true
        } else {
            false
        }
    }

    fn on_consumer_gone(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Event consumer closed, cancelling session");
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelid_models::SessionId;

    fn outbox(capacity: usize) -> (SessionOutbox, mpsc::Receiver<SessionUpdate>, CancellationToken) {
        let (tx, rx) = mpsc::channel(capacity);
        let cancel = CancellationToken::new();
        (SessionOutbox::new(tx, cancel.clone()), rx, cancel)
    }

    #[tokio::test]
    async fn test_last_slot_reserved_for_terminal() {
        let (outbox, mut rx, _cancel) = outbox(3);

        assert!(outbox.emit_progress(SessionUpdate::chips(SessionId::from_string("s"), vec![])));
        assert!(outbox.emit_progress(SessionUpdate::candidates(vec![], 0, 0.0)));
        assert!(!outbox.emit_progress(SessionUpdate::candidates(vec![], 1, 0.0)));
        assert!(outbox.emit_terminal(SessionUpdate::needs_input()));

        assert_eq!(rx.recv().await.unwrap().update_type().as_str(), "chips");
        assert_eq!(rx.recv().await.unwrap().update_type().as_str(), "candidates");
        assert!(rx.recv().await.unwrap().is_terminal());
    }

    #[tokio::test]
    async fn test_draining_frees_slots() {
        let (outbox, mut rx, _cancel) = outbox(2);

        assert!(outbox.emit_progress(SessionUpdate::candidates(vec![], 0, 0.0)));
        assert!(!outbox.emit_progress(SessionUpdate::candidates(vec![], 1, 0.0)));
        rx.recv().await.unwrap();
        assert!(outbox.emit_progress(SessionUpdate::candidates(vec![], 2, 0.0)));
    }

    #[tokio::test]
    async fn test_closed_consumer_cancels() {
        let (outbox, rx, cancel) = outbox(4);
        drop(rx);

        assert!(!outbox.emit_progress(SessionUpdate::candidates(vec![], 0, 0.0)));
        assert!(cancel.is_cancelled());
        assert!(!outbox.emit_terminal(SessionUpdate::cancelled()));
    }
}
