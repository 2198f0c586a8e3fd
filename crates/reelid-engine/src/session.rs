//! Identification session state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use reelid_models::{
    FeedbackMap, FilmCandidate, SessionId, SessionSnapshot, SessionStatus, SessionUpdate, VideoId,
};

use crate::error::{EngineError, EngineResult};
use crate::outbox::SessionOutbox;

/// Fields written only by the session's loop.
#[derive(Debug, Default)]
struct LoopState {
    current_frame: u32,
    candidates: Vec<FilmCandidate>,
    confidence: f64,
    status: SessionStatus,
    completed_at: Option<DateTime<Utc>>,
}

/// One in-flight identification.
///
/// The loop owns every write except feedback, which callers update
/// concurrently through [`IdentificationSession::set_feedback`].
#[derive(Debug)]
pub struct IdentificationSession {
    id: SessionId,
    video_id: VideoId,
    started_at: DateTime<Utc>,
    started: Instant,
    state: RwLock<LoopState>,
    feedback: RwLock<FeedbackMap>,
    feedback_signal: mpsc::Sender<()>,
    cancel: CancellationToken,
    events: Mutex<Option<mpsc::Receiver<SessionUpdate>>>,
}

/// Loop-side ends of a session's channels.
pub(crate) struct SessionChannels {
    pub outbox: SessionOutbox,
    pub feedback_rx: mpsc::Receiver<()>,
}

impl IdentificationSession {
    pub(crate) fn new(
        id: SessionId,
        video_id: VideoId,
        event_buffer: usize,
    ) -> (Self, SessionChannels) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer.max(2));
        // One slot: a pending signal already says "feedback changed".
        let (feedback_tx, feedback_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let session = Self {
            id,
            video_id,
            started_at: Utc::now(),
            started: Instant::now(),
            state: RwLock::new(LoopState::default()),
            feedback: RwLock::new(FeedbackMap::new()),
            feedback_signal: feedback_tx,
            cancel: cancel.clone(),
            events: Mutex::new(Some(event_rx)),
        };
        let channels = SessionChannels {
            outbox: SessionOutbox::new(event_tx, cancel),
            feedback_rx,
        };
        (session, channels)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the session was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status
    }

    pub async fn confidence(&self) -> f64 {
        self.state.read().await.confidence
    }

    /// Copy of the current feedback map.
    pub async fn feedback(&self) -> FeedbackMap {
        self.feedback.read().await.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            session_id: self.id.clone(),
            video_id: self.video_id.clone(),
            status: state.status,
            current_frame: state.current_frame,
            candidates: state.candidates.clone(),
            feedback: self.feedback.read().await.clone(),
            confidence: state.confidence,
            started_at: self.started_at,
            completed_at: state.completed_at,
        }
    }

    /// Record a chip selection and wake the loop.
    ///
    /// Never blocks. If a wake-up is already pending this one is dropped.
    pub async fn set_feedback(&self, chip: impl Into<String>, selected: bool) {
        self.feedback.write().await.insert(chip.into(), selected);
        let _ = self.feedback_signal.try_send(());
    }

    /// Request cancellation. Returns immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Hand out the event stream. Only one consumer is allowed.
    pub async fn take_events(&self) -> EngineResult<SessionEvents> {
        let rx = self
            .events
            .lock()
            .await
            .take()
            .ok_or_else(|| EngineError::EventsAlreadyTaken(self.id.clone()))?;
        Ok(SessionEvents {
            rx,
            _cancel_on_drop: self.cancel.clone().drop_guard(),
        })
    }

    pub(crate) async fn begin_frame(&self, frame: u32) {
        let mut state = self.state.write().await;
        if !state.status.is_terminal() {
            state.current_frame = frame;
        }
    }

    /// Store a pass's ranked candidates. Confidence moves only when the
    /// pass produced candidates.
    pub(crate) async fn record_pass(&self, candidates: Vec<FilmCandidate>) -> f64 {
        let mut state = self.state.write().await;
        if state.status.is_terminal() {
            return state.confidence;
        }
        if let Some(top) = candidates.first() {
            state.confidence = top.score;
        }
        state.candidates = candidates;
        state.confidence
    }

    /// Move to a terminal status. Returns `false` if already terminal.
    pub(crate) async fn finish(&self, status: SessionStatus) -> bool {
        let mut state = self.state.write().await;
        if state.status.is_terminal() {
            return false;
        }
        state.status = status;
        state.completed_at = Some(Utc::now());
        true
    }
}

/// The consumer end of a session's event stream.
///
/// Dropping it cancels the session.
#[derive(Debug)]
pub struct SessionEvents {
    rx: mpsc::Receiver<SessionUpdate>,
    _cancel_on_drop: DropGuard,
}

impl SessionEvents {
    /// Next event, or `None` once the loop has finished.
    pub async fn recv(&mut self) -> Option<SessionUpdate> {
        self.rx.recv().await
    }
}
