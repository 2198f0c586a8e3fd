//! Session manager.
//!
//! Owns the table of live sessions and routes feedback and cancellation to
//! them. Cheap to clone; clones share the same table.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, Instrument};

use reelid_media::FrameSource;
use reelid_models::{SessionId, SessionSnapshot, VideoId};
use reelid_providers::{FilmDetailProvider, VisionProvider, WebSearchProvider};
use reelid_storage::{FrameAnalysisStore, VideoLookup};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::logging::SessionLogger;
use crate::metrics;
use crate::runner::IdentificationLoop;
use crate::session::{IdentificationSession, SessionEvents};

/// Collaborators the identification loop depends on.
#[derive(Clone)]
pub struct EngineDeps {
    pub videos: Arc<dyn VideoLookup>,
    pub analyses: Arc<dyn FrameAnalysisStore>,
    pub frames: Arc<dyn FrameSource>,
    pub vision: Arc<dyn VisionProvider>,
    pub search: Arc<dyn WebSearchProvider>,
    pub films: Arc<dyn FilmDetailProvider>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    deps: EngineDeps,
    config: EngineConfig,
    sessions: RwLock<HashMap<SessionId, Arc<IdentificationSession>>>,
}

impl SessionManager {
    pub fn new(deps: EngineDeps, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                deps,
                config,
                sessions: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Start identifying a video.
    ///
    /// Returns as soon as the session is registered; the loop runs on its
    /// own task.
    pub async fn start(&self, video_id: &VideoId) -> EngineResult<Arc<IdentificationSession>> {
        let video = self
            .inner
            .deps
            .videos
            .get_video(video_id)
            .await
            .map_err(EngineError::VideoLookup)?
            .ok_or_else(|| EngineError::VideoNotFound(video_id.clone()))?;

        let (session, channels) = IdentificationSession::new(
            SessionId::new(),
            video_id.clone(),
            self.inner.config.event_buffer,
        );
        let session = Arc::new(session);

        self.inner
            .sessions
            .write()
            .await
            .insert(session.id().clone(), Arc::clone(&session));

        let logger = SessionLogger::new(session.id(), video_id);
        let span = logger.create_span();
        let identification = IdentificationLoop::new(
            Arc::clone(&session),
            video,
            self.inner.deps.clone(),
            self.inner.config.clone(),
            channels,
            logger,
        );

        metrics::record_session_started();
        info!(session_id = %session.id(), video_id = %video_id, "Session created");
        tokio::spawn(identification.run().instrument(span));

        Ok(session)
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<Arc<IdentificationSession>> {
        self.inner.sessions.read().await.get(session_id).cloned()
    }

    async fn require(&self, session_id: &SessionId) -> EngineResult<Arc<IdentificationSession>> {
        self.get(session_id)
            .await
            .ok_or_else(|| EngineError::SessionNotFound(session_id.clone()))
    }

    pub async fn snapshot(&self, session_id: &SessionId) -> EngineResult<SessionSnapshot> {
        Ok(self.require(session_id).await?.snapshot().await)
    }

    /// Set one chip's selection and nudge the session to rescore.
    pub async fn update_feedback(
        &self,
        session_id: &SessionId,
        chip: &str,
        selected: bool,
    ) -> EngineResult<()> {
        self.require(session_id)
            .await?
            .set_feedback(chip, selected)
            .await;
        Ok(())
    }

    /// Request cancellation without waiting for the loop to stop.
    pub async fn cancel(&self, session_id: &SessionId) -> EngineResult<()> {
        self.require(session_id).await?.cancel();
        info!(session_id = %session_id, "Cancellation requested");
        Ok(())
    }

    /// Take the session's event stream. Dropping it cancels the session.
    pub async fn take_events(&self, session_id: &SessionId) -> EngineResult<SessionEvents> {
        self.require(session_id).await?.take_events().await
    }

    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }
}
