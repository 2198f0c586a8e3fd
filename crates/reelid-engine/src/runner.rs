//! The identification loop.
//!
//! One loop runs per session. For each frame it searches, scores and
//! streams candidates, then waits for feedback (rescore the same frame),
//! cancellation, or the idle timeout (move to the next frame).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use reelid_models::{
    FrameAnalysis, IdentificationResult, SessionStatus, SessionUpdate,
};
use reelid_storage::VideoRecord;

use crate::analyzer::{analyze_frame, failure_stage};
use crate::candidates::rank_candidates;
use crate::chips::extract_chips;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::keywords::build_search_query;
use crate::logging::SessionLogger;
use crate::manager::EngineDeps;
use crate::metrics;
use crate::outbox::SessionOutbox;
use crate::session::{IdentificationSession, SessionChannels};

/// The session was cancelled while the loop was running.
struct Cancelled;

enum Outcome {
    Identified(IdentificationResult),
    Exhausted,
    Failed(EngineError),
}

pub(crate) struct IdentificationLoop {
    session: Arc<IdentificationSession>,
    video: VideoRecord,
    deps: EngineDeps,
    config: EngineConfig,
    outbox: SessionOutbox,
    feedback_rx: mpsc::Receiver<()>,
    cancel: CancellationToken,
    logger: SessionLogger,
}

/// Run `fut` unless the session is cancelled first.
async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}

impl IdentificationLoop {
    pub(crate) fn new(
        session: Arc<IdentificationSession>,
        video: VideoRecord,
        deps: EngineDeps,
        config: EngineConfig,
        channels: SessionChannels,
        logger: SessionLogger,
    ) -> Self {
        let cancel = session.cancel_token().clone();
        Self {
            session,
            video,
            deps,
            config,
            outbox: channels.outbox,
            feedback_rx: channels.feedback_rx,
            cancel,
            logger,
        }
    }

    /// Drive the session to a terminal status. Consumes the loop, so the
    /// event channel closes when this returns.
    pub(crate) async fn run(mut self) {
        self.logger.log_start(&format!(
            "threshold {}, up to {} frames",
            self.config.score_threshold, self.config.max_frames
        ));

        let (status, terminal) = match self.identify().await {
            Ok(Outcome::Identified(result)) => {
                self.logger.log_completion(
                    SessionStatus::Complete.as_str(),
                    &format!(
                        "{} ({:.2}) after {} frames",
                        result.film_details.title, result.confidence, result.frames_used
                    ),
                );
                (SessionStatus::Complete, Some(SessionUpdate::Complete(result)))
            }
            Ok(Outcome::Exhausted) => {
                self.logger.log_completion(
                    SessionStatus::NeedsInput.as_str(),
                    "frames exhausted below threshold",
                );
                (SessionStatus::NeedsInput, Some(SessionUpdate::needs_input()))
            }
            Ok(Outcome::Failed(e)) => {
                self.logger.log_error(&e.to_string());
                (SessionStatus::Error, None)
            }
            Err(Cancelled) => {
                self.logger
                    .log_completion(SessionStatus::Cancelled.as_str(), "cancelled");
                (SessionStatus::Cancelled, Some(SessionUpdate::cancelled()))
            }
        };

        // Status first, so a consumer reading the terminal event sees it.
        self.session.finish(status).await;
        if let Some(update) = terminal {
            self.outbox.emit_terminal(update);
        }
        metrics::record_session_finished(status.as_str(), self.session.elapsed().as_secs_f64());
    }

    async fn identify(&mut self) -> Result<Outcome, Cancelled> {
        let video_id = self.session.video_id().clone();
        let existing = match cancellable(&self.cancel, self.deps.analyses.get_by_video(&video_id)).await? {
            Ok(records) => records
                .into_iter()
                .map(|r| (r.frame_number, r.analysis))
                .collect::<HashMap<u32, FrameAnalysis>>(),
            Err(e) => return Ok(Outcome::Failed(e.into())),
        };

        let mut confidence = 0.0;
        for frame in 0..self.config.max_frames {
            if confidence >= self.config.score_threshold {
                break;
            }
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }

            self.session.begin_frame(frame).await;
            let analysis = match existing.get(&frame) {
                Some(analysis) => {
                    self.logger.log_frame(frame, true);
                    metrics::record_frame_analyzed(true);
                    analysis.clone()
                }
                None => {
                    self.logger.log_frame(frame, false);
                    match self.analyze_new_frame(frame).await? {
                        Some(analysis) => analysis,
                        None => continue,
                    }
                }
            };

            loop {
                if self.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
                // The pass below reads the latest feedback.
                let _ = self.feedback_rx.try_recv();

                let feedback = self.session.feedback().await;
                let query = build_search_query(&analysis, &feedback);
                metrics::record_search_pass();
                let results = match cancellable(&self.cancel, self.deps.search.search(&query)).await? {
                    Ok(results) => results,
                    Err(e) => {
                        self.logger
                            .log_warning(&format!("search failed on frame {frame}: {e}"));
                        metrics::record_search_failure();
                        break;
                    }
                };

                let candidates =
                    rank_candidates(&results, &analysis, &feedback, self.deps.search.name());
                confidence = self.session.record_pass(candidates.clone()).await;
                self.logger.log_pass(frame, candidates.len(), confidence);

                self.outbox.emit_progress(SessionUpdate::chips(
                    self.session.id().clone(),
                    extract_chips(&analysis, &feedback),
                ));
                self.outbox.emit_progress(SessionUpdate::candidates(
                    candidates.clone(),
                    frame,
                    confidence,
                ));

                if let Some(top) = candidates.first() {
                    if confidence >= self.config.score_threshold {
                        match cancellable(&self.cancel, self.deps.films.get_film(&top.catalog_id)).await? {
                            Ok(film) => {
                                let poster_url = self.deps.films.poster_url(&film);
                                return Ok(Outcome::Identified(IdentificationResult {
                                    session_id: self.session.id().clone(),
                                    video_id,
                                    film_details: film,
                                    confidence,
                                    frames_used: frame + 1,
                                    time_elapsed: u64::try_from(self.session.elapsed().as_millis())
                                        .unwrap_or(u64::MAX),
                                    poster_url,
                                }));
                            }
                            Err(e) => self.logger.log_warning(&format!(
                                "film details for {} unavailable: {e}",
                                top.catalog_id
                            )),
                        }
                    }
                }

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(Cancelled),
                    Some(()) = self.feedback_rx.recv() => continue,
                    _ = tokio::time::sleep(self.config.idle_wait) => break,
                }
            }
        }

        Ok(Outcome::Exhausted)
    }

    /// Extract, analyze and persist a frame. `None` when the frame is unusable.
    async fn analyze_new_frame(&self, frame: u32) -> Result<Option<FrameAnalysis>, Cancelled> {
        let path = self.deps.videos.file_path(&self.video);
        let analyzed = cancellable(
            &self.cancel,
            analyze_frame(
                &*self.deps.frames,
                &*self.deps.vision,
                &path,
                frame,
                self.config.frame_size,
            ),
        )
        .await?;

        match analyzed {
            Ok(analysis) => {
                metrics::record_frame_analyzed(false);
                if let Err(e) = self
                    .deps
                    .analyses
                    .upsert(self.session.video_id(), frame, &analysis)
                    .await
                {
                    self.logger
                        .log_warning(&format!("could not store analysis of frame {frame}: {e}"));
                }
                Ok(Some(analysis))
            }
            Err(e) => {
                self.logger
                    .log_warning(&format!("frame {frame} unusable: {e}"));
                metrics::record_frame_failure(failure_stage(&e));
                Ok(None)
            }
        }
    }
}
