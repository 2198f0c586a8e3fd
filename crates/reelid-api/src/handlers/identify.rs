//! Identification session handlers.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use reelid_models::{SessionId, SessionSnapshot, SessionStatus, VideoId};

use crate::error::ApiResult;
use crate::metrics;
use crate::state::AppState;

/// Comment text of SSE keep-alive frames.
pub const HEARTBEAT_TEXT: &str = "heartbeat";

/// Response for a newly started session.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub session_id: SessionId,
    pub video_id: VideoId,
    pub status: SessionStatus,
}

/// Chip selection sent by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct FeedbackRequest {
    #[validate(length(min = 1, max = 64))]
    pub chip: String,
    pub selected: bool,
}

/// Start identifying a stored video.
pub async fn start_identification(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StartResponse>)> {
    let video_id = VideoId::from_string(video_id);
    let session = state.sessions.start(&video_id).await?;

    info!(session_id = %session.id(), video_id = %video_id, "Identification started");

    Ok((
        StatusCode::CREATED,
        Json(StartResponse {
            session_id: session.id().clone(),
            video_id,
            status: session.status().await,
        }),
    ))
}

/// Current state of a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionSnapshot>> {
    let snapshot = state
        .sessions
        .snapshot(&SessionId::from_string(session_id))
        .await?;
    Ok(Json(snapshot))
}

/// Stream a session's events as SSE.
///
/// One stream per session. Closing it cancels the session.
pub async fn stream_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session_id = SessionId::from_string(session_id);
    let mut events = state.sessions.take_events(&session_id).await?;
    metrics::record_sse_stream_opened();
    debug!(session_id = %session_id, "SSE client connected");

    let stream = async_stream::stream! {
        while let Some(update) = events.recv().await {
            let event_type = update.update_type().as_str();
            match serde_json::to_string(&update) {
                Ok(json) => {
                    metrics::record_sse_event(event_type);
                    yield Ok(Event::default().event(event_type).data(json));
                }
                Err(e) => warn!(session_id = %session_id, "Failed to serialize {} event: {}", event_type, e),
            }
        }
        debug!(session_id = %session_id, "SSE stream finished");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.config.sse_heartbeat)
            .text(HEARTBEAT_TEXT),
    ))
}

/// Select or deselect a chip.
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<StatusCode> {
    request.validate()?;

    state
        .sessions
        .update_feedback(
            &SessionId::from_string(session_id),
            &request.chip,
            request.selected,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ask a session to stop. The stream ends with a `cancelled` event.
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .cancel(&SessionId::from_string(session_id))
        .await?;
    Ok(StatusCode::ACCEPTED)
}
