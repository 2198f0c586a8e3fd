//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use reelid_media::{check_ffmpeg, check_ffprobe, MediaResult};

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub active_sessions: usize,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ffmpeg: CheckStatus,
    pub ffprobe: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }

    fn from_result<T>(result: MediaResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(e) => Self::error(e.to_string()),
        }
    }

    fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Readiness check endpoint (readiness probe).
/// New frames cannot be extracted without FFmpeg and FFprobe.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let checks = ReadinessChecks {
        ffmpeg: CheckStatus::from_result(check_ffmpeg()),
        ffprobe: CheckStatus::from_result(check_ffprobe()),
    };
    let all_ok = checks.ffmpeg.is_ok() && checks.ffprobe.is_ok();

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "not_ready" }.to_string(),
        active_sessions: state.sessions.session_count().await,
        checks,
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
