//! Identification metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder that exports them.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const SESSIONS_STARTED_TOTAL: &str = "reelid_sessions_started_total";
    pub const SESSIONS_FINISHED_TOTAL: &str = "reelid_sessions_finished_total";
    pub const SESSIONS_ACTIVE: &str = "reelid_sessions_active";
    pub const SESSION_DURATION_SECONDS: &str = "reelid_session_duration_seconds";
    pub const FRAMES_ANALYZED_TOTAL: &str = "reelid_frames_analyzed_total";
    pub const FRAME_FAILURES_TOTAL: &str = "reelid_frame_failures_total";
    pub const SEARCH_PASSES_TOTAL: &str = "reelid_search_passes_total";
    pub const SEARCH_FAILURES_TOTAL: &str = "reelid_search_failures_total";
    pub const EVENTS_DROPPED_TOTAL: &str = "reelid_events_dropped_total";
}

pub fn record_session_started() {
    counter!(names::SESSIONS_STARTED_TOTAL).increment(1);
    gauge!(names::SESSIONS_ACTIVE).increment(1.0);
}

pub fn record_session_finished(status: &str, duration_secs: f64) {
    let labels = [("status", status.to_string())];
    counter!(names::SESSIONS_FINISHED_TOTAL, &labels).increment(1);
    histogram!(names::SESSION_DURATION_SECONDS, &labels).record(duration_secs);
    gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a frame analysis, `reused` when it came from the store.
pub fn record_frame_analyzed(reused: bool) {
    let labels = [("reused", reused.to_string())];
    counter!(names::FRAMES_ANALYZED_TOTAL, &labels).increment(1);
}

pub fn record_frame_failure(stage: &'static str) {
    counter!(names::FRAME_FAILURES_TOTAL, "stage" => stage).increment(1);
}

pub fn record_search_pass() {
    counter!(names::SEARCH_PASSES_TOTAL).increment(1);
}

pub fn record_search_failure() {
    counter!(names::SEARCH_FAILURES_TOTAL).increment(1);
}

pub fn record_event_dropped(event_type: &'static str) {
    counter!(names::EVENTS_DROPPED_TOTAL, "type" => event_type).increment(1);
}
