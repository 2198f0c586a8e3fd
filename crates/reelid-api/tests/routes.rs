//! Route tests driving the router directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use reelid_api::{create_router, ApiConfig, AppState};
use reelid_engine::{EngineConfig, EngineDeps, SessionManager};
use reelid_media::{FrameSource, MediaResult};
use reelid_models::{FilmDetails, FrameAnalysis, SearchResult, VideoId};
use reelid_providers::{FilmDetailProvider, ProviderResult, VisionProvider, WebSearchProvider};
use reelid_storage::{MemoryFrameAnalysisStore, StorageResult, VideoLookup, VideoRecord};

struct Videos;

#[async_trait]
impl VideoLookup for Videos {
    async fn get_video(&self, id: &VideoId) -> StorageResult<Option<VideoRecord>> {
        Ok((id.as_str() == "clip").then(|| VideoRecord {
            id: id.clone(),
            storage_key: "clip.mp4".to_string(),
        }))
    }

    fn file_path(&self, video: &VideoRecord) -> PathBuf {
        PathBuf::from("/uploads").join(&video.storage_key)
    }
}

struct Frames;

#[async_trait]
impl FrameSource for Frames {
    async fn extract_frames(&self, _path: &Path, count: u32, _size: u32) -> MediaResult<Vec<Vec<u8>>> {
        Ok(vec![vec![0xff, 0xd8]; count as usize])
    }
}

struct Vision;

#[async_trait]
impl VisionProvider for Vision {
    async fn analyze(&self, _image: &[u8]) -> ProviderResult<FrameAnalysis> {
        Ok(FrameAnalysis::with_caption(
            "An action chase through a 1985 shopping mall",
        ))
    }
}

struct Search;

#[async_trait]
impl WebSearchProvider for Search {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, _query: &str) -> ProviderResult<Vec<SearchResult>> {
        Ok(vec![SearchResult::new(
            "Commando - IMDb",
            "https://www.themoviedb.org/movie/10999-commando",
            "1985 action comedy with Arnold",
        )])
    }
}

struct Films;

#[async_trait]
impl FilmDetailProvider for Films {
    async fn get_film(&self, catalog_id: &str) -> ProviderResult<FilmDetails> {
        Ok(FilmDetails {
            id: catalog_id.parse().unwrap_or_default(),
            title: "Commando".to_string(),
            release_date: "1985-10-04".to_string(),
            ..FilmDetails::default()
        })
    }

    fn poster_url(&self, _film: &FilmDetails) -> Option<String> {
        None
    }
}

/// Every pass scores the one candidate 0.25, so sessions complete on the
/// first pass when `threshold` is at or below that.
fn app(threshold: f64) -> Router {
    let deps = EngineDeps {
        videos: Arc::new(Videos),
        analyses: Arc::new(MemoryFrameAnalysisStore::new()),
        frames: Arc::new(Frames),
        vision: Arc::new(Vision),
        search: Arc::new(Search),
        films: Arc::new(Films),
    };
    let engine = EngineConfig {
        score_threshold: threshold,
        ..EngineConfig::default()
    };
    let state = AppState::new(ApiConfig::default(), SessionManager::new(deps, engine));
    create_router(state, None)
}

fn post(uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method("POST").uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn start_session(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post("/api/identify/clip", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let response = app(0.9).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_start_returns_session() {
    let app = app(0.9);
    let response = app
        .clone()
        .oneshot(post("/api/identify/clip", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["videoId"], "clip");
    assert_eq!(body["status"], "analyzing");

    let session_id = body["sessionId"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/api/identify/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["sessionId"], session_id);
    assert_eq!(snapshot["videoId"], "clip");
}

#[tokio::test]
async fn test_start_unknown_video() {
    let response = app(0.9)
        .oneshot(post("/api/identify/missing", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let app = app(0.9);

    for request in [
        get("/api/identify/nope"),
        get("/api/identify/nope/stream"),
        post("/api/identify/nope/stop", None),
        post(
            "/api/identify/nope/feedback",
            Some(json!({ "chip": "action", "selected": true })),
        ),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_feedback() {
    let app = app(0.9);
    let session_id = start_session(&app).await;
    let uri = format!("/api/identify/{session_id}/feedback");

    let response = app
        .clone()
        .oneshot(post(&uri, Some(json!({ "chip": "", "selected": true }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post(&uri, Some(json!({ "chip": "x".repeat(65), "selected": true }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post(&uri, Some(json!({ "chip": "1980s", "selected": true }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let snapshot = body_json(
        app.oneshot(get(&format!("/api/identify/{session_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(snapshot["feedback"]["1980s"], true);
}

#[tokio::test]
async fn test_stop() {
    let app = app(0.9);
    let session_id = start_session(&app).await;

    let response = app
        .oneshot(post(&format!("/api/identify/{session_id}/stop"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_stream_delivers_events_until_terminal() {
    let app = app(0.2);
    let session_id = start_session(&app).await;

    let response = app
        .oneshot(get(&format!("/api/identify/{session_id}/stream")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream")));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    let chips = text.find("event: chips").unwrap();
    let candidates = text.find("event: candidates").unwrap();
    let complete = text.find("event: complete").unwrap();
    assert!(chips < candidates && candidates < complete);
    assert!(text.contains("\"title\":\"Commando\""));
}

#[tokio::test]
async fn test_second_stream_conflicts() {
    let app = app(0.9);
    let session_id = start_session(&app).await;
    let uri = format!("/api/identify/{session_id}/stream");

    let first = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert_eq!(body["code"], "conflict");

    drop(first);
}
