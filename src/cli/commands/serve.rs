//! HTTP API server.
//!
//! JSON endpoints mirroring the service's four pipelines: transcription,
//! summarization, key-point extraction, and subreddit scraping. Missing
//! required fields are validation errors (400) answered before any
//! collaborator is invoked; collaborator failures surface as 500 with an
//! error payload.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::TranscripterError;
use crate::reddit::{HttpRedditClient, ScrapedPost};
use crate::scrape;
use crate::store::Store;
use crate::summarize::{Mode, Summarizer};
use crate::transcription::TranscriptionPipeline;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

/// Shared application state.
struct AppState {
    settings: Settings,
    store: Store,
    pipeline: TranscriptionPipeline,
    summarizer: Summarizer,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    // Schema init happens before the router binds; a missing database path
    // is fatal here, not at request time.
    let store = Store::new(&settings.database_path()?)?;
    let pipeline = TranscriptionPipeline::new(&settings.transcription);
    let summarizer = Summarizer::new(&settings.summarize);

    let state = Arc::new(AppState {
        settings,
        store,
        pipeline,
        summarizer,
    });

    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Transcripter API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Transcribe", "POST /api/transcribe");
    Output::kv("Summarize", "POST /api/chatgpt_summarize");
    Output::kv("Key points", "POST /api/chatgpt_keypoints");
    Output::kv("Scrape", "POST /api/scrape_reddit");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/transcribe", post(transcribe))
        .route("/api/chatgpt_summarize", post(chatgpt_summarize))
        .route("/api/chatgpt_keypoints", post(chatgpt_keypoints))
        .route("/api/scrape_reddit", post(scrape_reddit))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct TranscribeRequest {
    url: Option<String>,
}

#[derive(Serialize)]
struct TranscribeResponse {
    transcription: String,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    text: Option<String>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    result: String,
}

#[derive(Serialize)]
struct KeyPointsResponse {
    keypoints: String,
}

#[derive(Deserialize)]
struct ScrapeRequest {
    post_limit: Option<usize>,
    comment_limit_per_post: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct ScrapeErrorResponse {
    error: String,
    details: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscribeRequest>,
) -> impl IntoResponse {
    let url = match req.url {
        Some(u) if !u.is_empty() => u,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "No URL provided".to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.pipeline.run(&url).await {
        Ok(outcome) => {
            // Best-effort persistence; the transcription is returned either way.
            if let Err(e) = state.store.save_transcript(
                &url,
                &outcome.text,
                outcome.video_title.as_deref(),
                outcome.channel_name.as_deref(),
            ) {
                warn!("Failed to persist transcript for {}: {}", url, e);
            }

            Json(TranscribeResponse {
                transcription: outcome.text,
            })
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn chatgpt_summarize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> impl IntoResponse {
    let Some(text) = req.text.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No text provided".to_string(),
            }),
        )
            .into_response();
    };

    match state.summarizer.complete(&text, Mode::Summarize).await {
        Ok(result) => Json(SummarizeResponse { result }).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn chatgpt_keypoints(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SummarizeRequest>,
) -> impl IntoResponse {
    let Some(text) = req.text.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No text provided".to_string(),
            }),
        )
            .into_response();
    };

    match state.summarizer.complete(&text, Mode::KeyPoints).await {
        Ok(keypoints) => Json(KeyPointsResponse { keypoints }).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn scrape_reddit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScrapeRequest>,
) -> impl IntoResponse {
    let post_limit = req.post_limit.unwrap_or(state.settings.scraper.post_limit);
    let comment_limit = req
        .comment_limit_per_post
        .unwrap_or(state.settings.scraper.comment_limit_per_post);

    // Client handle is scoped to the call needing it, not ambient state.
    let client = match HttpRedditClient::from_env() {
        Ok(c) => c,
        Err(e) => return scrape_failure(e),
    };

    match scrape::run_scrape(
        &client,
        &state.store,
        &state.settings.reddit.subreddit,
        post_limit,
        comment_limit,
        &state.settings.scraper,
    )
    .await
    {
        Ok(posts) => Json::<Vec<ScrapedPost>>(posts).into_response(),
        Err(e) => scrape_failure(e),
    }
}

fn scrape_failure(e: TranscripterError) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ScrapeErrorResponse {
            error: "Scrape failed".to_string(),
            details: e.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let store = Store::new(&dir.path().join("api.db")).unwrap();
        let state = Arc::new(AppState {
            pipeline: TranscriptionPipeline::new(&settings.transcription),
            summarizer: Summarizer::new(&settings.summarize),
            settings,
            store,
        });
        (dir, state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_transcribe_missing_url_is_400() {
        let (_dir, state) = test_state();

        let response = transcribe(State(state.clone()), Json(TranscribeRequest { url: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No URL provided");

        // Empty string is treated the same as missing.
        let response = transcribe(
            State(state),
            Json(TranscribeRequest {
                url: Some(String::new()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summarize_missing_text_is_400() {
        let (_dir, state) = test_state();

        let response = chatgpt_summarize(State(state), Json(SummarizeRequest { text: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No text provided");
    }

    #[tokio::test]
    async fn test_keypoints_missing_text_is_400() {
        let (_dir, state) = test_state();

        let response = chatgpt_keypoints(State(state), Json(SummarizeRequest { text: None }))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }
}
