//! HTTP server.
//!
//! Exposes the analysis pipeline over a small JSON/SSE API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness (returns a greeting and the version) |
//! | `GET`  | `/analyze_repo?url=...` | Blocking analysis, returns `{repo, file_count, project_summary}` |
//! | `GET`  | `/analyze_repo_stream?url=...` | Server-sent events, one JSON object per event |
//!
//! # Error Contract
//!
//! Blocking failures are returned as `{ "detail": "..." }` with:
//! `400` invalid URL, `404` no readable files, `500` fetch or report failure.
//!
//! The stream always answers `200`; failures arrive as `{"error": "..."}`
//! events. The stream closes when the run ends: after `{"status": "Completed"}`,
//! or after an `error` that stops the run. A report that cannot be written is
//! an `error` followed by `Completed`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::AnalyzeError;
use crate::models::AnalysisResult;
use crate::pipeline::Analyzer;
use crate::progress::{ChannelSink, PipelineEvent};

/// Events buffered between the pipeline task and a slow SSE consumer.
const STREAM_BUFFER: usize = 32;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
}

/// Starts the HTTP server on `[server].bind` with the production analyzer.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let analyzer = Arc::new(Analyzer::from_config(config)?);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Analyzer listening on http://{}", config.server.bind);
    serve(listener, analyzer).await
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, analyzer: Arc<Analyzer>) -> anyhow::Result<()> {
    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}

/// Build the router; exposed so callers can embed or test it.
pub fn router(analyzer: Arc<Analyzer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_home))
        .route("/analyze_repo", get(handle_analyze))
        .route("/analyze_repo_stream", get(handle_analyze_stream))
        .layer(cors)
        .with_state(AppState { analyzer })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

impl From<AnalyzeError> for AppError {
    fn from(err: AnalyzeError) -> Self {
        let status = match &err {
            AnalyzeError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::NoReadableFiles => StatusCode::NOT_FOUND,
            AnalyzeError::Fetch(_) | AnalyzeError::Aggregation(_) | AnalyzeError::Disconnected => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            detail: err.to_string(),
        }
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct HomeResponse {
    message: String,
    version: String,
}

async fn handle_home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Welcome to the AI GitHub Analyzer".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /analyze_repo ============

#[derive(Deserialize)]
struct AnalyzeParams {
    url: String,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<AnalysisResult>, AppError> {
    let result = state.analyzer.analyze(&params.url).await?;
    Ok(Json(result))
}

// ============ GET /analyze_repo_stream ============

/// Runs the pipeline in a task that stops once the client disconnects.
async fn handle_analyze_stream(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<PipelineEvent>(STREAM_BUFFER);
    let watcher = tx.clone();

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        tokio::select! {
            _ = state.analyzer.analyze_streaming(&params.url, &mut sink) => {}
            _ = watcher.closed() => {
                info!("Client disconnected from stream for {}", params.url);
            }
        }
    });

    Sse::new(event_stream(rx)).keep_alive(KeepAlive::default())
}

/// Forward events until the run drops its sender.
fn event_stream(
    rx: mpsc::Receiver<PipelineEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(Event::default().data(event.to_json())), rx))
    })
}
