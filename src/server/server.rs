use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{http_cache, log_requests, metrics, state::*, ServerConfig};
use crate::catalog_store::SongSummary;
use crate::recommend::{self, get_trending, recommend_by_mood, Mood, RecommendError};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub catalog_size: usize,
    pub similarity_dim: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RecommendParams {
    pub song: Option<String>,
    pub top_n: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RecommendMoodParams {
    pub mood: Option<String>,
    pub top_n: Option<String>,
}

#[derive(Serialize)]
struct TitlesResponse {
    recommendations: Vec<String>,
}

#[derive(Serialize)]
struct SongsResponse {
    recommendations: Vec<SongSummary>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for RecommendError {
    fn into_response(self) -> Response {
        match self {
            RecommendError::NotFound(_) => error_response(StatusCode::NOT_FOUND, self.to_string()),
            RecommendError::InvalidMood(_) | RecommendError::InvalidArgument(_) => {
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            RecommendError::StoreUnavailable(details) => {
                error!("Catalog store unavailable: {}", details);
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "The catalog is temporarily unavailable, please retry later.",
                )
            }
        }
    }
}

/// A required query parameter, rejecting absent and empty values.
fn required_param(value: Option<String>, name: &str) -> Result<String, Response> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("A \"{}\" query parameter is required.", name),
        )),
    }
}

/// `top_n` from the query string, `default_top_n` when absent.
fn parse_top_n(raw: Option<&str>, config: &ServerConfig) -> Result<usize, RecommendError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(config.default_top_n),
        Some(raw) => raw,
    };
    match raw.parse::<usize>() {
        Ok(top_n) if (1..=config.max_top_n).contains(&top_n) => Ok(top_n),
        _ => Err(RecommendError::InvalidArgument(format!(
            "top_n must be an integer between 1 and {}, got {:?}",
            config.max_top_n, raw
        ))),
    }
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        catalog_size: state.index.len(),
        similarity_dim: state.index.matrix().dim(),
    };
    Json(stats)
}

async fn get_recommendations(
    State(index): State<GuardedSimilarityIndex>,
    State(config): State<ServerConfig>,
    Query(params): Query<RecommendParams>,
) -> Response {
    let song = match required_param(params.song, "song") {
        Ok(song) => song,
        Err(response) => {
            metrics::record_recommendation_outcome("similar", "invalid_argument");
            return response;
        }
    };

    let result = parse_top_n(params.top_n.as_deref(), &config)
        .and_then(|top_n| recommend::recommend(&index, &song, top_n));
    metrics::record_recommendation("similar", &result);
    match result {
        Ok(recommendations) => Json(TitlesResponse { recommendations }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_mood_recommendations(
    State(mood_store): State<GuardedCatalogStore>,
    State(config): State<ServerConfig>,
    Query(params): Query<RecommendMoodParams>,
) -> Response {
    let mood = match required_param(params.mood, "mood") {
        Ok(mood) => mood,
        Err(response) => {
            metrics::record_recommendation_outcome("mood", "invalid_argument");
            return response;
        }
    };

    let result = match parse_top_n(params.top_n.as_deref(), &config) {
        // The store scan is blocking IO.
        Ok(top_n) => tokio::task::spawn_blocking(move || {
            recommend_by_mood(&*mood_store, &mood, top_n)
        })
        .await
        .unwrap_or_else(|err| {
            Err(RecommendError::StoreUnavailable(format!(
                "mood scan did not complete: {}",
                err
            )))
        }),
        Err(err) => Err(err),
    };
    metrics::record_recommendation("mood", &result);
    match result {
        Ok(recommendations) => Json(SongsResponse { recommendations }).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_moods() -> impl IntoResponse {
    let moods: Vec<&'static str> = Mood::ALL.iter().map(Mood::as_str).collect();
    Json(json!({ "moods": moods }))
}

async fn get_trending_songs(State(index): State<GuardedSimilarityIndex>) -> Response {
    let trending = get_trending(index.catalog());
    metrics::record_recommendation_outcome("trending", "ok");
    Json(trending).into_response()
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found.")
}

pub fn make_app(
    config: ServerConfig,
    index: GuardedSimilarityIndex,
    mood_store: GuardedCatalogStore,
) -> Router {
    let state = ServerState::new(config.clone(), index, mood_store);

    let content_routes: Router = Router::new()
        .route("/recommend", get(get_recommendations))
        .route("/recommend_mood", get(get_mood_recommendations))
        .route("/moods", get(get_moods))
        .route("/trending", get(get_trending_songs))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let app: Router = home_router.merge(content_routes).fallback(not_found);

    #[cfg(feature = "slowdown")]
    let app = app.layer(middleware::from_fn(slowdown_request));

    app.layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

pub async fn run_server(
    config: ServerConfig,
    index: GuardedSimilarityIndex,
    mood_store: GuardedCatalogStore,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, index, mood_store);

    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
