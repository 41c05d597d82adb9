use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::{MoodEngine, MoodReport};
use crate::mood::SentimentCounts;
use crate::sentiment::{ScoredHeadline, SentimentLabel};

/// Diagnostic header telling whether the batch came from the cache.
pub const CACHE_HEADER: &str = "X-Mood-Cache";

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    engine: Arc<MoodEngine>,
}

impl AppState {
    pub fn new(engine: MoodEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/api/headlines", get(api_headlines))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct HeadlineOut {
    title: String,
    url: String, // "" when the headline has no link
    source: String,
    sentiment_score: f64,
    sentiment_label: SentimentLabel,
}

impl From<ScoredHeadline> for HeadlineOut {
    fn from(h: ScoredHeadline) -> Self {
        Self {
            title: h.title,
            url: h.url.unwrap_or_default(),
            source: h.source,
            sentiment_score: h.sentiment_score,
            sentiment_label: h.sentiment_label,
        }
    }
}

#[derive(serde::Serialize)]
struct HeadlinesResp {
    success: bool,
    headlines: Vec<HeadlineOut>,
    mood_score: f64,
    sentiment_counts: SentimentCounts,
    last_updated: String,
    total_headlines: usize,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    success: bool,
    error: String,
}

impl From<MoodReport> for HeadlinesResp {
    fn from(r: MoodReport) -> Self {
        let total_headlines = r.headlines.len();
        Self {
            success: true,
            headlines: r.headlines.into_iter().map(HeadlineOut::from).collect(),
            mood_score: r.mood.mood_score,
            sentiment_counts: r.mood.sentiment_counts,
            last_updated: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            total_headlines,
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn api_headlines(State(state): State<AppState>) -> Response {
    match state.engine.current_mood().await {
        Ok(report) => {
            let cache = report.cache.as_str();
            ([(CACHE_HEADER, cache)], Json(HeadlinesResp::from(report))).into_response()
        }
        Err(e) => {
            tracing::error!(error = ?e, "headlines request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResp {
                    success: false,
                    error: format!("{e:#}"),
                }),
            )
                .into_response()
        }
    }
}
