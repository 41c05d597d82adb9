// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod metrics;
pub mod mood;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::MoodConfig;
pub use crate::engine::{CacheStatus, MoodEngine};

use anyhow::Context;
use axum::Router;

/// Build the full in-process app (API + /metrics) from environment config.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = MoodConfig::load_default().context("loading mood config")?;
    let engine = MoodEngine::from_config(&cfg)?;
    let metrics = crate::metrics::Metrics::init(cfg.validity_window_secs)?;
    Ok(router(AppState::new(engine)).merge(metrics.router()))
}
