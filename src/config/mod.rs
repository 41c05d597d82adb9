// src/config/mod.rs
pub mod mood;

pub use mood::{MoodConfig, SourceConfig};
