// src/ingest/providers/mod.rs
pub mod html_page;
