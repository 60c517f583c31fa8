// src/lib.rs
// Public library surface for the service binary, the CLI and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod moderation;
pub mod notify;
pub mod relevance;
pub mod settings;
pub mod sources;

pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::ingest::{BatchReport, Pipeline};
pub use crate::moderation::{ModerationStore, Moderator};
