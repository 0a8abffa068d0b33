//! Error types for the editing core.
//!
//! Async pipelines return these; synchronous per-element operations never
//! do. They report whether anything changed and log the rest.

use tc_core::SnapshotError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load image `{src}`: {reason}")]
    Image { src: String, reason: String },
    #[error("failed to read video metadata `{src}`: {reason}")]
    Video { src: String, reason: String },
    #[error("image child `{0}` has no source")]
    MissingSource(String),
    #[error("template `{0}` not found")]
    TemplateNotFound(String),
    #[error("superseded by a newer template load")]
    Superseded,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MediaError {
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    #[error("media source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("rasterizer failed: {0}")]
    Rasterizer(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
