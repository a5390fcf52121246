//! Engine error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while loading or validating a personality document. A session
/// that sees one of these keeps running without a personality.
#[derive(Error, Debug)]
pub enum PersonalityError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No personality document in {0}")]
    NotFound(PathBuf),

    #[error("Asset key is not filesystem-safe: {0:?}")]
    InvalidAssetKey(String),

    #[error("Response {id} has invalid weight {weight}")]
    InvalidWeight { id: String, weight: f64 },

    #[error("Duplicate variant {variant} on {role} responder")]
    DuplicateVariant { role: String, variant: String },
}

/// Failures of a single emission channel. Never surfaced past the gate.
#[derive(Error, Debug)]
pub enum EmissionError {
    #[error("Clip not found: {0}")]
    ClipMissing(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Emission timed out after {0:?}")]
    Timeout(Duration),
}
