use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZakladkaError {
    #[error("Annotation fetch failed for {resource_id}: {reason}")]
    FetchFailed { resource_id: String, reason: String },

    #[error("Annotation push failed for {resource_id}: {reason}")]
    PushFailed { resource_id: String, reason: String },

    #[error("Failed to read transcript {path}: {reason}")]
    TranscriptRead { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ZakladkaError>;
