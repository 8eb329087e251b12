//! Error types for the visualizer
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisualizerError {
    /// Configuration rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Color string that is not `#rrggbb` / `#rgb`
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// The scheduler needs a tokio runtime to spawn its tick task
    #[error("No tokio runtime available to drive the scheduler")]
    NoRuntime,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WAV decoding failure, including files that cannot be opened
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, VisualizerError>;
