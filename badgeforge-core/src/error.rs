use thiserror::Error;

/// Error type for the badge decoration pipeline.
///
/// Most variants here are recoverable above the point they are raised —
/// per the propagation policy, processors never let one of these escape
/// into the dispatcher, they convert it into a failed `PosterResult`.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("settings error: {0}")]
    Settings(#[from] crate::settings::SettingsError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("on-disk cache error: {0}")]
    Cache(String),

    #[error("poster not found: {0}")]
    PosterNotFound(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("invalid media: {0}")]
    InvalidMedia(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
