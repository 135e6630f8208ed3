use std::path::PathBuf;

/// Errors from loading a documentation model.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model file extension is neither yaml/yml nor json.
    #[error("Unsupported model format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}
