use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("output task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for OutputError {
    fn from(value: tokio::task::JoinError) -> Self {
        OutputError::Task(value.to_string())
    }
}
