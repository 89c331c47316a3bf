use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Scorer error: {0}")]
    Scorer(String),

    #[error("No scorer backend registered for execution mode: {0}")]
    ScorerUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ExplainError>;
