use polars::prelude::PolarsError;

/// Errors surfaced by the ranker library. Scoring itself never fails; these
/// come from configuration loading and table I/O.
#[derive(Debug, thiserror::Error)]
pub enum RankerError {
    #[error("Invalid scoring configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Table(#[from] PolarsError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RankerResult<T> = Result<T, RankerError>;
