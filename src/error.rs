/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No candidates returned by search")]
    NoCandidates,

    #[error("No candidates left after filtering")]
    NoneAfterFiltering,
}

impl AppError {
    /// Whether the failure came from an external call that may succeed on a later run.
    ///
    /// Transient failures are logged and the affected candidate or step is skipped;
    /// everything else is fatal for the run.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::HttpClient(_) | AppError::ExternalApi(_))
    }

    /// Process exit code reported by the binary for a failed run.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
