use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoverError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Ambiguous account match: {0}")]
    AmbiguousMatch(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RecoverError>;
