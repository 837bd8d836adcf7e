use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("flashcard {0} not found")]
    FlashcardNotFound(i64),

    #[error("session {0} not found")]
    SessionNotFound(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// SQLite reports contention as busy/locked; those reads are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
