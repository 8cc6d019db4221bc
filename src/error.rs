//! Error taxonomy (spec §7). Each kind maps to a retry/surface decision at
//! the task dispatcher and webserver boundary; handlers classify rather than
//! let raw errors escape a task boundary untyped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KoditError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("repository unreachable: {0}")]
    UnreachableRepo(String),

    #[error("authentication failed for {0}")]
    AuthFailure(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("persistence conflict: {0}")]
    PersistenceConflict(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KoditError {
    /// Whether the task queue should retry a task that failed with this
    /// error (spec §4.6/§7). `ParseFailure` never reaches here: it is
    /// recovered locally inside extraction and never surfaced as an error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            KoditError::UnreachableRepo(_)
                | KoditError::Provider(_)
                | KoditError::PersistenceConflict(_)
                | KoditError::Database(_)
                | KoditError::Io(_)
        )
    }

    /// Maps to an HTTP status family for the webserver boundary (spec §7).
    pub fn status_code(&self) -> u16 {
        match self {
            KoditError::Config(_) | KoditError::AuthFailure(_) => 400,
            KoditError::UnreachableRepo(_) => 404,
            KoditError::Cancelled => 499,
            KoditError::Provider(_) | KoditError::PersistenceConflict(_) => 502,
            KoditError::Database(_) | KoditError::Io(_) | KoditError::Fatal(_) => 500,
            KoditError::Other(_) => 500,
        }
    }
}

pub type KoditResult<T> = Result<T, KoditError>;
