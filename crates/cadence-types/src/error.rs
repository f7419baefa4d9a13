use thiserror::Error;

/// Errors related to job definitions and the jobs directory.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found: '{0}'")]
    NotFound(String),

    #[error("job name '{0}' declared more than once")]
    NameConflict(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("job '{0}' does not declare a manual trigger")]
    ManualNotDeclared(String),
}

/// Errors related to secret operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found")]
    NotFound,

    #[error("secret provider unavailable")]
    ProviderUnavailable,

    #[error("encryption error")]
    EncryptionError,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors from repository operations (used by trait definitions in cadence-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
