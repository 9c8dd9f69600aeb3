use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure, independent of backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record (or a record it references) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded into a domain type.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// In-memory state lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }
}
