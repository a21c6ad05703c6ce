#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("reset required: {0}")]
    ResetRequired(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ResetRequired(_) => "RESET_REQUIRED",
            Self::Io(_) | Self::Sql(_) | Self::Corrupt(_) => "STORE_ERROR",
        }
    }

    pub(crate) fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id} does not exist"))
    }

    pub(crate) fn missing_parent(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::Validation(format!("referenced {kind} {id} does not exist"))
    }
}
