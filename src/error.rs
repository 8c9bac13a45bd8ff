use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the expense store and its helpers.
///
/// Every variant belongs to exactly one [`ErrorKind`], which is what callers
/// branch on when deciding how to present a failure.
#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("could not write {path}: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("could not prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no expenses to export")]
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    NoData,
}

impl ExpenseError {
    pub fn validation(message: impl Into<String>) -> Self {
        ExpenseError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpenseError::Validation(_) => ErrorKind::Validation,
            ExpenseError::Storage(_) | ExpenseError::ExportWrite { .. } | ExpenseError::Io { .. } => {
                ErrorKind::Storage
            }
            ExpenseError::NoData => ErrorKind::NoData,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
