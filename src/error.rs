use std::path::PathBuf;
use thiserror::Error;

use crate::types::FailureKind;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unrecognized input (not a directory, ZIP or TAR): {0}")]
    UnrecognizedInput(PathBuf),

    #[error("Cannot open archive {path}: {reason}")]
    ArchiveOpen { path: PathBuf, reason: String },

    #[error("Invalid output directory {path}: {reason}")]
    OutputDir { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("WalkDir error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CatalogError {
    pub fn archive_open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CatalogError::ArchiveOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogError::UnrecognizedInput(_) => FailureKind::UnrecognizedInput,
            CatalogError::ArchiveOpen { .. } => FailureKind::ArchiveOpen,
            CatalogError::OutputDir { .. } => FailureKind::OutputDir,
            CatalogError::Io(_) | CatalogError::Walk(_) => FailureKind::Io,
            CatalogError::Sqlite(_) | CatalogError::Csv(_) => FailureKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
