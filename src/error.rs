// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("malformed structure: {0}")]
    MalformedStructure(String),

    #[error("no safe transform for region at lines {line_start}-{line_end}: {reason}")]
    TransformInfeasible {
        line_start: usize,
        line_end: usize,
        reason: String,
    },

    #[error("validation exhausted after {attempts} repair attempts: {last_error}")]
    ValidationExhausted { attempts: usize, last_error: String },

    #[error("I/O error: {source} (path: {})", path.display())]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Generic error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RefactorError>;

// Allow `?` on std::io::Error by converting to RefactorError::Io with unknown path.
impl From<std::io::Error> for RefactorError {
    fn from(source: std::io::Error) -> Self {
        RefactorError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

// Gracefully convert WalkDir errors
impl From<walkdir::Error> for RefactorError {
    fn from(e: walkdir::Error) -> Self {
        RefactorError::Other(e.to_string())
    }
}

impl RefactorError {
    /// Returns true if this error is recoverable at the unit level
    /// (the region is left unmodified and siblings keep processing).
    #[must_use]
    pub fn is_region_local(&self) -> bool {
        matches!(
            self,
            RefactorError::MalformedStructure(_)
                | RefactorError::TransformInfeasible { .. }
                | RefactorError::ValidationExhausted { .. }
        )
    }
}
