//! Error types for rubric loading and artifact access.
//!
//! Loaders and sinks return [`RubricError`] so callers can tell a missing
//! artifact apart from an unreadable one without string matching.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading artifacts, writing reports or building rubrics.
#[derive(Debug, Error)]
pub enum RubricError {
    /// The artifact path does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing a file failed.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A detector pattern failed to compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The rubric definition is structurally invalid.
    #[error("invalid rubric: {0}")]
    InvalidRubric(String),
}

impl RubricError {
    /// Build an [`RubricError::Io`] for `path`, mapping `NotFound` I/O errors
    /// to [`RubricError::NotFound`].
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            RubricError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            RubricError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Returns `true` if the error means the input does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RubricError::NotFound { .. })
    }
}
