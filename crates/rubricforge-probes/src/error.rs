//! Probe error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading probe inputs.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The file extension does not name a supported format.
    #[error("unsupported format for {}: expected .toml or .json", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A Swagger/OpenAPI document could not be read.
    #[error("invalid Swagger document {}: {reason}", path.display())]
    InvalidSwagger { path: PathBuf, reason: String },
}
