//! Filesystem report sink.

use std::path::Path;

use rubricforge_core::error::RubricError;
use rubricforge_core::traits::ReportSink;

/// Writes rendered reports to disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReportSink;

impl ReportSink for FsReportSink {
    fn write(&self, path: &Path, document: &str) -> Result<(), RubricError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RubricError::io(parent, e))?;
        }
        std::fs::write(path, document).map_err(|e| RubricError::io(path, e))?;
        tracing::info!("report written to {}", path.display());
        Ok(())
    }
}
