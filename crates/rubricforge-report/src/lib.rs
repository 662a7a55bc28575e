//! Report rendering.
//!
//! Renders an [`AggregateReport`] as Markdown (the canonical document), a
//! self-contained HTML page or pretty JSON, and renders score tables in the
//! fixed-width layout that `merge` reads back.

pub mod html;
pub mod markdown;
pub mod table;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};

use rubricforge_core::report::AggregateReport;
use rubricforge_core::traits::ReportSink;

pub use html::generate_html;
pub use markdown::render_markdown;
pub use table::{render_batch_table, render_score_table};

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Markdown,
    Html,
    Json,
    /// Every document format, side by side.
    All,
}

impl ReportFormat {
    /// File extension of a single document format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown | ReportFormat::All => "md",
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
        }
    }

    /// The document formats this format expands to.
    pub fn documents(&self) -> &'static [ReportFormat] {
        match self {
            ReportFormat::Markdown => &[ReportFormat::Markdown],
            ReportFormat::Html => &[ReportFormat::Html],
            ReportFormat::Json => &[ReportFormat::Json],
            ReportFormat::All => &[
                ReportFormat::Markdown,
                ReportFormat::Html,
                ReportFormat::Json,
            ],
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => write!(f, "markdown"),
            ReportFormat::Html => write!(f, "html"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::All => write!(f, "all"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            "all" => Ok(ReportFormat::All),
            other => Err(format!(
                "unknown report format '{other}' (expected markdown, html, json or all)"
            )),
        }
    }
}

/// Render one document format.
pub fn render(report: &AggregateReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Markdown => Ok(render_markdown(report)),
        ReportFormat::Html => Ok(generate_html(report)),
        ReportFormat::Json => {
            serde_json::to_string_pretty(report).context("failed to serialize report")
        }
        ReportFormat::All => anyhow::bail!("'all' is not a single document format"),
    }
}

/// Render and persist a report.
///
/// A single format is written to `path` as given. `all` writes one file per
/// document format next to each other, named by swapping the extension of
/// `path`. Returns the written paths in format order.
pub fn write_report(
    report: &AggregateReport,
    format: ReportFormat,
    path: &Path,
    sink: &dyn ReportSink,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for document in format.documents() {
        let target = if format == ReportFormat::All {
            path.with_extension(document.extension())
        } else {
            path.to_path_buf()
        };
        let content = render(report, *document)?;
        sink.write(&target, &content)
            .with_context(|| format!("failed to save {document} report"))?;
        tracing::debug!("wrote {document} report to {}", target.display());
        written.push(target);
    }
    Ok(written)
}
