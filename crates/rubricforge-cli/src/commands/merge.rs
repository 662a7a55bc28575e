//! The `rubricforge merge` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use rubricforge_core::merge::{merge_scores, parse_score_table, ScoreTable};
use rubricforge_core::traits::ReportSink;
use rubricforge_probes::FsReportSink;
use rubricforge_report::render_score_table;

fn read_table(path: &Path) -> Result<ScoreTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read score table: {}", path.display()))?;
    let table = parse_score_table(&content);
    if table.is_empty() {
        tracing::warn!("no score rows in {}", path.display());
    }
    Ok(table)
}

pub fn execute(
    table_a: PathBuf,
    table_b: PathBuf,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let a = read_table(&table_a)?;
    let b = read_table(&table_b)?;
    let merged = merge_scores(&a, &b);
    tracing::info!(
        "merged {} + {} rows into {}",
        a.len(),
        b.len(),
        merged.len()
    );

    let rendered = match format.as_str() {
        "json" => serde_json::to_string_pretty(&merged)? + "\n",
        "text" => render_score_table(&merged),
        other => anyhow::bail!("unknown merge format '{other}' (expected text or json)"),
    };

    match output {
        Some(path) => {
            FsReportSink
                .write(&path, &rendered)
                .context("failed to write merged table")?;
            println!("Merged table: {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
