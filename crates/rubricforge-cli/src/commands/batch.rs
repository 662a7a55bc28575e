//! The `rubricforge batch` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use rubricforge_core::engine::{EvalEngine, ProgressReporter};
use rubricforge_core::merge::AVERAGE_ROW_LABEL;
use rubricforge_core::model::Domain;
use rubricforge_core::report::{AggregateReport, BatchSummary};
use rubricforge_core::traits::ReportSink;
use rubricforge_probes::{
    discover_batch_inputs, load_config_from, FsArtifactLoader, FsReportSink,
};
use rubricforge_report::{render_batch_table, write_report};

use super::evaluate::{
    context, load_probes, report_date, resolve_format, resolve_rubric, EvalOptions,
};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_eval_start(&self, name: &str) {
        eprintln!("  Evaluating: {name}");
    }

    fn on_eval_complete(&self, name: &str, report: &AggregateReport) {
        eprintln!(
            "  Done: {name} {}/{} ({}%) {}",
            report.summary.total_score,
            report.summary.max_total_score,
            report.summary.percentage,
            report.summary.grade
        );
    }

    fn on_eval_error(&self, name: &str, error: &str) {
        eprintln!("  ERROR: {name}: {error}");
    }

    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} evaluated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub fn execute(
    dir: PathBuf,
    domain: Domain,
    prefix: Option<String>,
    extension: Option<String>,
    table: Option<PathBuf>,
    reports_dir: Option<PathBuf>,
    options: EvalOptions,
) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;
    let prefix = prefix.unwrap_or_else(|| config.batch_glob_prefix.clone());
    let extension = extension.unwrap_or_else(|| config.batch_extension.clone());

    let inputs = discover_batch_inputs(&dir, &prefix, &extension)
        .with_context(|| format!("failed to scan batch directory {}", dir.display()))?;
    anyhow::ensure!(
        !inputs.is_empty(),
        "no files matching '{prefix}*.{extension}' in {}",
        dir.display()
    );

    let rubric = resolve_rubric(domain, options.rubric.as_deref(), &config)?;
    let ctx = context(load_probes(options.probes.as_deref())?, &options)?;
    let date = report_date(options.date.as_deref())?;

    eprintln!(
        "rubricforge v{}: {} {} input(s) from {}",
        env!("CARGO_PKG_VERSION"),
        inputs.len(),
        domain,
        dir.display()
    );
    eprintln!();

    let engine = EvalEngine::new(rubric);
    let loader = FsArtifactLoader::for_domain(domain);
    let outcome = engine.run_batch(&loader, &inputs, &ctx, date, &ConsoleReporter);

    print_ranking(&outcome.summary);

    if let Some(dir) = reports_dir {
        let format = resolve_format(options.format, &config)?;
        for (name, report) in &outcome.reports {
            let path = dir.join(format!("{name}.{}", format.extension()));
            write_report(report, format, &path, &FsReportSink)?;
        }
        println!("Reports written to: {}", dir.display());
    }

    if let Some(path) = table {
        FsReportSink
            .write(&path, &render_batch_table(&outcome.summary))
            .context("failed to write score table")?;
        println!("Score table: {}", path.display());
    }

    anyhow::ensure!(!outcome.summary.is_empty(), "every input failed to evaluate");
    Ok(())
}

fn print_ranking(summary: &BatchSummary) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "名称", "总分", "得分率", "等级"]);

    for (i, entry) in summary.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.name),
            Cell::new(format!("{}/{}", entry.total_score, entry.max_total_score)),
            Cell::new(format!("{:.2}%", entry.percentage)),
            Cell::new(entry.grade),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new(AVERAGE_ROW_LABEL),
        Cell::new(format!("{:.1}", summary.average_total)),
        Cell::new(format!("{:.2}%", summary.average_percentage)),
        Cell::new(""),
    ]);

    println!("{table}");
    if !summary.failed.is_empty() {
        println!("Failed: {}", summary.failed.join(", "));
    }
}
