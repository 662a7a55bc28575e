//! The per-domain evaluation commands (`requirement`, `frontend`, `backend`,
//! `bug`, `project`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Args;

use rubricforge_core::engine::EvalEngine;
use rubricforge_core::model::{Artifact, Document, Domain};
use rubricforge_core::parser::{builtin_rubric, parse_rubric};
use rubricforge_core::report::AggregateReport;
use rubricforge_core::rubric::Rubric;
use rubricforge_core::traits::{ArtifactLoader, EvalContext, Probes, TestRunner};
use rubricforge_probes::{
    load_config_from, swagger, FsArtifactLoader, FsReportSink, PatternTestRunner,
    RecordedProbes, RubricforgeConfig,
};
use rubricforge_report::{write_report, ReportFormat};

/// Options shared by every evaluation command.
#[derive(Args, Debug, Clone, Default)]
pub struct EvalOptions {
    /// Report format: markdown, html, json, all (default from config)
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// Rubric file replacing the built-in rubric
    #[arg(long)]
    pub rubric: Option<PathBuf>,

    /// Recorded probe results (.toml or .json)
    #[arg(long)]
    pub probes: Option<PathBuf>,

    /// Time the work took, in seconds
    #[arg(long, conflicts_with = "started_at")]
    pub elapsed_secs: Option<f64>,

    /// When the work started (RFC 3339); elapsed time runs until now
    #[arg(long)]
    pub started_at: Option<String>,

    /// Report date, YYYY-MM-DD (default: today)
    #[arg(long)]
    pub date: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// What to evaluate.
#[derive(Debug, Clone)]
pub enum Target {
    Requirement {
        file: PathBuf,
    },
    Frontend {
        file: PathBuf,
    },
    Backend {
        dir: PathBuf,
        swagger: Option<PathBuf>,
        tests: Option<PathBuf>,
    },
    Bug {
        buggy: PathBuf,
        fixed: PathBuf,
    },
    Project {
        dir: PathBuf,
    },
}

impl Target {
    pub fn domain(&self) -> Domain {
        match self {
            Target::Requirement { .. } => Domain::Requirement,
            Target::Frontend { .. } => Domain::Frontend,
            Target::Backend { .. } => Domain::Backend,
            Target::Bug { .. } => Domain::Bug,
            Target::Project { .. } => Domain::Project,
        }
    }

    fn load(&self) -> Result<Artifact> {
        let loader = FsArtifactLoader::for_domain(self.domain());
        match self {
            Target::Requirement { file } | Target::Frontend { file } => load_with(&loader, file),
            Target::Backend { dir, .. } | Target::Project { dir } => load_with(&loader, dir),
            Target::Bug { buggy, fixed } => {
                let buggy = load_with(&loader, buggy)?;
                let fixed = load_with(&loader, fixed)?;
                Ok(Artifact::from_documents(
                    prefixed("buggy", &buggy)
                        .chain(prefixed("fixed", &fixed))
                        .collect(),
                ))
            }
        }
    }
}

fn load_with(loader: &dyn ArtifactLoader, path: &Path) -> Result<Artifact> {
    loader
        .load(path)
        .with_context(|| format!("failed to load artifact {}", path.display()))
}

fn prefixed<'a>(prefix: &'a str, artifact: &'a Artifact) -> impl Iterator<Item = Document> + 'a {
    artifact.documents().iter().map(move |d| Document {
        path: format!("{prefix}/{}", d.path),
        content: d.content.clone(),
    })
}

pub fn execute(target: Target, output: Option<PathBuf>, options: EvalOptions) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;
    let domain = target.domain();

    let artifact = target.load()?;
    let rubric = resolve_rubric(domain, options.rubric.as_deref(), &config)?;
    let recorded = load_probes(options.probes.as_deref())?;

    let mut ctx = context(recorded.clone(), &options)?;
    if let Target::Backend {
        swagger: swagger_doc,
        tests,
        ..
    } = &target
    {
        if let Some(total) = swagger_doc.as_deref().and_then(swagger_total) {
            ctx.expected_total = Some(total);
        }
        let recorded_tests = recorded.as_ref().is_some_and(|r| r.has_tests());
        if !recorded_tests {
            ctx.probes.tests = pattern_runner(tests.as_deref())?;
        }
    }

    let date = report_date(options.date.as_deref())?;
    let report = EvalEngine::new(rubric).run(&artifact, &ctx, date)?;

    let format = resolve_format(options.format, &config)?;
    let path = output.unwrap_or_else(|| default_output(domain, format, &config));
    let written = write_report(&report, format, &path, &FsReportSink)?;

    print_summary(&report, &written);
    Ok(())
}

/// Expected API total from a Swagger document, `None` when it is unusable.
fn swagger_total(path: &Path) -> Option<u64> {
    match swagger::count_operations(path) {
        Ok(0) => {
            tracing::warn!(
                "{} documents no API operations, keeping the rubric's expected total",
                path.display()
            );
            None
        }
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("ignoring Swagger document: {e:#}");
            None
        }
    }
}

fn pattern_runner(tests: Option<&Path>) -> Result<Arc<dyn TestRunner>> {
    let runner = PatternTestRunner::backend_defaults()?;
    let runner = match tests {
        Some(dir) => {
            let sources = load_with(&FsArtifactLoader::for_domain(Domain::Backend), dir)?;
            runner.with_sources(sources)
        }
        None => runner,
    };
    Ok(Arc::new(runner))
}

/// Rubric precedence: explicit file, config override, built-in.
pub fn resolve_rubric(
    domain: Domain,
    explicit: Option<&Path>,
    config: &RubricforgeConfig,
) -> Result<Rubric> {
    let rubric = match explicit.or_else(|| config.rubric_for(domain)) {
        Some(path) => parse_rubric(path)?,
        None => builtin_rubric(domain)?,
    };
    if let Some(declared) = rubric.domain {
        if declared != domain {
            tracing::warn!(
                "rubric '{}' was written for {declared}, applying it to {domain}",
                rubric.title
            );
        }
    }
    Ok(rubric)
}

pub fn load_probes(path: Option<&Path>) -> Result<Option<Arc<RecordedProbes>>> {
    path.map(|p| RecordedProbes::load(p).map(Arc::new)).transpose()
}

/// Evaluation context from recorded probes and timing options.
pub fn context(
    recorded: Option<Arc<RecordedProbes>>,
    options: &EvalOptions,
) -> Result<EvalContext> {
    let probes = match recorded {
        Some(recorded) => Probes::shared(recorded),
        None => Probes::none(),
    };
    Ok(EvalContext {
        probes,
        elapsed_secs: elapsed_secs(options, Utc::now())?,
        expected_total: None,
    })
}

fn elapsed_secs(options: &EvalOptions, now: DateTime<Utc>) -> Result<Option<f64>> {
    if let Some(secs) = options.elapsed_secs {
        anyhow::ensure!(secs >= 0.0, "--elapsed-secs must not be negative");
        return Ok(Some(secs));
    }
    let Some(started) = &options.started_at else {
        return Ok(None);
    };
    let started = DateTime::parse_from_rfc3339(started)
        .with_context(|| format!("invalid --started-at '{started}', expected RFC 3339"))?;
    let elapsed = now.signed_duration_since(started.with_timezone(&Utc));
    anyhow::ensure!(
        elapsed.num_milliseconds() >= 0,
        "--started-at lies in the future"
    );
    Ok(Some(elapsed.num_milliseconds() as f64 / 1000.0))
}

pub fn report_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .with_context(|| format!("invalid --date '{d}', expected YYYY-MM-DD")),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn resolve_format(
    explicit: Option<ReportFormat>,
    config: &RubricforgeConfig,
) -> Result<ReportFormat> {
    match explicit {
        Some(format) => Ok(format),
        None => config
            .format
            .parse()
            .map_err(|e: String| anyhow::anyhow!("invalid format in config: {e}")),
    }
}

/// `<output_dir>/<profile report file>`, with the extension of the format.
fn default_output(domain: Domain, format: ReportFormat, config: &RubricforgeConfig) -> PathBuf {
    config
        .output_dir
        .join(domain.default_report_file())
        .with_extension(format.extension())
}

fn print_summary(report: &AggregateReport, written: &[PathBuf]) {
    let summary = &report.summary;
    println!("评估完成!");
    println!("总分: {}/{}", summary.total_score, summary.max_total_score);
    println!("得分率: {}%", summary.percentage);
    println!("等级: {}", summary.grade);
    for path in written {
        println!("报告已保存: {}", path.display());
    }
}
