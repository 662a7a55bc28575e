//! Evaluation pipeline orchestrator.
//!
//! Runs every dimension of a rubric against one artifact in order, then
//! aggregates, recommends and packages the result. Batch mode repeats this
//! sequentially over many artifacts and ranks them.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::aggregate::summarize;
use crate::model::Artifact;
use crate::recommend::recommend;
use crate::report::{AggregateReport, BatchEntry, BatchSummary};
use crate::results::EvaluationResult;
use crate::rubric::Rubric;
use crate::scoring::evaluate_dimension;
use crate::traits::{ArtifactLoader, EvalContext};

/// Progress reporting trait for batch runs.
pub trait ProgressReporter: Send + Sync {
    fn on_eval_start(&self, name: &str);
    fn on_eval_complete(&self, name: &str, report: &AggregateReport);
    fn on_eval_error(&self, name: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);

    /// Checked before each evaluation; returning `false` stops the batch.
    fn should_continue(&self) -> bool {
        true
    }
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_eval_start(&self, _: &str) {}
    fn on_eval_complete(&self, _: &str, _: &AggregateReport) {}
    fn on_eval_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// One artifact of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    /// Identity key used in the ranking.
    pub name: String,
    pub path: PathBuf,
}

/// Everything a batch run produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    /// Individual reports in input order.
    pub reports: Vec<(String, AggregateReport)>,
}

/// Evaluates artifacts against one rubric.
pub struct EvalEngine {
    rubric: Rubric,
}

impl EvalEngine {
    pub fn new(rubric: Rubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Evaluate every dimension, in rubric order.
    pub fn evaluate(
        &self,
        artifact: &Artifact,
        ctx: &EvalContext,
    ) -> Result<Vec<EvaluationResult>> {
        self.rubric
            .dimensions
            .iter()
            .map(|dim| {
                evaluate_dimension(dim, artifact, ctx)
                    .with_context(|| format!("failed to evaluate dimension '{}'", dim.key))
            })
            .collect()
    }

    /// Evaluate an artifact and build its report.
    pub fn run(
        &self,
        artifact: &Artifact,
        ctx: &EvalContext,
        date: NaiveDate,
    ) -> Result<AggregateReport> {
        let results = self.evaluate(artifact, ctx)?;
        let summary = summarize(&results, date);
        let recommendations = recommend(&self.rubric, &results);

        tracing::info!(
            "{}: {}/{} ({}%) {}",
            self.rubric.title,
            summary.total_score,
            summary.max_total_score,
            summary.percentage,
            summary.grade
        );

        Ok(AggregateReport {
            title: self.rubric.title.clone(),
            domain: self.rubric.domain,
            summary,
            dimension_results: results,
            recommendations,
        })
    }

    /// Load and evaluate each input in order, then rank them.
    ///
    /// Inputs that fail to load or evaluate are reported to `progress`,
    /// listed in [`BatchSummary::failed`] and otherwise skipped.
    pub fn run_batch(
        &self,
        loader: &dyn ArtifactLoader,
        inputs: &[BatchInput],
        ctx: &EvalContext,
        date: NaiveDate,
        progress: &dyn ProgressReporter,
    ) -> BatchOutcome {
        let start = Instant::now();
        let mut reports = Vec::new();
        let mut failed = Vec::new();

        for input in inputs {
            if !progress.should_continue() {
                tracing::info!("batch stopped before {}", input.name);
                break;
            }
            progress.on_eval_start(&input.name);

            let outcome = loader
                .load(&input.path)
                .map_err(anyhow::Error::from)
                .and_then(|artifact| self.run(&artifact, ctx, date));
            match outcome {
                Ok(report) => {
                    progress.on_eval_complete(&input.name, &report);
                    reports.push((input.name.clone(), report));
                }
                Err(e) => {
                    tracing::error!("evaluation failed for {}: {e:#}", input.name);
                    progress.on_eval_error(&input.name, &format!("{e:#}"));
                    failed.push(input.name.clone());
                }
            }
        }

        progress.on_batch_complete(inputs.len(), reports.len(), failed.len(), start.elapsed());

        let entries = reports
            .iter()
            .map(|(name, report)| BatchEntry::from_report(name.clone(), report))
            .collect();

        BatchOutcome {
            summary: BatchSummary::new(entries, failed),
            reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;
    use crate::error::RubricError;
    use crate::model::Domain;
    use crate::parser::builtin_rubric;

    struct MapLoader(Vec<(&'static str, &'static str)>);

    impl ArtifactLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<Artifact, RubricError> {
            let key = path.to_string_lossy();
            self.0
                .iter()
                .find(|(p, _)| *p == key)
                .map(|(p, text)| Artifact::from_text(*p, *text))
                .ok_or_else(|| RubricError::NotFound {
                    path: path.to_path_buf(),
                })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
        stop_after: Option<usize>,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_eval_start(&self, name: &str) {
            self.events.lock().unwrap().push(format!("start {name}"));
        }
        fn on_eval_complete(&self, name: &str, _: &AggregateReport) {
            self.events.lock().unwrap().push(format!("done {name}"));
        }
        fn on_eval_error(&self, name: &str, _: &str) {
            self.events.lock().unwrap().push(format!("error {name}"));
        }
        fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, _: Duration) {
            self.events
                .lock()
                .unwrap()
                .push(format!("batch {total}/{completed}/{failed}"));
        }
        fn should_continue(&self) -> bool {
            match self.stop_after {
                Some(n) => {
                    let started = self
                        .events
                        .lock()
                        .unwrap()
                        .iter()
                        .filter(|e| e.starts_with("start"))
                        .count();
                    started < n
                }
                None => true,
            }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    fn input(name: &str) -> BatchInput {
        BatchInput {
            name: name.into(),
            path: PathBuf::from(name),
        }
    }

    const RICH: &str = "用户注册 登录 书籍搜索 发布图书 自提 自付款 分类浏览 订单管理 图书详情 个人中心";

    #[test]
    fn run_produces_ordered_report() {
        let engine = EvalEngine::new(builtin_rubric(Domain::Requirement).unwrap());
        let artifact = Artifact::from_text("需求说明.md", RICH);
        let report = engine.run(&artifact, &EvalContext::default(), date()).unwrap();

        assert_eq!(report.title, "需求分析评估报告");
        assert_eq!(report.domain, Some(Domain::Requirement));
        assert_eq!(report.dimension_results.len(), 5);
        assert_eq!(report.dimension_results[0].key, "function_coverage");
        assert_eq!(report.dimension_results[0].score, 20.0);
        assert_eq!(report.summary.max_total_score, 75.0);
        let sum: f64 = report.dimension_results.iter().map(|r| r.score).sum();
        assert!((report.summary.total_score - sum).abs() < 1e-9);
    }

    #[test]
    fn run_is_deterministic() {
        let engine = EvalEngine::new(builtin_rubric(Domain::Requirement).unwrap());
        let artifact = Artifact::from_text("a.md", "## 功能需求\n系统应当支持 10 个用户");
        let a = engine.run(&artifact, &EvalContext::default(), date()).unwrap();
        let b = engine.run(&artifact, &EvalContext::default(), date()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_ranks_and_skips_failures() {
        let engine = EvalEngine::new(builtin_rubric(Domain::Requirement).unwrap());
        let loader = MapLoader(vec![("weak", "登录"), ("strong", RICH)]);
        let reporter = RecordingReporter::default();
        let outcome = engine.run_batch(
            &loader,
            &[input("weak"), input("missing"), input("strong")],
            &EvalContext::default(),
            date(),
            &reporter,
        );

        let names: Vec<_> = outcome
            .summary
            .entries
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["strong", "weak"]);
        assert_eq!(outcome.summary.failed, vec!["missing"]);
        assert_eq!(outcome.reports[0].0, "weak");

        let events = reporter.events.lock().unwrap();
        assert!(events.contains(&"error missing".to_string()));
        assert_eq!(events.last().unwrap(), "batch 3/2/1");
    }

    #[test]
    fn batch_stops_when_reporter_cancels() {
        let engine = EvalEngine::new(builtin_rubric(Domain::Requirement).unwrap());
        let loader = MapLoader(vec![("a", "登录"), ("b", "登录")]);
        let reporter = RecordingReporter {
            stop_after: Some(1),
            ..RecordingReporter::default()
        };
        let outcome = engine.run_batch(
            &loader,
            &[input("a"), input("b")],
            &EvalContext::default(),
            date(),
            &reporter,
        );
        assert_eq!(outcome.summary.entries.len(), 1);
        assert_eq!(outcome.reports[0].0, "a");
    }
}
