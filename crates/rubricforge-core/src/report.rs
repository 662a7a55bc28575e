//! Aggregate report types with JSON persistence and batch ranking.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::{round1, round2, Grade, Summary};
use crate::model::Domain;
use crate::results::EvaluationResult;

/// A complete evaluation report for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Report title.
    pub title: String,
    /// Domain of the rubric that produced the report.
    #[serde(default)]
    pub domain: Option<Domain>,
    pub summary: Summary,
    /// Dimension results in rubric order.
    pub dimension_results: Vec<EvaluationResult>,
    /// Recommendations in dimension order.
    pub recommendations: Vec<String>,
}

impl AggregateReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AggregateReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Result for a dimension key.
    pub fn dimension(&self, key: &str) -> Option<&EvaluationResult> {
        self.dimension_results.iter().find(|r| r.key == key)
    }
}

/// One ranked artifact of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Identity key of the artifact.
    pub name: String,
    pub total_score: f64,
    pub max_total_score: f64,
    pub percentage: f64,
    pub grade: Grade,
}

impl BatchEntry {
    pub fn from_report(name: impl Into<String>, report: &AggregateReport) -> Self {
        Self {
            name: name.into(),
            total_score: report.summary.total_score,
            max_total_score: report.summary.max_total_score,
            percentage: report.summary.percentage,
            grade: report.summary.grade,
        }
    }
}

/// Ranking of a batch run plus its averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Sorted by total score, highest first. Ties keep input order.
    pub entries: Vec<BatchEntry>,
    /// Mean total score.
    pub average_total: f64,
    /// Sum of totals over sum of maxima, as a percentage.
    pub average_percentage: f64,
    /// Identity keys that failed to evaluate.
    #[serde(default)]
    pub failed: Vec<String>,
}

impl BatchSummary {
    pub fn new(mut entries: Vec<BatchEntry>, failed: Vec<String>) -> Self {
        entries.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));

        let total: f64 = entries.iter().map(|e| e.total_score).sum();
        let max: f64 = entries.iter().map(|e| e.max_total_score).sum();
        let average_total = if entries.is_empty() {
            0.0
        } else {
            round1(total / entries.len() as f64)
        };
        let average_percentage = if max > 0.0 {
            round2(total / max * 100.0)
        } else {
            0.0
        };

        Self {
            entries,
            average_total,
            average_percentage,
            failed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
