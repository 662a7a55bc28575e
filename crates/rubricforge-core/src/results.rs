//! Per-dimension evaluation results.

use serde::{Deserialize, Serialize};

/// The outcome of evaluating one dimension. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Dimension key.
    pub key: String,
    /// Dimension display name.
    pub name: String,
    pub max_score: f64,
    /// In `[0, max_score]`, rounded to one decimal.
    pub score: f64,
    /// Restated scoring rule.
    pub rule: String,
    /// Items that were found, in configured order.
    #[serde(default)]
    pub matched: Vec<String>,
    /// Items that were missing or weak, in configured order.
    #[serde(default)]
    pub unmatched: Vec<String>,
    /// Summary facts for the "评估结果" block.
    #[serde(default)]
    pub facts: Vec<Fact>,
    /// Human-readable lines in evaluation order.
    #[serde(default)]
    pub detail_lines: Vec<String>,
    #[serde(default)]
    pub shortfalls: Vec<Shortfall>,
    #[serde(default)]
    pub flags: Vec<QualityFlag>,
}

impl EvaluationResult {
    /// Score as a fraction of the maximum (0 when the maximum is 0).
    pub fn fraction(&self) -> f64 {
        if self.max_score > 0.0 {
            self.score / self.max_score
        } else {
            0.0
        }
    }
}

/// A labelled value shown under "评估结果".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub label: String,
    pub value: String,
}

/// A counted gap, such as unfixed bugs or failed tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    #[serde(default)]
    pub label: Option<String>,
    pub count: u64,
}

/// Qualitative problems a dimension can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualityFlag {
    /// The fix introduced defects that were not there before.
    IntroducedNewDefects,
}
