//! Score tables and cross-run merging.
//!
//! A score table is the plain-text ranking a batch run prints: one row per
//! artifact with its total score and score rate. Tables from independent runs
//! are merged by identity key. Both totals and rates are added, so a merged
//! rate can exceed 100; consumers that need a true rate must recompute it.

use serde::{Deserialize, Serialize};

use crate::report::BatchSummary;

/// One artifact's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub name: String,
    pub total: f64,
    pub rate: f64,
}

/// Rows keyed by name, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a batch ranking, keeping its order.
    pub fn from_batch(batch: &BatchSummary) -> Self {
        Self {
            rows: batch
                .entries
                .iter()
                .map(|e| ScoreRow {
                    name: e.name.clone(),
                    total: e.total_score,
                    rate: e.percentage,
                })
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Set a row, replacing an existing row with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, total: f64, rate: f64) {
        let name = name.into();
        match self.rows.iter_mut().find(|r| r.name == name) {
            Some(row) => {
                row.total = total;
                row.rate = rate;
            }
            None => self.rows.push(ScoreRow { name, total, rate }),
        }
    }

    /// Add to a row's scores, creating it from zero if absent.
    fn accumulate(&mut self, name: &str, total: f64, rate: f64) {
        match self.rows.iter_mut().find(|r| r.name == name) {
            Some(row) => {
                row.total += total;
                row.rate += rate;
            }
            None => self.rows.push(ScoreRow {
                name: name.to_string(),
                total,
                rate,
            }),
        }
    }

    /// Stable sort by total, highest first.
    pub fn sort_by_total(&mut self) {
        self.rows.sort_by(|a, b| b.total.total_cmp(&a.total));
    }
}

/// Name of the summary row a batch table ends with.
pub const AVERAGE_ROW_LABEL: &str = "平均分";

fn parse_number(token: &str) -> Option<f64> {
    token.trim_end_matches('%').parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a plain-text score table.
///
/// Blank lines, `==`/`--` separators, header lines and the average row are
/// skipped. A row is any line ending in two numeric columns; its name is
/// everything before them. Lines with only one numeric column are skipped
/// with a warning.
pub fn parse_score_table(content: &str) -> ScoreTable {
    let mut table = ScoreTable::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("==") || line.starts_with("--") {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let tail: Vec<Option<f64>> = tokens
            .iter()
            .rev()
            .take(2)
            .map(|t| parse_number(t))
            .collect();
        match (tokens.len(), tail.as_slice()) {
            (n, [Some(rate), Some(total)]) if n >= 3 => {
                let name = tokens[..n - 2].join(" ");
                if name == AVERAGE_ROW_LABEL {
                    tracing::debug!("skipping average row on line {}", index + 1);
                    continue;
                }
                table.insert(name, *total, *rate);
            }
            (_, tail) if tail.iter().all(Option::is_none) => {
                tracing::debug!("skipping header line {}: {}", index + 1, line);
            }
            _ => {
                tracing::warn!("skipping score table line {}: {}", index + 1, line);
            }
        }
    }

    table
}

/// Merge two tables: totals and rates of rows sharing a name are added, a
/// row missing from one side counts as zero there. The result is ranked by
/// merged total, ties in first-seen order (`a` before `b`).
pub fn merge_scores(a: &ScoreTable, b: &ScoreTable) -> ScoreTable {
    let mut merged = ScoreTable::new();
    for row in a.rows.iter().chain(&b.rows) {
        merged.accumulate(&row.name, row.total, row.rate);
    }
    merged.sort_by_total();
    merged
}
