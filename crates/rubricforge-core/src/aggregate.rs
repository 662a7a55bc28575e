//! Score aggregation and grade classification.
//!
//! Totals are the sum of the one-decimal dimension scores; the percentage is
//! rounded to two decimals and the grade is derived from that rounded value.
//! Rounding is half away from zero throughout.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::results::EvaluationResult;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Shortest display form of a score: `20`, `11.4`, `0.5`.
pub fn display_number(value: f64) -> String {
    let value = round2(value);
    if value == 0.0 {
        // avoids "-0"
        return "0".to_string();
    }
    format!("{value}")
}

/// Letter grade bands over the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Classify a percentage in `[0, 100]`. Lower bounds are inclusive.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Grade::A
        } else if percentage >= 80.0 {
            Grade::B
        } else if percentage >= 70.0 {
            Grade::C
        } else if percentage >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    /// Descriptive label of the band.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "优秀",
            Grade::B => "良好",
            Grade::C => "中等",
            Grade::D => "及格",
            Grade::F => "不及格",
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::F => 'F',
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.letter())
    }
}

/// The summary block of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_score: f64,
    pub max_total_score: f64,
    pub percentage: f64,
    pub grade: Grade,
    pub date: NaiveDate,
}

impl Summary {
    /// Date formatted as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Sum dimension results into a summary.
pub fn summarize(results: &[EvaluationResult], date: NaiveDate) -> Summary {
    let total_score = round1(results.iter().map(|r| round1(r.score)).sum());
    let max_total_score: f64 = results.iter().map(|r| r.max_score).sum();
    let percentage = if max_total_score > 0.0 {
        round2(total_score / max_total_score * 100.0)
    } else {
        tracing::warn!("maximum total score is zero; percentage reported as 0");
        0.0
    };

    Summary {
        total_score,
        max_total_score,
        percentage,
        grade: Grade::from_percentage(percentage),
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: f64, max: f64) -> EvaluationResult {
        EvaluationResult {
            key: "k".into(),
            name: "n".into(),
            max_score: max,
            score,
            rule: String::new(),
            matched: vec![],
            unmatched: vec![],
            facts: vec![],
            detail_lines: vec![],
            shortfalls: vec![],
            flags: vec![],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_percentage(100.0), Grade::A);
        assert_eq!(Grade::from_percentage(90.0), Grade::A);
        assert_eq!(Grade::from_percentage(89.99), Grade::B);
        assert_eq!(Grade::from_percentage(80.0), Grade::B);
        assert_eq!(Grade::from_percentage(79.99), Grade::C);
        assert_eq!(Grade::from_percentage(70.0), Grade::C);
        assert_eq!(Grade::from_percentage(60.0), Grade::D);
        assert_eq!(Grade::from_percentage(59.99), Grade::F);
        assert_eq!(Grade::from_percentage(0.0), Grade::F);
    }

    #[test]
    fn grade_display() {
        assert_eq!(Grade::A.to_string(), "优秀 (A)");
        assert_eq!(Grade::F.to_string(), "不及格 (F)");
    }

    #[test]
    fn rounding_helpers() {
        assert_eq!(round1(11.428_571), 11.4);
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round2(15.204), 15.2);
        assert_eq!(display_number(20.0), "20");
        assert_eq!(display_number(11.4), "11.4");
        assert_eq!(display_number(-0.0), "0");
    }

    #[test]
    fn totals_sum_rounded_scores() {
        let results = vec![result(11.44, 20.0), result(3.36, 10.0), result(0.0, 10.0)];
        let summary = summarize(&results, date());
        assert_eq!(summary.total_score, 14.8);
        assert_eq!(summary.max_total_score, 40.0);
        assert_eq!(summary.percentage, 37.0);
        assert_eq!(summary.grade, Grade::F);
        assert_eq!(summary.date_string(), "2026-03-01");
    }

    #[test]
    fn zero_maximum_does_not_divide() {
        let summary = summarize(&[], date());
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.grade, Grade::F);
    }
}
