//! TOML rubric parser.
//!
//! Loads rubrics from TOML files (or the built-in profiles), rejects
//! definitions that cannot be scored, and reports suspicious ones through
//! [`validate_rubric`].

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::RegexBuilder;
use serde::Deserialize;

use crate::error::RubricError;
use crate::model::{Detector, Domain};
use crate::rubric::{
    Advice, AnalyzerAspects, Aspect, BonusTier, Bucket, CategoryPassRate, ContextualCriterion,
    ContextualKeyword, Criterion, DensityCategory, DensityTier, Dimension, DisplayUnit,
    FactLabels, FixQuality, LowScoreAdvice, MatchDensity, Measure, OutcomeScore,
    PatternCategory, PriorityAdvice, Ratio, Rubric, Scoring, Section, ShortfallMode,
    StructuralQuality, TallySource, ThresholdBucket, TieredCategoryCount, WeightedCategory,
};

/// Intermediate TOML structure for parsing rubric files.
#[derive(Debug, Deserialize)]
struct TomlRubricFile {
    rubric: TomlRubricHeader,
    #[serde(default)]
    dimensions: Vec<TomlDimension>,
}

#[derive(Debug, Deserialize)]
struct TomlRubricHeader {
    #[serde(default)]
    domain: Option<String>,
    title: String,
    fallback: String,
}

#[derive(Debug, Deserialize)]
struct TomlDimension {
    key: String,
    name: String,
    max_score: f64,
    #[serde(default)]
    rule: String,
    #[serde(default = "default_item_label")]
    item_label: String,
    #[serde(default)]
    labels: TomlLabels,
    scoring: TomlScoring,
    #[serde(default)]
    advice: TomlAdvice,
}

fn default_item_label() -> String {
    "项目".to_string()
}

#[derive(Debug, Default, Deserialize)]
struct TomlLabels {
    #[serde(default)]
    matched: Option<String>,
    #[serde(default)]
    unmatched: Option<String>,
    #[serde(default)]
    total: Option<String>,
    #[serde(default)]
    breakdown: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
enum TomlScoring {
    BinaryEqualWeight {
        criteria: Vec<TomlCriterion>,
    },
    WeightedKeyword {
        criteria: Vec<TomlCriterion>,
    },
    StructuralQuality {
        sections: Vec<TomlSection>,
        #[serde(default = "default_heading_marker")]
        heading_marker: String,
        #[serde(default = "default_presence_points")]
        presence_points: f64,
        #[serde(default = "default_one")]
        context_points: f64,
        #[serde(default = "default_one")]
        length_points: f64,
        #[serde(default = "default_scale")]
        scale: f64,
        #[serde(default = "default_min_context_matches")]
        min_context_matches: usize,
    },
    TieredCategoryCount {
        categories: Vec<TomlPatternCategory>,
        per_category_cap: f64,
        #[serde(default)]
        bonus_tiers: Vec<TomlBonusTier>,
    },
    ThresholdBucket {
        measure: String,
        buckets: Vec<TomlBucket>,
        subject: String,
        #[serde(default)]
        unit: Option<String>,
    },
    ContextualKeyword {
        criteria: Vec<TomlContextualCriterion>,
        base: f64,
        step: f64,
        cap: f64,
    },
    Ratio {
        source: String,
        #[serde(default)]
        patterns: Vec<String>,
        #[serde(default)]
        expected_total: Option<u64>,
        #[serde(default)]
        shortfall_label: Option<String>,
    },
    CategoryPassRate {
        categories: Vec<TomlWeightedCategory>,
        #[serde(default)]
        shortfall: Option<String>,
        #[serde(default = "default_true")]
        overall_line: bool,
    },
    MatchDensity {
        categories: Vec<TomlDensityCategory>,
        tiers: Vec<TomlDensityTier>,
        #[serde(default)]
        weak_below: usize,
    },
    AnalyzerAspects {
        aspects: Vec<TomlAspect>,
        #[serde(default = "default_low_below")]
        low_below: f64,
    },
    FixQuality {
        outcomes: Vec<TomlOutcome>,
    },
    Composite {
        parts: Vec<TomlDimension>,
    },
}

fn default_heading_marker() -> String {
    "##".to_string()
}

fn default_presence_points() -> f64 {
    2.0
}

fn default_one() -> f64 {
    1.0
}

fn default_scale() -> f64 {
    4.0
}

fn default_min_context_matches() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_low_below() -> f64 {
    0.7
}

#[derive(Debug, Deserialize)]
struct TomlCriterion {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default = "default_one")]
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct TomlSection {
    name: String,
    weight: f64,
    #[serde(default)]
    context: Vec<String>,
    #[serde(default)]
    min_body_chars: usize,
}

#[derive(Debug, Deserialize)]
struct TomlPatternCategory {
    name: String,
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlBonusTier {
    min_total: usize,
    bonus: f64,
}

#[derive(Debug, Deserialize)]
struct TomlBucket {
    #[serde(default)]
    below: Option<f64>,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct TomlContextualCriterion {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    context: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlWeightedCategory {
    name: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct TomlDensityCategory {
    name: String,
    weight: f64,
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct TomlDensityTier {
    above: usize,
    fraction: f64,
}

#[derive(Debug, Deserialize)]
struct TomlAspect {
    name: String,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct TomlOutcome {
    completely_fixed: bool,
    introduced_new_defects: bool,
    score: f64,
}

#[derive(Debug, Default, Deserialize)]
struct TomlAdvice {
    #[serde(default)]
    missing: Option<String>,
    #[serde(default)]
    per_item: Option<String>,
    #[serde(default)]
    priority: Option<TomlPriority>,
    #[serde(default)]
    shortfall: Option<String>,
    #[serde(default)]
    flagged: Option<String>,
    #[serde(default)]
    low_score: Option<TomlLowScore>,
}

#[derive(Debug, Deserialize)]
struct TomlPriority {
    threshold: f64,
    template: String,
    secondary: String,
}

#[derive(Debug, Deserialize)]
struct TomlLowScore {
    below: f64,
    message: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parse a single TOML file into a `Rubric`.
pub fn parse_rubric(path: &Path) -> Result<Rubric> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rubric file: {}", path.display()))?;

    parse_rubric_str(&content, path)
}

/// Parse a TOML string into a `Rubric` (useful for testing).
pub fn parse_rubric_str(content: &str, source_path: &Path) -> Result<Rubric> {
    let parsed: TomlRubricFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let domain = parsed
        .rubric
        .domain
        .map(|d| d.parse::<Domain>().map_err(RubricError::InvalidRubric))
        .transpose()?;

    let dimensions = parsed
        .dimensions
        .into_iter()
        .map(build_dimension)
        .collect::<Result<Vec<_>, RubricError>>()
        .with_context(|| format!("invalid rubric: {}", source_path.display()))?;

    Ok(Rubric {
        domain,
        title: parsed.rubric.title,
        dimensions,
        fallback: parsed.rubric.fallback,
    })
}

/// TOML source of a built-in domain rubric.
pub fn builtin_rubric_source(domain: Domain) -> &'static str {
    match domain {
        Domain::Requirement => include_str!("../rubrics/requirement.toml"),
        Domain::Frontend => include_str!("../rubrics/frontend.toml"),
        Domain::Backend => include_str!("../rubrics/backend.toml"),
        Domain::Bug => include_str!("../rubrics/bug.toml"),
        Domain::Project => include_str!("../rubrics/project.toml"),
    }
}

/// Parse the built-in rubric for a domain.
pub fn builtin_rubric(domain: Domain) -> Result<Rubric> {
    let label = format!("<builtin:{domain}>");
    parse_rubric_str(builtin_rubric_source(domain), Path::new(&label))
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

fn invalid(key: &str, message: impl std::fmt::Display) -> RubricError {
    RubricError::InvalidRubric(format!("dimension '{key}': {message}"))
}

fn detector(
    key: &str,
    keyword: Option<String>,
    pattern: Option<String>,
) -> Result<(String, Detector), RubricError> {
    match (keyword, pattern) {
        (Some(keyword), None) => Ok((keyword.clone(), Detector::keyword(keyword))),
        (None, Some(pattern)) => {
            let det = Detector::pattern(&pattern)?;
            Ok((pattern, det))
        }
        (Some(_), Some(_)) => Err(invalid(key, "criterion has both keyword and pattern")),
        (None, None) => Err(invalid(key, "criterion needs a keyword or a pattern")),
    }
}

fn positive(key: &str, what: &str, value: f64) -> Result<f64, RubricError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(key, format!("{what} must be positive, got {value}")))
    }
}

fn build_criteria(key: &str, raw: Vec<TomlCriterion>) -> Result<Vec<Criterion>, RubricError> {
    raw.into_iter()
        .map(|c| {
            let (default_name, detector) = detector(key, c.keyword, c.pattern)?;
            let name = c.name.unwrap_or(default_name);
            let weight = positive(key, &format!("weight of '{name}'"), c.weight)?;
            Ok(Criterion {
                name,
                weight,
                detector,
            })
        })
        .collect()
}

fn build_buckets(key: &str, raw: Vec<TomlBucket>) -> Result<Vec<Bucket>, RubricError> {
    let mut buckets = Vec::with_capacity(raw.len());
    let mut previous: Option<f64> = None;
    for (index, b) in raw.iter().enumerate() {
        let last = index + 1 == raw.len();
        if !b.score.is_finite() {
            return Err(invalid(key, "bucket scores must be finite numbers"));
        }
        match (b.below, last) {
            (Some(bound), _) if !bound.is_finite() => {
                return Err(invalid(key, "bucket bounds must be finite numbers"));
            }
            (Some(bound), false) => {
                if previous.is_some_and(|p| bound <= p) {
                    return Err(invalid(key, "bucket bounds must be strictly ascending"));
                }
                previous = Some(bound);
            }
            (None, true) => {}
            (Some(_), true) => {
                return Err(invalid(key, "the last bucket must be unbounded"));
            }
            (None, false) => {
                return Err(invalid(key, "only the last bucket may be unbounded"));
            }
        }
        buckets.push(Bucket {
            upper: b.below,
            score: b.score,
        });
    }
    if buckets.is_empty() {
        return Err(invalid(key, "threshold-bucket needs at least one bucket"));
    }
    Ok(buckets)
}

fn build_dimension(raw: TomlDimension) -> Result<Dimension, RubricError> {
    let key = raw.key;
    let max_score = positive(&key, "max_score", raw.max_score)?;

    let scoring = match raw.scoring {
        TomlScoring::BinaryEqualWeight { criteria } => Scoring::BinaryEqualWeight {
            criteria: build_criteria(&key, criteria)?,
        },
        TomlScoring::WeightedKeyword { criteria } => Scoring::WeightedKeyword {
            criteria: build_criteria(&key, criteria)?,
        },
        TomlScoring::StructuralQuality {
            sections,
            heading_marker,
            presence_points,
            context_points,
            length_points,
            scale,
            min_context_matches,
        } => {
            let sections = sections
                .into_iter()
                .map(|s| {
                    let locator = RegexBuilder::new(&regex::escape(&s.name))
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| RubricError::InvalidPattern {
                            pattern: s.name.clone(),
                            source,
                        })?;
                    Ok(Section {
                        weight: positive(&key, &format!("weight of '{}'", s.name), s.weight)?,
                        name: s.name,
                        context: s.context,
                        min_body_chars: s.min_body_chars,
                        locator,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            Scoring::StructuralQuality(StructuralQuality {
                sections,
                heading_marker,
                presence_points,
                context_points,
                length_points,
                scale: positive(&key, "scale", scale)?,
                min_context_matches,
            })
        }
        TomlScoring::TieredCategoryCount {
            categories,
            per_category_cap,
            bonus_tiers,
        } => {
            let categories = categories
                .into_iter()
                .map(|c| {
                    let detectors = c
                        .patterns
                        .iter()
                        .map(|p| Detector::pattern(p))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(PatternCategory {
                        name: c.name,
                        detectors,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            let mut bonus_tiers: Vec<BonusTier> = bonus_tiers
                .into_iter()
                .map(|t| BonusTier {
                    min_total: t.min_total,
                    bonus: t.bonus,
                })
                .collect();
            bonus_tiers.sort_by(|a, b| b.min_total.cmp(&a.min_total));
            Scoring::TieredCategoryCount(TieredCategoryCount {
                categories,
                per_category_cap,
                bonus_tiers,
            })
        }
        TomlScoring::ThresholdBucket {
            measure,
            buckets,
            subject,
            unit,
        } => {
            let measure = match measure.as_str() {
                "elapsed-seconds" => Measure::ElapsedSeconds,
                other => Measure::Ratio(other.parse().map_err(|e: String| invalid(&key, e))?),
            };
            let unit = match (unit.as_deref(), measure) {
                (Some("seconds"), _) => DisplayUnit::Seconds,
                (Some("hours"), _) => DisplayUnit::Hours,
                (Some("percent"), _) => DisplayUnit::Percent,
                (Some(other), _) => return Err(invalid(&key, format!("unknown unit: {other}"))),
                (None, Measure::ElapsedSeconds) => DisplayUnit::Seconds,
                (None, Measure::Ratio(_)) => DisplayUnit::Percent,
            };
            Scoring::ThresholdBucket(ThresholdBucket {
                measure,
                buckets: build_buckets(&key, buckets)?,
                subject,
                unit,
            })
        }
        TomlScoring::ContextualKeyword {
            criteria,
            base,
            step,
            cap,
        } => {
            let criteria = criteria
                .into_iter()
                .map(|c| {
                    let (default_name, detector) = detector(&key, c.keyword, c.pattern)?;
                    Ok(ContextualCriterion {
                        name: c.name.unwrap_or(default_name),
                        detector,
                        context: c.context,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            Scoring::ContextualKeyword(ContextualKeyword {
                criteria,
                base,
                step,
                cap,
            })
        }
        TomlScoring::Ratio {
            source,
            patterns,
            expected_total,
            shortfall_label,
        } => {
            let source: TallySource = source.parse().map_err(|e: String| invalid(&key, e))?;
            let patterns = patterns
                .iter()
                .map(|p| Detector::pattern(p))
                .collect::<Result<Vec<_>, _>>()?;
            Scoring::Ratio(Ratio {
                source,
                patterns,
                expected_total,
                shortfall_label,
            })
        }
        TomlScoring::CategoryPassRate {
            categories,
            shortfall,
            overall_line,
        } => {
            let categories = categories
                .into_iter()
                .map(|c| {
                    Ok(WeightedCategory {
                        weight: positive(&key, &format!("weight of '{}'", c.name), c.weight)?,
                        name: c.name,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            let shortfall = match shortfall.as_deref() {
                None | Some("per-category") => ShortfallMode::PerCategory,
                Some("overall") => ShortfallMode::Overall,
                Some(other) => {
                    return Err(invalid(&key, format!("unknown shortfall mode: {other}")))
                }
            };
            Scoring::CategoryPassRate(CategoryPassRate {
                categories,
                shortfall,
                overall_line,
            })
        }
        TomlScoring::MatchDensity {
            categories,
            tiers,
            weak_below,
        } => {
            let categories = categories
                .into_iter()
                .map(|c| {
                    Ok(DensityCategory {
                        weight: positive(&key, &format!("weight of '{}'", c.name), c.weight)?,
                        detector: Detector::pattern(&c.pattern)?,
                        name: c.name,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            let mut tiers: Vec<DensityTier> = tiers
                .into_iter()
                .map(|t| DensityTier {
                    above: t.above,
                    fraction: t.fraction,
                })
                .collect();
            tiers.sort_by(|a, b| b.above.cmp(&a.above));
            Scoring::MatchDensity(MatchDensity {
                categories,
                tiers,
                weak_below,
            })
        }
        TomlScoring::AnalyzerAspects { aspects, low_below } => {
            let aspects = aspects
                .into_iter()
                .map(|a| {
                    Ok(Aspect {
                        max: positive(&key, &format!("max of '{}'", a.name), a.max)?,
                        name: a.name,
                    })
                })
                .collect::<Result<Vec<_>, RubricError>>()?;
            Scoring::AnalyzerAspects(AnalyzerAspects { aspects, low_below })
        }
        TomlScoring::FixQuality { outcomes } => Scoring::FixQuality(FixQuality {
            outcomes: outcomes
                .into_iter()
                .map(|o| OutcomeScore {
                    completely_fixed: o.completely_fixed,
                    introduced_new_defects: o.introduced_new_defects,
                    score: o.score,
                })
                .collect(),
        }),
        TomlScoring::Composite { parts } => Scoring::Composite {
            parts: parts
                .into_iter()
                .map(build_dimension)
                .collect::<Result<Vec<_>, _>>()?,
        },
    };

    let advice = Advice {
        missing: raw.advice.missing,
        per_item: raw.advice.per_item,
        priority: raw.advice.priority.map(|p| PriorityAdvice {
            threshold: p.threshold,
            template: p.template,
            secondary: p.secondary,
        }),
        shortfall: raw.advice.shortfall,
        flagged: raw.advice.flagged,
        low_score: raw.advice.low_score.map(|l| LowScoreAdvice {
            below: l.below,
            message: l.message,
        }),
    };

    Ok(Dimension {
        key,
        name: raw.name,
        max_score,
        rule: raw.rule.trim_end().to_string(),
        item_label: raw.item_label,
        labels: FactLabels {
            matched: raw.labels.matched,
            unmatched: raw.labels.unmatched,
            total: raw.labels.total,
            breakdown: raw.labels.breakdown,
        },
        scoring,
        advice,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A warning from rubric validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The dimension key (if applicable).
    pub dimension: Option<String>,
    /// Warning message.
    pub message: String,
}

fn warn(warnings: &mut Vec<ValidationWarning>, dim: &Dimension, message: impl Into<String>) {
    warnings.push(ValidationWarning {
        dimension: Some(dim.key.clone()),
        message: message.into(),
    });
}

fn item_count(scoring: &Scoring) -> usize {
    match scoring {
        Scoring::BinaryEqualWeight { criteria } | Scoring::WeightedKeyword { criteria } => {
            criteria.len()
        }
        Scoring::StructuralQuality(s) => s.sections.len(),
        Scoring::TieredCategoryCount(s) => s.categories.len(),
        Scoring::ThresholdBucket(s) => s.buckets.len(),
        Scoring::ContextualKeyword(s) => s.criteria.len(),
        Scoring::Ratio(_) => 1,
        Scoring::CategoryPassRate(s) => s.categories.len(),
        Scoring::MatchDensity(s) => s.categories.len(),
        Scoring::AnalyzerAspects(s) => s.aspects.len(),
        Scoring::FixQuality(s) => s.outcomes.len(),
        Scoring::Composite { parts } => parts.len(),
    }
}

fn validate_dimension(dim: &Dimension, warnings: &mut Vec<ValidationWarning>) {
    if item_count(&dim.scoring) == 0 {
        warn(
            warnings,
            dim,
            format!("{} has nothing to score", dim.scoring.strategy_name()),
        );
    }

    if let Some(reachable) = dim.scoring.attainable_max() {
        if (reachable - dim.max_score).abs() > 1e-6 {
            warn(
                warnings,
                dim,
                format!(
                    "strategy can reach {reachable} but max_score is {}",
                    dim.max_score
                ),
            );
        }
    }

    if let Scoring::Ratio(r) = &dim.scoring {
        if r.source == TallySource::Patterns {
            if r.patterns.is_empty() {
                warn(warnings, dim, "ratio over patterns has no patterns");
            }
            if r.expected_total.is_none() {
                warn(
                    warnings,
                    dim,
                    "ratio over patterns has no expected_total; it must be supplied at run time",
                );
            }
        }
    }

    if let Scoring::Composite { parts } = &dim.scoring {
        for part in parts {
            validate_dimension(part, warnings);
        }
    }

    let advice = &dim.advice;
    let templates = [
        ("missing", advice.missing.as_deref(), "{items}"),
        ("per_item", advice.per_item.as_deref(), "{item}"),
        ("shortfall", advice.shortfall.as_deref(), "{count}"),
        (
            "priority.template",
            advice.priority.as_ref().map(|p| p.template.as_str()),
            "{items}",
        ),
        (
            "priority.secondary",
            advice.priority.as_ref().map(|p| p.secondary.as_str()),
            "{items}",
        ),
    ];
    for (field, template, placeholder) in templates {
        if let Some(template) = template {
            if !template.contains(placeholder) {
                warn(
                    warnings,
                    dim,
                    format!("advice.{field} does not use {placeholder}"),
                );
            }
        }
    }
}

/// Validate a rubric for common issues.
pub fn validate_rubric(rubric: &Rubric) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if rubric.dimensions.is_empty() {
        warnings.push(ValidationWarning {
            dimension: None,
            message: "rubric has no dimensions".into(),
        });
    }

    // Check for duplicate dimension keys
    let mut seen = HashSet::new();
    for dim in &rubric.dimensions {
        if !seen.insert(&dim.key) {
            warn(&mut warnings, dim, format!("duplicate dimension key: {}", dim.key));
        }
    }

    for dim in &rubric.dimensions {
        validate_dimension(dim, &mut warnings);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[rubric]
domain = "frontend"
title = "前端开发评估报告"
fallback = "前端代码质量良好，无需特别改进"

[[dimensions]]
key = "function_coverage"
name = "功能完整性"
max_score = 10.0
rule = """
检测页面是否实现要求的功能点
"""
item_label = "功能点"

[dimensions.labels]
matched = "已实现功能"
unmatched = "缺失功能"

[dimensions.scoring]
strategy = "binary-equal-weight"
criteria = [
    { keyword = "图书信息展示" },
    { name = "购物车", pattern = "加入购物车|add.?to.?cart" },
]

[dimensions.advice]
missing = "建议实现以下缺失的功能点: {items}"
"#;

    fn parse(toml: &str) -> Result<Rubric> {
        parse_rubric_str(toml, &PathBuf::from("test.toml"))
    }

    #[test]
    fn parse_valid_toml() {
        let rubric = parse(VALID_TOML).unwrap();
        assert_eq!(rubric.domain, Some(Domain::Frontend));
        assert_eq!(rubric.title, "前端开发评估报告");
        assert_eq!(rubric.dimensions.len(), 1);
        let dim = &rubric.dimensions[0];
        assert_eq!(dim.rule, "检测页面是否实现要求的功能点");
        assert_eq!(dim.labels.matched.as_deref(), Some("已实现功能"));
        match &dim.scoring {
            Scoring::BinaryEqualWeight { criteria } => {
                assert_eq!(criteria[0].name, "图书信息展示");
                assert_eq!(criteria[0].weight, 1.0);
                assert_eq!(criteria[1].name, "购物车");
            }
            other => panic!("unexpected strategy {}", other.strategy_name()),
        }
        assert!(validate_rubric(&rubric).is_empty());
    }

    #[test]
    fn parse_malformed_toml() {
        assert!(parse("this is not [valid toml }{").is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let toml = r#"
[rubric]
title = "t"
fallback = "f"

[[dimensions]]
key = "x"
name = "x"
max_score = 10.0

[dimensions.scoring]
strategy = "vibes"
"#;
        assert!(parse(toml).is_err());
    }

    fn single_dimension(scoring: &str) -> String {
        format!(
            r#"
[rubric]
title = "t"
fallback = "f"

[[dimensions]]
key = "x"
name = "x"
max_score = 10.0

[dimensions.scoring]
{scoring}
"#
        )
    }

    #[test]
    fn rejects_bad_criteria() {
        let both = single_dimension(
            r#"strategy = "weighted-keyword"
criteria = [{ keyword = "a", pattern = "a" }]"#,
        );
        let err = format!("{:#}", parse(&both).unwrap_err());
        assert!(err.contains("both keyword and pattern"));

        let zero = single_dimension(
            r#"strategy = "weighted-keyword"
criteria = [{ keyword = "a", weight = 0.0 }]"#,
        );
        let err = format!("{:#}", parse(&zero).unwrap_err());
        assert!(err.contains("must be positive"));

        let regex = single_dimension(
            r#"strategy = "binary-equal-weight"
criteria = [{ pattern = "(oops" }]"#,
        );
        let err = format!("{:#}", parse(&regex).unwrap_err());
        assert!(err.contains("invalid pattern"));
    }

    #[test]
    fn rejects_bad_buckets() {
        let descending = single_dimension(
            r#"strategy = "threshold-bucket"
measure = "elapsed-seconds"
subject = "时间"
buckets = [{ below = 10.0, score = 10.0 }, { below = 5.0, score = 5.0 }, { score = 1.0 }]"#,
        );
        assert!(format!("{:#}", parse(&descending).unwrap_err()).contains("ascending"));

        let bounded = single_dimension(
            r#"strategy = "threshold-bucket"
measure = "elapsed-seconds"
subject = "时间"
buckets = [{ below = 10.0, score = 10.0 }]"#,
        );
        assert!(format!("{:#}", parse(&bounded).unwrap_err()).contains("unbounded"));

        let nan = single_dimension(
            r#"strategy = "threshold-bucket"
measure = "elapsed-seconds"
subject = "时间"
buckets = [{ below = nan, score = 10.0 }, { below = 5.0, score = 5.0 }, { score = 1.0 }]"#,
        );
        assert!(format!("{:#}", parse(&nan).unwrap_err()).contains("finite"));

        let infinite = single_dimension(
            r#"strategy = "threshold-bucket"
measure = "elapsed-seconds"
subject = "时间"
buckets = [{ below = 5.0, score = 5.0 }, { below = inf, score = 2.0 }, { score = 1.0 }]"#,
        );
        assert!(format!("{:#}", parse(&infinite).unwrap_err()).contains("finite"));

        let ok = single_dimension(
            r#"strategy = "threshold-bucket"
measure = "bug-fix"
subject = "修复率"
buckets = [{ below = 0.5, score = 2.0 }, { score = 10.0 }]"#,
        );
        match &parse(&ok).unwrap().dimensions[0].scoring {
            Scoring::ThresholdBucket(t) => {
                assert_eq!(t.measure, Measure::Ratio(TallySource::BugFix));
                assert_eq!(t.unit, DisplayUnit::Percent);
            }
            other => panic!("unexpected strategy {}", other.strategy_name()),
        }
    }

    #[test]
    fn tiers_are_sorted_highest_first() {
        let toml = single_dimension(
            r#"strategy = "tiered-category-count"
per_category_cap = 3.0
bonus_tiers = [{ min_total = 2, bonus = 1.0 }, { min_total = 10, bonus = 3.0 }]
categories = [{ name = "时间", patterns = ['\d+\s*天'] }]"#,
        );
        match &parse(&toml).unwrap().dimensions[0].scoring {
            Scoring::TieredCategoryCount(t) => assert_eq!(t.bonus_tiers[0].min_total, 10),
            other => panic!("unexpected strategy {}", other.strategy_name()),
        }
    }

    #[test]
    fn validate_flags_duplicates_and_templates() {
        let toml = r#"
[rubric]
title = "t"
fallback = "f"

[[dimensions]]
key = "same"
name = "a"
max_score = 10.0
[dimensions.scoring]
strategy = "weighted-keyword"
criteria = [{ keyword = "a" }]
[dimensions.advice]
missing = "no placeholder here"

[[dimensions]]
key = "same"
name = "b"
max_score = 10.0
[dimensions.scoring]
strategy = "analyzer-aspects"
aspects = [{ name = "代码质量", max = 3.0 }]
"#;
        let rubric = parse(toml).unwrap();
        let warnings = validate_rubric(&rubric);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("{items}")));
        assert!(warnings.iter().any(|w| w.message.contains("can reach 3")));
    }

    #[test]
    fn builtin_rubrics_parse_and_validate() {
        let expected = [
            (Domain::Requirement, 75.0, 5),
            (Domain::Frontend, 30.0, 3),
            (Domain::Backend, 30.0, 3),
            (Domain::Bug, 40.0, 3),
            (Domain::Project, 40.0, 4),
        ];
        for (domain, max, count) in expected {
            let rubric = builtin_rubric(domain).unwrap();
            assert_eq!(rubric.domain, Some(domain));
            assert_eq!(rubric.max_total_score(), max, "{domain}");
            assert_eq!(rubric.dimensions.len(), count, "{domain}");
            let warnings = validate_rubric(&rubric);
            let unexpected: Vec<_> = warnings
                .iter()
                .filter(|w| !w.message.contains("supplied at run time"))
                .map(|w| w.message.clone())
                .collect();
            assert!(unexpected.is_empty(), "{domain}: {unexpected:?}");
        }
    }

    #[test]
    fn parse_rubric_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        let rubric = parse_rubric(&path).unwrap();
        assert_eq!(rubric.dimensions[0].key, "function_coverage");
        assert!(parse_rubric(&dir.path().join("missing.toml")).is_err());
    }
}
