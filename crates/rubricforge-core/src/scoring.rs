//! Scoring strategies.
//!
//! [`evaluate_dimension`] runs one dimension against an artifact and returns
//! its [`EvaluationResult`]. Every strategy is a pure function of the
//! artifact, the dimension configuration and whatever the capability probes
//! report. Degenerate configurations (zero weights, zero totals) score 0 and
//! log a warning instead of dividing by zero.

use anyhow::Result;

use crate::aggregate::{display_number, round1};
use crate::model::Artifact;
use crate::results::{EvaluationResult, Fact, QualityFlag, Shortfall};
use crate::rubric::{
    AnalyzerAspects, Bucket, CategoryPassRate, ContextualKeyword, Criterion, Dimension,
    DisplayUnit, FixQuality, MatchDensity, Measure, Ratio, Scoring, ShortfallMode,
    StructuralQuality, TallySource, ThresholdBucket, TieredCategoryCount,
};
use crate::traits::{EvalContext, Tally};

/// Evidence collected by a strategy before it is clamped into a result.
#[derive(Debug, Default)]
struct Outcome {
    score: f64,
    matched: Vec<String>,
    unmatched: Vec<String>,
    facts: Vec<Fact>,
    details: Vec<String>,
    shortfalls: Vec<Shortfall>,
    flags: Vec<QualityFlag>,
}

impl Outcome {
    fn fact(&mut self, label: &Option<String>, value: impl Into<String>) {
        if let Some(label) = label {
            self.facts.push(Fact {
                label: label.clone(),
                value: value.into(),
            });
        }
    }
}

/// Evaluate a single dimension.
pub fn evaluate_dimension(
    dim: &Dimension,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<EvaluationResult> {
    let outcome = match &dim.scoring {
        Scoring::BinaryEqualWeight { criteria } => binary_equal_weight(dim, criteria, artifact),
        Scoring::WeightedKeyword { criteria } => weighted_keyword(dim, criteria, artifact),
        Scoring::StructuralQuality(cfg) => structural_quality(dim, cfg, artifact),
        Scoring::TieredCategoryCount(cfg) => tiered_category_count(dim, cfg, artifact),
        Scoring::ThresholdBucket(cfg) => threshold_bucket(dim, cfg, artifact, ctx)?,
        Scoring::ContextualKeyword(cfg) => contextual_keyword(dim, cfg, artifact),
        Scoring::Ratio(cfg) => ratio(dim, cfg, artifact, ctx)?,
        Scoring::CategoryPassRate(cfg) => category_pass_rate(cfg, artifact, ctx)?,
        Scoring::MatchDensity(cfg) => match_density(cfg, artifact),
        Scoring::AnalyzerAspects(cfg) => analyzer_aspects(cfg, artifact, ctx)?,
        Scoring::FixQuality(cfg) => fix_quality(dim, cfg, artifact, ctx)?,
        Scoring::Composite { parts } => composite(parts, artifact, ctx)?,
    };

    let result = finish(dim, outcome);
    tracing::debug!(
        "{} ({}): {}/{}",
        dim.key,
        dim.scoring.strategy_name(),
        result.score,
        result.max_score
    );
    Ok(result)
}

fn finish(dim: &Dimension, mut outcome: Outcome) -> EvaluationResult {
    let raw = if outcome.score.is_finite() {
        outcome.score
    } else {
        0.0
    };
    let score = round1(raw.clamp(0.0, dim.max_score.max(0.0)));

    let mut facts = Vec::new();
    let join = |items: &[String]| {
        if items.is_empty() {
            "无".to_string()
        } else {
            items.join(", ")
        }
    };
    if let Some(label) = &dim.labels.matched {
        facts.push(Fact {
            label: label.clone(),
            value: join(outcome.matched.as_slice()),
        });
    }
    if let Some(label) = &dim.labels.unmatched {
        facts.push(Fact {
            label: label.clone(),
            value: join(outcome.unmatched.as_slice()),
        });
    }
    facts.append(&mut outcome.facts);

    EvaluationResult {
        key: dim.key.clone(),
        name: dim.name.clone(),
        max_score: dim.max_score,
        score,
        rule: dim.rule.clone(),
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        facts,
        detail_lines: outcome.details,
        shortfalls: outcome.shortfalls,
        flags: outcome.flags,
    }
}

/// Score for `value` from ascending buckets: the first bucket whose upper
/// bound strictly exceeds the value wins.
pub fn bucket_score(buckets: &[Bucket], value: f64) -> f64 {
    buckets
        .iter()
        .find(|b| b.upper.map_or(true, |upper| value < upper))
        .map(|b| b.score)
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Keyword strategies
// ---------------------------------------------------------------------------

fn binary_equal_weight(dim: &Dimension, criteria: &[Criterion], artifact: &Artifact) -> Outcome {
    let mut out = Outcome::default();
    if criteria.is_empty() {
        tracing::warn!("dimension '{}' has no criteria; scoring 0", dim.key);
        return out;
    }

    let per_item = dim.max_score / criteria.len() as f64;
    for c in criteria {
        if c.detector.matches(artifact) {
            out.score += per_item;
            out.matched.push(c.name.clone());
            out.details.push(format!(
                "✓ 找到{}: {} (得分: {:.1})",
                dim.item_label, c.name, per_item
            ));
        } else {
            out.unmatched.push(c.name.clone());
            out.details
                .push(format!("✗ 未找到{}: {}", dim.item_label, c.name));
        }
    }
    out
}

fn weighted_keyword(dim: &Dimension, criteria: &[Criterion], artifact: &Artifact) -> Outcome {
    let mut out = Outcome::default();
    let total_weight: f64 = criteria.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        tracing::warn!("dimension '{}' has zero total weight; scoring 0", dim.key);
        return out;
    }

    for c in criteria {
        if c.detector.matches(artifact) {
            let score = c.weight / total_weight * dim.max_score;
            out.score += score;
            out.matched.push(c.name.clone());
            out.details.push(format!(
                "✓ 找到{}: {} (权重: {}, 得分: {:.1})",
                dim.item_label,
                c.name,
                display_number(c.weight),
                score
            ));
        } else {
            out.unmatched.push(c.name.clone());
            out.details.push(format!(
                "✗ 未找到{}: {} (权重: {})",
                dim.item_label,
                c.name,
                display_number(c.weight)
            ));
        }
    }
    out
}

fn contextual_keyword(dim: &Dimension, cfg: &ContextualKeyword, artifact: &Artifact) -> Outcome {
    let mut out = Outcome::default();
    for c in &cfg.criteria {
        if c.detector.matches(artifact) {
            let hits = c
                .context
                .iter()
                .filter(|kw| artifact.contains_folded(kw))
                .count();
            let context_score = (hits as f64 * cfg.step).min(cfg.cap);
            out.score += cfg.base + context_score;
            out.matched.push(c.name.clone());
            out.details.push(format!(
                "✓ 找到{}: {} (基础分: {}, 上下文分: {:.2})",
                dim.item_label,
                c.name,
                display_number(cfg.base),
                context_score
            ));
        } else {
            out.unmatched.push(c.name.clone());
            out.details
                .push(format!("✗ 未找到{}: {}", dim.item_label, c.name));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Document structure and counting strategies
// ---------------------------------------------------------------------------

fn structural_quality(dim: &Dimension, cfg: &StructuralQuality, artifact: &Artifact) -> Outcome {
    let mut out = Outcome::default();
    if cfg.scale <= 0.0 {
        tracing::warn!("dimension '{}' has a zero quality scale; scoring 0", dim.key);
        return out;
    }

    let text = artifact.combined_text();
    for section in &cfg.sections {
        let Some(heading) = section.locator.find(&text) else {
            out.unmatched.push(section.name.clone());
            out.details.push(format!(
                "✗ 未找到{}: {} (权重: {})",
                dim.item_label,
                section.name,
                display_number(section.weight)
            ));
            continue;
        };

        let mut quality = cfg.presence_points;

        let context_hits = section
            .context
            .iter()
            .filter(|kw| artifact.contains_folded(kw))
            .count();
        if context_hits >= cfg.min_context_matches {
            quality += cfg.context_points;
        }

        let rest = &text[heading.end()..];
        let body_end = if cfg.heading_marker.is_empty() {
            text.len()
        } else {
            rest.find(cfg.heading_marker.as_str())
                .map(|i| heading.end() + i)
                .unwrap_or(text.len())
        };
        if text[heading.start()..body_end].chars().count() >= section.min_body_chars {
            quality += cfg.length_points;
        }

        let quality = quality.min(cfg.scale);
        let score = quality / cfg.scale * section.weight;
        out.score += score;
        out.matched.push(section.name.clone());
        out.details.push(format!(
            "✓ 找到{}: {} (质量分: {}/{}, 得分: {:.1})",
            dim.item_label,
            section.name,
            display_number(quality),
            display_number(cfg.scale),
            score
        ));
    }
    out
}

fn tiered_category_count(
    dim: &Dimension,
    cfg: &TieredCategoryCount,
    artifact: &Artifact,
) -> Outcome {
    let mut out = Outcome::default();
    let mut total = 0usize;
    let mut breakdown = Vec::with_capacity(cfg.categories.len());

    for category in &cfg.categories {
        let count: usize = category.detectors.iter().map(|d| d.count(artifact)).sum();
        total += count;
        out.score += (count as f64).min(cfg.per_category_cap);
        breakdown.push(format!("{}: {}", category.name, count));

        if count > 0 {
            out.matched.push(category.name.clone());
            out.details.push(format!(
                "✓ {}: 找到 {} 个{}",
                category.name, count, dim.item_label
            ));
        } else {
            out.unmatched.push(category.name.clone());
            out.details
                .push(format!("✗ {}: 未找到{}", category.name, dim.item_label));
        }
    }

    let bonus = cfg
        .bonus_tiers
        .iter()
        .find(|tier| total >= tier.min_total)
        .map(|tier| tier.bonus)
        .unwrap_or(0.0);
    out.score += bonus;

    out.fact(&dim.labels.total, total.to_string());
    out.fact(&dim.labels.breakdown, breakdown.join(", "));
    out
}

fn match_density(cfg: &MatchDensity, artifact: &Artifact) -> Outcome {
    let mut out = Outcome::default();
    for category in &cfg.categories {
        let count = category.detector.count(artifact);
        let fraction = cfg
            .tiers
            .iter()
            .find(|tier| count > tier.above)
            .map(|tier| tier.fraction)
            .unwrap_or(0.0);
        let score = category.weight * fraction;
        out.score += score;
        out.details.push(format!(
            "{}: {}处匹配 (得分: {:.1}/{})",
            category.name,
            count,
            score,
            display_number(category.weight)
        ));
        if count < cfg.weak_below {
            out.unmatched.push(category.name.clone());
        } else {
            out.matched.push(category.name.clone());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Probe-backed strategies
// ---------------------------------------------------------------------------

fn tally(
    source: TallySource,
    cfg: Option<&Ratio>,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<Option<Tally>> {
    let tally = match source {
        TallySource::BugDiscovery => ctx
            .probes
            .bugs
            .scan(artifact)?
            .map(|scan| Tally::new(scan.discovered, scan.known)),
        TallySource::BugFix => ctx
            .probes
            .bugs
            .scan(artifact)?
            .map(|scan| Tally::new(scan.fixed, scan.discovered)),
        TallySource::FeatureCompletion => ctx.probes.analyzer.feature_tally(artifact)?,
        TallySource::TestPass => {
            let runs = ctx.probes.tests.run(artifact)?;
            if runs.is_empty() {
                None
            } else {
                Some(Tally::new(
                    runs.iter().map(|r| r.passed.min(r.total)).sum(),
                    runs.iter().map(|r| r.total).sum(),
                ))
            }
        }
        TallySource::Patterns => {
            let achieved: usize = cfg
                .map(|r| r.patterns.iter().map(|d| d.count(artifact)).sum())
                .unwrap_or(0);
            ctx.expected_total
                .or_else(|| cfg.and_then(|r| r.expected_total))
                .map(|total| Tally::new(achieved as u64, total))
        }
    };
    Ok(tally)
}

fn ratio(dim: &Dimension, cfg: &Ratio, artifact: &Artifact, ctx: &EvalContext) -> Result<Outcome> {
    let mut out = Outcome::default();
    let Some(t) = tally(cfg.source, Some(cfg), artifact, ctx)? else {
        out.details.push(format!("{}: 无数据", dim.item_label));
        return Ok(out);
    };

    if t.total == 0 {
        tracing::warn!(
            "dimension '{}' has a zero {} total; scoring 0",
            dim.key,
            cfg.source.as_str()
        );
        out.details.push(format!("{}: 0/0", dim.item_label));
        return Ok(out);
    }

    let fraction = (t.achieved as f64 / t.total as f64).min(1.0);
    out.score = fraction * dim.max_score;
    out.details.push(format!(
        "{}: {}/{} ({:.1}%)",
        dim.item_label,
        t.achieved,
        t.total,
        fraction * 100.0
    ));
    if t.missing() > 0 {
        out.shortfalls.push(Shortfall {
            label: cfg.shortfall_label.clone(),
            count: t.missing(),
        });
    }
    Ok(out)
}

fn threshold_bucket(
    dim: &Dimension,
    cfg: &ThresholdBucket,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<Outcome> {
    let mut out = Outcome::default();
    let value = match cfg.measure {
        Measure::ElapsedSeconds => ctx.elapsed_secs,
        Measure::Ratio(source) => tally(source, None, artifact, ctx)?
            .filter(|t| t.total > 0)
            .map(|t| t.achieved as f64 / t.total as f64),
    }
    .filter(|v| v.is_finite());

    let Some(value) = value else {
        out.details.push(format!(
            "{}: 无数据 (得分: 0/{})",
            cfg.subject,
            display_number(dim.max_score)
        ));
        return Ok(out);
    };

    out.score = bucket_score(&cfg.buckets, value);
    let shown = match cfg.unit {
        DisplayUnit::Seconds => format!("{value:.1}秒"),
        DisplayUnit::Hours => format!("{:.1}小时", value / 3600.0),
        DisplayUnit::Percent => format!("{:.1}%", value * 100.0),
    };
    out.details.push(format!(
        "{}: {} (得分: {}/{})",
        cfg.subject,
        shown,
        display_number(out.score),
        display_number(dim.max_score)
    ));
    Ok(out)
}

fn category_pass_rate(
    cfg: &CategoryPassRate,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<Outcome> {
    let mut out = Outcome::default();
    let runs = ctx.probes.tests.run(artifact)?;

    let mut passed_sum = 0u64;
    let mut total_sum = 0u64;
    let mut failed_sum = 0u64;

    for category in &cfg.categories {
        let (passed, total) = runs
            .iter()
            .find(|r| r.category == category.name)
            .map(|r| (r.passed.min(r.total), r.total))
            .unwrap_or((0, 0));

        if total == 0 {
            out.unmatched.push(category.name.clone());
            out.details
                .push(format!("✗ {}: 未发现测试用例", category.name));
            continue;
        }

        let score = passed as f64 / total as f64 * category.weight;
        out.score += score;
        passed_sum += passed;
        total_sum += total;
        out.details.push(format!(
            "{}: {}/{} (得分: {:.1}/{})",
            category.name,
            passed,
            total,
            score,
            display_number(category.weight)
        ));

        let failed = total - passed;
        if failed == 0 {
            out.matched.push(category.name.clone());
        } else {
            out.unmatched.push(category.name.clone());
            failed_sum += failed;
            if cfg.shortfall == ShortfallMode::PerCategory {
                out.shortfalls.push(Shortfall {
                    label: Some(category.name.clone()),
                    count: failed,
                });
            }
        }
    }

    if cfg.shortfall == ShortfallMode::Overall && failed_sum > 0 {
        out.shortfalls.push(Shortfall {
            label: None,
            count: failed_sum,
        });
    }
    if cfg.overall_line && total_sum > 0 {
        out.details.push(format!(
            "总体通过率: {:.1}%",
            passed_sum as f64 / total_sum as f64 * 100.0
        ));
    }
    Ok(out)
}

fn analyzer_aspects(
    cfg: &AnalyzerAspects,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<Outcome> {
    let mut out = Outcome::default();
    for aspect in &cfg.aspects {
        match ctx.probes.analyzer.score_dimension(artifact, &aspect.name)? {
            Some(value) if value.is_finite() => {
                let value = value.clamp(0.0, aspect.max);
                out.score += value;
                out.details.push(format!(
                    "{}: {:.1}/{}",
                    aspect.name,
                    value,
                    display_number(aspect.max)
                ));
                if value < cfg.low_below * aspect.max {
                    out.unmatched.push(aspect.name.clone());
                } else {
                    out.matched.push(aspect.name.clone());
                }
            }
            _ => {
                out.unmatched.push(aspect.name.clone());
                out.details.push(format!("{}: 无数据", aspect.name));
            }
        }
    }
    Ok(out)
}

fn fix_quality(
    dim: &Dimension,
    cfg: &FixQuality,
    artifact: &Artifact,
    ctx: &EvalContext,
) -> Result<Outcome> {
    let mut out = Outcome::default();
    let Some(outcome) = ctx.probes.bugs.fix_outcome(artifact)? else {
        out.details.push("修复结果: 无数据".to_string());
        return Ok(out);
    };

    let yes_no = |b: bool| if b { "是" } else { "否" };
    out.score = cfg
        .outcomes
        .iter()
        .find(|o| {
            o.completely_fixed == outcome.completely_fixed
                && o.introduced_new_defects == outcome.introduced_new_defects
        })
        .map(|o| o.score)
        .unwrap_or(0.0);

    out.details
        .push(format!("完全修复: {}", yes_no(outcome.completely_fixed)));
    out.details
        .push(format!("引入新BUG: {}", yes_no(outcome.introduced_new_defects)));
    out.details.push(format!(
        "修复质量得分: {}/{}",
        display_number(out.score),
        display_number(dim.max_score)
    ));
    if outcome.introduced_new_defects {
        out.flags.push(QualityFlag::IntroducedNewDefects);
    }
    Ok(out)
}

fn composite(parts: &[Dimension], artifact: &Artifact, ctx: &EvalContext) -> Result<Outcome> {
    let mut out = Outcome::default();
    for part in parts {
        let result = evaluate_dimension(part, artifact, ctx)?;
        out.score += result.score;
        out.matched.extend(result.matched);
        out.unmatched.extend(result.unmatched);
        out.facts.extend(result.facts);
        out.details.extend(result.detail_lines);
        out.shortfalls.extend(result.shortfalls);
        out.flags.extend(result.flags);
    }
    Ok(out)
}
