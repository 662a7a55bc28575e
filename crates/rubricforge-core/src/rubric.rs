//! Declarative rubric definitions.
//!
//! A [`Rubric`] is an ordered list of [`Dimension`]s. Each dimension carries
//! its maximum score, a scoring strategy and the advice templates used to
//! turn its result into recommendations. Everything here is built once by
//! the parser and only read during evaluation.

use regex::Regex;

use crate::model::{Detector, Domain};

/// A complete evaluation profile.
#[derive(Debug, Clone)]
pub struct Rubric {
    /// Domain the rubric was written for, if any.
    pub domain: Option<Domain>,
    /// Report title.
    pub title: String,
    /// Dimensions in evaluation and report order.
    pub dimensions: Vec<Dimension>,
    /// Recommendation used when no dimension produced one.
    pub fallback: String,
}

impl Rubric {
    /// Sum of all dimension maxima.
    pub fn max_total_score(&self) -> f64 {
        self.dimensions.iter().map(|d| d.max_score).sum()
    }
}

/// One scored aspect of a rubric.
#[derive(Debug, Clone)]
pub struct Dimension {
    /// Stable identifier (e.g. `function_coverage`).
    pub key: String,
    /// Display name.
    pub name: String,
    pub max_score: f64,
    /// Restatement of the scoring rule for the report.
    pub rule: String,
    /// Noun used for items in detail lines (e.g. "关键词").
    pub item_label: String,
    pub labels: FactLabels,
    pub scoring: Scoring,
    pub advice: Advice,
}

impl Dimension {
    /// Weight of the named criterion, if the strategy has weighted criteria.
    pub fn criterion_weight(&self, name: &str) -> Option<f64> {
        match &self.scoring {
            Scoring::BinaryEqualWeight { criteria } | Scoring::WeightedKeyword { criteria } => {
                criteria.iter().find(|c| c.name == name).map(|c| c.weight)
            }
            Scoring::StructuralQuality(s) => {
                s.sections.iter().find(|c| c.name == name).map(|c| c.weight)
            }
            Scoring::CategoryPassRate(s) => {
                s.categories.iter().find(|c| c.name == name).map(|c| c.weight)
            }
            Scoring::MatchDensity(s) => s.categories.iter().find(|c| c.name == name).map(|c| c.weight),
            Scoring::AnalyzerAspects(s) => s.aspects.iter().find(|a| a.name == name).map(|a| a.max),
            _ => None,
        }
    }
}

/// Labels for the "评估结果" facts of a dimension. A fact is only emitted
/// when its label is set.
#[derive(Debug, Clone, Default)]
pub struct FactLabels {
    pub matched: Option<String>,
    pub unmatched: Option<String>,
    pub total: Option<String>,
    pub breakdown: Option<String>,
}

/// A checkable rule with a weight and a detector.
#[derive(Debug, Clone)]
pub struct Criterion {
    pub name: String,
    /// Always positive.
    pub weight: f64,
    pub detector: Detector,
}

/// How a dimension turns artifact evidence into a score.
#[derive(Debug, Clone)]
pub enum Scoring {
    /// Each matched criterion earns `max / count`.
    BinaryEqualWeight { criteria: Vec<Criterion> },
    /// Matched weight over total weight, scaled to the maximum.
    WeightedKeyword { criteria: Vec<Criterion> },
    StructuralQuality(StructuralQuality),
    TieredCategoryCount(TieredCategoryCount),
    ThresholdBucket(ThresholdBucket),
    ContextualKeyword(ContextualKeyword),
    Ratio(Ratio),
    CategoryPassRate(CategoryPassRate),
    MatchDensity(MatchDensity),
    AnalyzerAspects(AnalyzerAspects),
    FixQuality(FixQuality),
    /// Sub-dimensions whose scores add up.
    Composite { parts: Vec<Dimension> },
}

impl Scoring {
    /// Strategy name as written in rubric files.
    pub fn strategy_name(&self) -> &'static str {
        match self {
            Scoring::BinaryEqualWeight { .. } => "binary-equal-weight",
            Scoring::WeightedKeyword { .. } => "weighted-keyword",
            Scoring::StructuralQuality(_) => "structural-quality",
            Scoring::TieredCategoryCount(_) => "tiered-category-count",
            Scoring::ThresholdBucket(_) => "threshold-bucket",
            Scoring::ContextualKeyword(_) => "contextual-keyword",
            Scoring::Ratio(_) => "ratio",
            Scoring::CategoryPassRate(_) => "category-pass-rate",
            Scoring::MatchDensity(_) => "match-density",
            Scoring::AnalyzerAspects(_) => "analyzer-aspects",
            Scoring::FixQuality(_) => "fix-quality",
            Scoring::Composite { .. } => "composite",
        }
    }

    /// Highest score the strategy can produce before clamping, when that is
    /// fixed by the configuration. Strategies normalized to the dimension
    /// maximum return `None`.
    pub fn attainable_max(&self) -> Option<f64> {
        match self {
            Scoring::BinaryEqualWeight { .. }
            | Scoring::WeightedKeyword { .. }
            | Scoring::Ratio(_) => None,
            Scoring::StructuralQuality(s) => Some(s.sections.iter().map(|x| x.weight).sum()),
            Scoring::TieredCategoryCount(s) => {
                let top_bonus = s.bonus_tiers.first().map(|t| t.bonus).unwrap_or(0.0);
                Some(s.per_category_cap * s.categories.len() as f64 + top_bonus)
            }
            Scoring::ThresholdBucket(s) => s.buckets.iter().map(|b| b.score).reduce(f64::max),
            Scoring::ContextualKeyword(s) => {
                Some((s.base + s.cap) * s.criteria.len() as f64)
            }
            Scoring::CategoryPassRate(s) => Some(s.categories.iter().map(|c| c.weight).sum()),
            Scoring::MatchDensity(s) => Some(s.categories.iter().map(|c| c.weight).sum()),
            Scoring::AnalyzerAspects(s) => Some(s.aspects.iter().map(|a| a.max).sum()),
            Scoring::FixQuality(s) => s.outcomes.iter().map(|o| o.score).reduce(f64::max),
            Scoring::Composite { parts } => Some(parts.iter().map(|p| p.max_score).sum()),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy configurations
// ---------------------------------------------------------------------------

/// Per-section presence, context and length checks.
#[derive(Debug, Clone)]
pub struct StructuralQuality {
    pub sections: Vec<Section>,
    /// Marker that ends a section body (e.g. `##`).
    pub heading_marker: String,
    pub presence_points: f64,
    pub context_points: f64,
    pub length_points: f64,
    /// Quality points a section can earn in total.
    pub scale: f64,
    /// Context keywords required for the context point.
    pub min_context_matches: usize,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub weight: f64,
    pub context: Vec<String>,
    /// Minimum body length in characters, heading included.
    pub min_body_chars: usize,
    /// Case-insensitive locator for the heading text.
    pub locator: Regex,
}

/// Capped per-category counts plus a bonus on the overall count.
#[derive(Debug, Clone)]
pub struct TieredCategoryCount {
    pub categories: Vec<PatternCategory>,
    pub per_category_cap: f64,
    /// Sorted by `min_total`, highest first.
    pub bonus_tiers: Vec<BonusTier>,
}

#[derive(Debug, Clone)]
pub struct PatternCategory {
    pub name: String,
    pub detectors: Vec<Detector>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonusTier {
    pub min_total: usize,
    pub bonus: f64,
}

/// A continuous measurement mapped to a score through ascending buckets.
#[derive(Debug, Clone)]
pub struct ThresholdBucket {
    pub measure: Measure,
    /// Strictly ascending; the last bucket is unbounded.
    pub buckets: Vec<Bucket>,
    /// What is being measured (e.g. "修复时间").
    pub subject: String,
    pub unit: DisplayUnit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Exclusive upper bound; `None` for the final bucket.
    pub upper: Option<f64>,
    pub score: f64,
}

/// Where a threshold bucket reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    ElapsedSeconds,
    Ratio(TallySource),
}

/// How a bucket measurement is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnit {
    Seconds,
    Hours,
    Percent,
}

/// Base points per matched criterion plus points for surrounding context.
#[derive(Debug, Clone)]
pub struct ContextualKeyword {
    pub criteria: Vec<ContextualCriterion>,
    pub base: f64,
    pub step: f64,
    pub cap: f64,
}

#[derive(Debug, Clone)]
pub struct ContextualCriterion {
    pub name: String,
    pub detector: Detector,
    pub context: Vec<String>,
}

/// Achieved over total, scaled to the maximum.
#[derive(Debug, Clone)]
pub struct Ratio {
    pub source: TallySource,
    /// Only read by [`TallySource::Patterns`].
    pub patterns: Vec<Detector>,
    /// Denominator for [`TallySource::Patterns`] unless the run overrides it.
    pub expected_total: Option<u64>,
    /// Label attached to the reported shortfall.
    pub shortfall_label: Option<String>,
}

/// Origin of an achieved/total tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallySource {
    /// Discovered over known defects.
    BugDiscovery,
    /// Fixed over discovered defects.
    BugFix,
    /// Implemented over planned features.
    FeatureCompletion,
    /// Passed over total tests.
    TestPass,
    /// Pattern hits over the expected total.
    Patterns,
}

impl TallySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TallySource::BugDiscovery => "bug-discovery",
            TallySource::BugFix => "bug-fix",
            TallySource::FeatureCompletion => "feature-completion",
            TallySource::TestPass => "test-pass",
            TallySource::Patterns => "patterns",
        }
    }
}

impl std::str::FromStr for TallySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug-discovery" => Ok(TallySource::BugDiscovery),
            "bug-fix" => Ok(TallySource::BugFix),
            "feature-completion" => Ok(TallySource::FeatureCompletion),
            "test-pass" => Ok(TallySource::TestPass),
            "patterns" => Ok(TallySource::Patterns),
            other => Err(format!("unknown tally source: {other}")),
        }
    }
}

/// Weighted pass rates per test category.
#[derive(Debug, Clone)]
pub struct CategoryPassRate {
    pub categories: Vec<WeightedCategory>,
    pub shortfall: ShortfallMode,
    /// Append an overall pass-rate detail line.
    pub overall_line: bool,
}

#[derive(Debug, Clone)]
pub struct WeightedCategory {
    pub name: String,
    pub weight: f64,
}

/// How failed tests are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallMode {
    PerCategory,
    Overall,
}

/// Tiered credit for how often a pattern occurs.
#[derive(Debug, Clone)]
pub struct MatchDensity {
    pub categories: Vec<DensityCategory>,
    /// Sorted by `above`, highest first.
    pub tiers: Vec<DensityTier>,
    /// Categories with fewer hits are reported as unmatched.
    pub weak_below: usize,
}

#[derive(Debug, Clone)]
pub struct DensityCategory {
    pub name: String,
    pub weight: f64,
    pub detector: Detector,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityTier {
    /// The count must be strictly greater.
    pub above: usize,
    pub fraction: f64,
}

/// Aspect scores supplied by the static analyzer.
#[derive(Debug, Clone)]
pub struct AnalyzerAspects {
    pub aspects: Vec<Aspect>,
    /// Aspects below this fraction of their max are reported as unmatched.
    pub low_below: f64,
}

#[derive(Debug, Clone)]
pub struct Aspect {
    pub name: String,
    pub max: f64,
}

/// Score lookup over the fix outcome reported by the bug detector.
#[derive(Debug, Clone)]
pub struct FixQuality {
    pub outcomes: Vec<OutcomeScore>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeScore {
    pub completely_fixed: bool,
    pub introduced_new_defects: bool,
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Advice
// ---------------------------------------------------------------------------

/// Recommendation templates for one dimension.
///
/// Placeholders: `{items}` (comma-joined names), `{item}` (one name),
/// `{label}` and `{count}` (a shortfall).
#[derive(Debug, Clone, Default)]
pub struct Advice {
    pub missing: Option<String>,
    pub per_item: Option<String>,
    pub priority: Option<PriorityAdvice>,
    pub shortfall: Option<String>,
    pub flagged: Option<String>,
    pub low_score: Option<LowScoreAdvice>,
}

/// Splits unmatched items by criterion weight.
#[derive(Debug, Clone)]
pub struct PriorityAdvice {
    /// Items weighing at least this much are priority items.
    pub threshold: f64,
    pub template: String,
    pub secondary: String,
}

#[derive(Debug, Clone)]
pub struct LowScoreAdvice {
    /// Fraction of the maximum below which the message is emitted.
    pub below: f64,
    pub message: String,
}
