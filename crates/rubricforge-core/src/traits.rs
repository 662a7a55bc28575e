//! Trait definitions for the collaborators around the scoring engine.
//!
//! Loading artifacts, persisting reports, running tests, detecting bugs and
//! static analysis all happen outside this crate. The engine only talks to
//! them through these traits; `rubricforge-probes` provides the filesystem
//! and recorded-result implementations.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::RubricError;
use crate::model::Artifact;

// ---------------------------------------------------------------------------
// Artifact and report I/O
// ---------------------------------------------------------------------------

/// Loads artifact text from a file or directory.
pub trait ArtifactLoader: Send + Sync {
    /// Load `path`. Missing paths yield [`RubricError::NotFound`].
    fn load(&self, path: &Path) -> Result<Artifact, RubricError>;
}

/// Persists a rendered report document.
pub trait ReportSink: Send + Sync {
    /// Write `document` as UTF-8, creating parent directories as needed.
    fn write(&self, path: &Path, document: &str) -> Result<(), RubricError>;
}

// ---------------------------------------------------------------------------
// Capability probes
// ---------------------------------------------------------------------------

/// Pass/total counts for one test category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub category: String,
    pub passed: u64,
    pub total: u64,
}

/// Defect counts reported by a bug detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugScan {
    /// Defects known to exist in the buggy input.
    pub known: u64,
    /// Defects the fix identified.
    pub discovered: u64,
    /// Defects the fix resolved.
    pub fixed: u64,
}

/// Quality of an applied fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub completely_fixed: bool,
    pub introduced_new_defects: bool,
}

/// Generic achieved/total counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub achieved: u64,
    pub total: u64,
}

impl Tally {
    pub fn new(achieved: u64, total: u64) -> Self {
        Self { achieved, total }
    }

    /// `total - achieved`, never negative.
    pub fn missing(&self) -> u64 {
        self.total.saturating_sub(self.achieved)
    }
}

/// Runs (or reports on) the artifact's tests.
pub trait TestRunner: Send + Sync {
    /// Per-category results. An empty list means nothing was run.
    fn run(&self, artifact: &Artifact) -> anyhow::Result<Vec<CategoryTally>>;
}

/// Reports how many defects a fix found and resolved.
pub trait BugDetector: Send + Sync {
    /// `None` when the detector has no data.
    fn scan(&self, artifact: &Artifact) -> anyhow::Result<Option<BugScan>>;

    /// `None` when the detector has no data.
    fn fix_outcome(&self, artifact: &Artifact) -> anyhow::Result<Option<FixOutcome>>;
}

/// Scores qualitative aspects of an artifact.
pub trait StaticAnalyzer: Send + Sync {
    /// Score for a named aspect, `None` when the analyzer cannot judge it.
    fn score_dimension(&self, artifact: &Artifact, name: &str) -> anyhow::Result<Option<f64>>;

    /// Implemented/planned feature counts, `None` when unknown.
    fn feature_tally(&self, artifact: &Artifact) -> anyhow::Result<Option<Tally>>;
}

/// A probe that never has anything to report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl TestRunner for NullProbe {
    fn run(&self, _: &Artifact) -> anyhow::Result<Vec<CategoryTally>> {
        Ok(Vec::new())
    }
}

impl BugDetector for NullProbe {
    fn scan(&self, _: &Artifact) -> anyhow::Result<Option<BugScan>> {
        Ok(None)
    }

    fn fix_outcome(&self, _: &Artifact) -> anyhow::Result<Option<FixOutcome>> {
        Ok(None)
    }
}

impl StaticAnalyzer for NullProbe {
    fn score_dimension(&self, _: &Artifact, _: &str) -> anyhow::Result<Option<f64>> {
        Ok(None)
    }

    fn feature_tally(&self, _: &Artifact) -> anyhow::Result<Option<Tally>> {
        Ok(None)
    }
}

/// The capability probes available to one evaluation run.
#[derive(Clone)]
pub struct Probes {
    pub tests: Arc<dyn TestRunner>,
    pub bugs: Arc<dyn BugDetector>,
    pub analyzer: Arc<dyn StaticAnalyzer>,
}

impl Probes {
    /// Probes that report nothing.
    pub fn none() -> Self {
        Self::shared(Arc::new(NullProbe))
    }

    /// Use one value for every capability.
    pub fn shared<P>(probe: Arc<P>) -> Self
    where
        P: TestRunner + BugDetector + StaticAnalyzer + 'static,
    {
        Self {
            tests: probe.clone(),
            bugs: probe.clone(),
            analyzer: probe,
        }
    }
}

impl Default for Probes {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Probes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probes").finish_non_exhaustive()
    }
}

/// Per-run inputs besides the artifact itself.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub probes: Probes,
    /// Wall-clock time the work took, for threshold buckets.
    pub elapsed_secs: Option<f64>,
    /// Overrides the expected total of pattern-count ratios.
    pub expected_total: Option<u64>,
}

impl EvalContext {
    pub fn with_probes(probes: Probes) -> Self {
        Self {
            probes,
            ..Self::default()
        }
    }
}
