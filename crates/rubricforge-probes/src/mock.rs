//! Mock probes for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use rubricforge_core::model::Artifact;
use rubricforge_core::traits::{
    BugDetector, BugScan, CategoryTally, FixOutcome, StaticAnalyzer, Tally, TestRunner,
};

/// A configurable probe for exercising the engine without real tools.
///
/// Every capability returns the configured value and counts its calls.
#[derive(Debug, Default)]
pub struct MockProbes {
    tests: Vec<CategoryTally>,
    scan: Option<BugScan>,
    outcome: Option<FixOutcome>,
    aspects: HashMap<String, f64>,
    features: Option<Tally>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    call_count: AtomicU32,
}

impl MockProbes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test(mut self, category: &str, passed: u64, total: u64) -> Self {
        self.tests.push(CategoryTally {
            category: category.to_string(),
            passed,
            total,
        });
        self
    }

    pub fn with_scan(mut self, known: u64, discovered: u64, fixed: u64) -> Self {
        self.scan = Some(BugScan {
            known,
            discovered,
            fixed,
        });
        self
    }

    pub fn with_outcome(mut self, completely_fixed: bool, introduced_new_defects: bool) -> Self {
        self.outcome = Some(FixOutcome {
            completely_fixed,
            introduced_new_defects,
        });
        self
    }

    pub fn with_aspect(mut self, name: &str, score: f64) -> Self {
        self.aspects.insert(name.to_string(), score);
        self
    }

    pub fn with_features(mut self, implemented: u64, total: u64) -> Self {
        self.features = Some(Tally::new(implemented, total));
        self
    }

    /// Make every call fail, as a crashed external tool would.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Number of probe calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn record(&self) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(()),
        }
    }
}

impl TestRunner for MockProbes {
    fn run(&self, _: &Artifact) -> anyhow::Result<Vec<CategoryTally>> {
        self.record()?;
        Ok(self.tests.clone())
    }
}

impl BugDetector for MockProbes {
    fn scan(&self, _: &Artifact) -> anyhow::Result<Option<BugScan>> {
        self.record()?;
        Ok(self.scan)
    }

    fn fix_outcome(&self, _: &Artifact) -> anyhow::Result<Option<FixOutcome>> {
        self.record()?;
        Ok(self.outcome)
    }
}

impl StaticAnalyzer for MockProbes {
    fn score_dimension(&self, _: &Artifact, name: &str) -> anyhow::Result<Option<f64>> {
        self.record()?;
        Ok(self.aspects.get(name).copied())
    }

    fn feature_tally(&self, _: &Artifact) -> anyhow::Result<Option<Tally>> {
        self.record()?;
        Ok(self.features)
    }
}
