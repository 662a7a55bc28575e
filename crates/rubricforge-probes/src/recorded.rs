//! Capability probes replayed from a recorded results file.
//!
//! Test runs, bug scans and static analysis happen outside rubricforge; their
//! outcomes are written to a TOML or JSON file and replayed here. A missing
//! section means the capability reported nothing.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rubricforge_core::model::Artifact;
use rubricforge_core::traits::{
    BugDetector, BugScan, CategoryTally, FixOutcome, StaticAnalyzer, Tally, TestRunner,
};

use crate::error::ProbeError;

/// Defect counts and fix outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedBugs {
    #[serde(default)]
    pub known: u64,
    #[serde(default)]
    pub discovered: u64,
    #[serde(default)]
    pub fixed: u64,
    /// Unset when no regression run was recorded.
    #[serde(default)]
    pub completely_fixed: Option<bool>,
    #[serde(default)]
    pub introduced_new_defects: Option<bool>,
}

/// Implemented over planned features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFeatures {
    pub implemented: u64,
    pub total: u64,
}

/// All recorded probe results for one artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedProbes {
    #[serde(default)]
    pub bugs: Option<RecordedBugs>,
    #[serde(default)]
    pub tests: Vec<CategoryTally>,
    #[serde(default)]
    pub features: Option<RecordedFeatures>,
    /// Static analyzer score per aspect name.
    #[serde(default)]
    pub aspects: HashMap<String, f64>,
}

impl RecordedProbes {
    /// Load from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read probe results: {}", path.display()))?;

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let probes = match ext.as_str() {
            "toml" => toml::from_str(&content)
                .with_context(|| format!("failed to parse TOML: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse JSON: {}", path.display()))?,
            _ => {
                return Err(ProbeError::UnsupportedFormat {
                    path: path.to_path_buf(),
                }
                .into())
            }
        };
        tracing::debug!("loaded probe results from {}", path.display());
        Ok(probes)
    }

    /// Whether any test category was recorded.
    pub fn has_tests(&self) -> bool {
        !self.tests.is_empty()
    }
}

impl TestRunner for RecordedProbes {
    fn run(&self, _artifact: &Artifact) -> Result<Vec<CategoryTally>> {
        Ok(self.tests.clone())
    }
}

impl BugDetector for RecordedProbes {
    fn scan(&self, _artifact: &Artifact) -> Result<Option<BugScan>> {
        Ok(self.bugs.as_ref().map(|b| BugScan {
            known: b.known,
            discovered: b.discovered,
            fixed: b.fixed,
        }))
    }

    fn fix_outcome(&self, _artifact: &Artifact) -> Result<Option<FixOutcome>> {
        Ok(self.bugs.as_ref().and_then(|b| {
            b.completely_fixed.map(|completely_fixed| FixOutcome {
                completely_fixed,
                introduced_new_defects: b.introduced_new_defects.unwrap_or(false),
            })
        }))
    }
}

impl StaticAnalyzer for RecordedProbes {
    fn score_dimension(&self, _artifact: &Artifact, name: &str) -> Result<Option<f64>> {
        Ok(self.aspects.get(name).copied())
    }

    fn feature_tally(&self, _artifact: &Artifact) -> Result<Option<Tally>> {
        Ok(self.features.map(|f| Tally::new(f.implemented, f.total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
[bugs]
known = 3
discovered = 3
fixed = 2
completely_fixed = true
introduced_new_defects = true

[[tests]]
category = "单元测试"
passed = 15
total = 20

[features]
implemented = 7
total = 8

[aspects]
"代码质量" = 2.5
"#;

    fn artifact() -> Artifact {
        Artifact::from_text("x", "")
    }

    #[test]
    fn load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probes.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let probes = RecordedProbes::load(&path).unwrap();
        assert!(probes.has_tests());
        assert_eq!(
            probes.scan(&artifact()).unwrap(),
            Some(BugScan {
                known: 3,
                discovered: 3,
                fixed: 2
            })
        );
        assert_eq!(
            probes.fix_outcome(&artifact()).unwrap(),
            Some(FixOutcome {
                completely_fixed: true,
                introduced_new_defects: true
            })
        );
        assert_eq!(probes.run(&artifact()).unwrap()[0].passed, 15);
        assert_eq!(
            probes.feature_tally(&artifact()).unwrap(),
            Some(Tally::new(7, 8))
        );
        assert_eq!(
            probes.score_dimension(&artifact(), "代码质量").unwrap(),
            Some(2.5)
        );
        assert_eq!(probes.score_dimension(&artifact(), "安全性").unwrap(), None);
    }

    #[test]
    fn load_json_with_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probes.json");
        std::fs::write(&path, r#"{"bugs": {"known": 3, "discovered": 1}}"#).unwrap();

        let probes = RecordedProbes::load(&path).unwrap();
        assert!(!probes.has_tests());
        assert_eq!(probes.scan(&artifact()).unwrap().unwrap().discovered, 1);
        assert_eq!(probes.fix_outcome(&artifact()).unwrap(), None);
        assert_eq!(probes.feature_tally(&artifact()).unwrap(), None);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probes.yaml");
        std::fs::write(&path, "bugs: {}").unwrap();
        let err = RecordedProbes::load(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported format"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probes.toml");
        std::fs::write(&path, "[bugs\nknown = ").unwrap();
        let err = RecordedProbes::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse TOML"));
    }
}
