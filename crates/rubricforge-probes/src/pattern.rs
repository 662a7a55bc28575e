//! Test discovery by pattern matching.
//!
//! Counts test cases per category by scanning test source files. Discovered
//! tests are not executed, so every discovered test is reported as passed.

use regex::{Regex, RegexBuilder};

use rubricforge_core::error::RubricError;
use rubricforge_core::model::Artifact;
use rubricforge_core::traits::{CategoryTally, TestRunner};

/// Test-case prefixes understood by the default categories (pytest, mocha, jest).
const TEST_CASE_PREFIX: &str = r"(test_|it\s+should|describe\s*\(|it\s*\()";

/// A category name and the pattern that counts its test cases.
#[derive(Debug, Clone)]
pub struct TestCategory {
    pub name: String,
    pub pattern: Regex,
}

impl TestCategory {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, RubricError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RubricError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            name: name.into(),
            pattern,
        })
    }
}

/// Counts test cases in test files by category.
#[derive(Debug, Clone)]
pub struct PatternTestRunner {
    categories: Vec<TestCategory>,
    /// Test sources; when unset, test files are taken from the evaluated artifact.
    sources: Option<Artifact>,
}

impl PatternTestRunner {
    pub fn new(categories: Vec<TestCategory>) -> Self {
        Self {
            categories,
            sources: None,
        }
    }

    /// The functional, performance and security categories used by the
    /// backend rubric.
    pub fn backend_defaults() -> Result<Self, RubricError> {
        let keywords = [
            ("功能测试", "(功能|function)"),
            ("性能测试", "(性能|performance|load)"),
            ("安全测试", "(安全|security|auth)"),
        ];
        let categories = keywords
            .iter()
            .map(|(name, topic)| TestCategory::new(*name, &format!("{TEST_CASE_PREFIX}.*?{topic}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(categories))
    }

    /// Scan `sources` instead of the evaluated artifact.
    pub fn with_sources(mut self, sources: Artifact) -> Self {
        self.sources = Some(sources);
        self
    }

    fn is_test_file(path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        name.to_lowercase().contains("test")
    }
}

impl TestRunner for PatternTestRunner {
    fn run(&self, artifact: &Artifact) -> anyhow::Result<Vec<CategoryTally>> {
        let (source, filter) = match &self.sources {
            Some(sources) => (sources, false),
            None => (artifact, true),
        };
        let files: Vec<&str> = source
            .documents()
            .iter()
            .filter(|d| !filter || Self::is_test_file(&d.path))
            .map(|d| d.content.as_str())
            .collect();

        if files.is_empty() {
            tracing::debug!("no test files to scan");
            return Ok(Vec::new());
        }

        let tallies = self
            .categories
            .iter()
            .map(|category| {
                let count: u64 = files
                    .iter()
                    .map(|content| category.pattern.find_iter(content).count() as u64)
                    .sum();
                tracing::debug!("{}: {count} test cases", category.name);
                CategoryTally {
                    category: category.name.clone(),
                    passed: count,
                    total: count,
                }
            })
            .collect();
        Ok(tallies)
    }
}
