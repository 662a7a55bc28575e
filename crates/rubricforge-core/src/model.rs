//! Core data model types for rubricforge.
//!
//! These types describe what gets evaluated: the domain profile, the loaded
//! artifact text, and the detectors that look for evidence inside it.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::RubricError;

/// The kind of artifact a rubric evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Requirement,
    Frontend,
    Backend,
    Bug,
    Project,
}

impl Domain {
    /// Every built-in domain, in presentation order.
    pub const ALL: [Domain; 5] = [
        Domain::Requirement,
        Domain::Frontend,
        Domain::Backend,
        Domain::Bug,
        Domain::Project,
    ];

    /// File name of the Markdown report written when no output path is given.
    pub fn default_report_file(&self) -> &'static str {
        match self {
            Domain::Requirement => "需求分析评估报告.md",
            Domain::Frontend => "前端开发评估报告.md",
            Domain::Backend => "后端开发评估报告.md",
            Domain::Bug => "BUG修复评估报告.md",
            Domain::Project => "综合项目开发评估报告.md",
        }
    }

    /// File extensions picked up when the artifact path is a directory.
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Domain::Requirement => &["md", "txt"],
            Domain::Frontend => &["html", "vue", "jsx", "tsx", "js", "ts", "css"],
            Domain::Backend | Domain::Bug => &["py", "js", "ts", "java", "go"],
            Domain::Project => &["py", "js", "ts", "java", "go", "html", "css"],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Requirement => write!(f, "requirement"),
            Domain::Frontend => write!(f, "frontend"),
            Domain::Backend => write!(f, "backend"),
            Domain::Bug => write!(f, "bug"),
            Domain::Project => write!(f, "project"),
        }
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requirement" | "requirements" | "req" => Ok(Domain::Requirement),
            "frontend" | "fe" => Ok(Domain::Frontend),
            "backend" | "be" => Ok(Domain::Backend),
            "bug" | "bugfix" => Ok(Domain::Bug),
            "project" => Ok(Domain::Project),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// One loaded file of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the artifact root (or the file name for single files).
    pub path: String,
    /// File contents.
    pub content: String,
}

/// Read-only text under evaluation: a single document or a set of files.
///
/// Documents are kept sorted by path so every detector sees them in the same
/// order regardless of how the loader discovered them.
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    documents: Vec<Document>,
    folded: Vec<String>,
}

impl Artifact {
    /// An artifact made of one document.
    pub fn from_text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::from_documents(vec![Document {
            path: path.into(),
            content: content.into(),
        }])
    }

    /// An artifact made of several documents.
    pub fn from_documents(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        let folded = documents.iter().map(|d| d.content.to_lowercase()).collect();
        Self { documents, folded }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All document contents joined by newlines.
    pub fn combined_text(&self) -> String {
        self.documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `needle` occurs in any document, ignoring case.
    pub fn contains_folded(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.folded.iter().any(|text| text.contains(&needle))
    }
}

/// Decides whether (and how often) a criterion shows up in an artifact.
///
/// Both variants are case-insensitive. Patterns are unanchored searches.
#[derive(Debug, Clone)]
pub enum Detector {
    Keyword { needle: String, folded: String },
    Pattern(Regex),
}

impl Detector {
    pub fn keyword(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let folded = needle.to_lowercase();
        Detector::Keyword { needle, folded }
    }

    pub fn pattern(source: &str) -> Result<Self, RubricError> {
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Detector::Pattern)
            .map_err(|source_err| RubricError::InvalidPattern {
                pattern: source.to_string(),
                source: source_err,
            })
    }

    /// The keyword or pattern text as written in the rubric.
    pub fn source(&self) -> &str {
        match self {
            Detector::Keyword { needle, .. } => needle,
            Detector::Pattern(re) => re.as_str(),
        }
    }

    /// Whether the detector fires anywhere in the artifact.
    pub fn matches(&self, artifact: &Artifact) -> bool {
        match self {
            Detector::Keyword { folded, .. } => {
                artifact.folded.iter().any(|text| text.contains(folded.as_str()))
            }
            Detector::Pattern(re) => artifact.documents.iter().any(|d| re.is_match(&d.content)),
        }
    }

    /// Number of non-overlapping hits summed over all documents.
    pub fn count(&self, artifact: &Artifact) -> usize {
        match self {
            Detector::Keyword { folded, .. } => {
                if folded.is_empty() {
                    return 0;
                }
                artifact
                    .folded
                    .iter()
                    .map(|text| text.matches(folded.as_str()).count())
                    .sum()
            }
            Detector::Pattern(re) => artifact
                .documents
                .iter()
                .map(|d| re.find_iter(&d.content).count())
                .sum(),
        }
    }
}
