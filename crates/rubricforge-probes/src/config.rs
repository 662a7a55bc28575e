//! Tool configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use rubricforge_core::model::Domain;

/// Top-level rubricforge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricforgeConfig {
    /// Directory reports are written to when no output path is given.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Default report format (`markdown`, `html`, `json` or `all`).
    #[serde(default = "default_format")]
    pub format: String,
    /// Rubric file overrides keyed by domain name.
    #[serde(default)]
    pub rubrics: BTreeMap<String, PathBuf>,
    /// File name prefix of batch inputs.
    #[serde(default = "default_batch_prefix")]
    pub batch_glob_prefix: String,
    /// File extension of batch inputs.
    #[serde(default = "default_batch_extension")]
    pub batch_extension: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_format() -> String {
    "markdown".to_string()
}
fn default_batch_prefix() -> String {
    "需求说明_".to_string()
}
fn default_batch_extension() -> String {
    "md".to_string()
}

impl Default for RubricforgeConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: default_format(),
            rubrics: BTreeMap::new(),
            batch_glob_prefix: default_batch_prefix(),
            batch_extension: default_batch_extension(),
        }
    }
}

impl RubricforgeConfig {
    /// Rubric override for a domain, if configured.
    pub fn rubric_for(&self, domain: Domain) -> Option<&Path> {
        self.rubrics.get(&domain.to_string()).map(PathBuf::as_path)
    }
}

/// Sample configuration written by `rubricforge init`.
pub const SAMPLE_CONFIG: &str = r#"# rubricforge configuration

# Reports are written here when no output path is given.
output_dir = "output"

# markdown, html, json or all
format = "markdown"

# Batch mode picks up files named <prefix><name>.<extension>.
batch_glob_prefix = "需求说明_"
batch_extension = "md"

# Replace a built-in rubric with your own file.
[rubrics]
# requirement = "rubrics/requirement.toml"
# backend = "${HOME}/rubrics/backend.toml"
"#;

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + len];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `rubricforge.toml` in the current directory
/// 2. `~/.config/rubricforge/config.toml`
///
/// Environment variable override: `RUBRICFORGE_OUTPUT_DIR`.
pub fn load_config_from(path: Option<&Path>) -> Result<RubricforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("rubricforge.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<RubricforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => RubricforgeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(dir) = std::env::var("RUBRICFORGE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }

    config.output_dir = resolve_path(&config.output_dir);
    config.rubrics = config
        .rubrics
        .iter()
        .map(|(domain, path)| (domain.clone(), resolve_path(path)))
        .collect();

    for domain in config.rubrics.keys() {
        if domain.parse::<Domain>().is_err() {
            tracing::warn!("ignoring rubric override for unknown domain '{domain}'");
        }
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("rubricforge"))
}
