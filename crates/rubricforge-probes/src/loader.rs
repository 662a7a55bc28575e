//! Filesystem artifact loading and batch discovery.

use std::path::{Path, PathBuf};

use rubricforge_core::engine::BatchInput;
use rubricforge_core::error::RubricError;
use rubricforge_core::model::{Artifact, Document, Domain};
use rubricforge_core::traits::ArtifactLoader;

/// Loads a single file, or every matching file under a directory.
#[derive(Debug, Clone)]
pub struct FsArtifactLoader {
    /// Lowercase extensions (without the dot) accepted inside directories.
    extensions: Vec<String>,
    /// Substring a file name must contain (case-insensitive), if set.
    name_filter: Option<String>,
}

impl FsArtifactLoader {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            name_filter: None,
        }
    }

    /// Loader using the domain's default extension allow-list.
    pub fn for_domain(domain: Domain) -> Self {
        Self::new(domain.default_extensions().iter().copied())
    }

    /// Only accept files whose name contains `filter`.
    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into().to_lowercase());
        self
    }

    fn accepts(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(n) => n.to_string_lossy().to_lowercase(),
            None => return false,
        };
        if let Some(filter) = &self.name_filter {
            if !name.contains(filter.as_str()) {
                return false;
            }
        }
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    fn collect(&self, root: &Path, dir: &Path, out: &mut Vec<Document>) -> Result<(), RubricError> {
        let entries = std::fs::read_dir(dir).map_err(|e| RubricError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| RubricError::io(dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| RubricError::io(&path, e))?;

            if file_type.is_dir() {
                self.collect(root, &path, out)?;
                continue;
            }
            if file_type.is_symlink() && path.is_dir() {
                tracing::debug!("not following directory symlink {}", path.display());
                continue;
            }
            if !self.accepts(&path) {
                continue;
            }

            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let relative = path
                        .strip_prefix(root)
                        .unwrap_or(&path)
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    out.push(Document {
                        path: relative,
                        content,
                    });
                }
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", path.display());
                }
            }
        }
        Ok(())
    }
}

impl ArtifactLoader for FsArtifactLoader {
    fn load(&self, path: &Path) -> Result<Artifact, RubricError> {
        if !path.exists() {
            return Err(RubricError::NotFound {
                path: path.to_path_buf(),
            });
        }

        if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|e| RubricError::io(path, e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            tracing::info!("loaded {}", path.display());
            return Ok(Artifact::from_text(name, content));
        }

        let mut documents = Vec::new();
        self.collect(path, path, &mut documents)?;
        if documents.is_empty() {
            tracing::warn!(
                "no files with extensions [{}] under {}",
                self.extensions.join(", "),
                path.display()
            );
        } else {
            tracing::info!("loaded {} files from {}", documents.len(), path.display());
        }
        Ok(Artifact::from_documents(documents))
    }
}

/// Find batch inputs directly inside `dir`: files named `<prefix><key>.<extension>`.
///
/// The identity key is the file stem without the prefix. Results are sorted
/// by path.
pub fn discover_batch_inputs(
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<Vec<BatchInput>, RubricError> {
    if !dir.is_dir() {
        return Err(RubricError::NotFound {
            path: dir.to_path_buf(),
        });
    }

    let extension = extension.trim_start_matches('.').to_lowercase();
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| RubricError::io(dir, e))? {
        let path = entry.map_err(|e| RubricError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .is_some_and(|e| e.to_string_lossy().to_lowercase() == extension);
        let matches_prefix = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(prefix));
        if matches_ext && matches_prefix {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            let name = stem.strip_prefix(prefix).unwrap_or(&stem).to_string();
            Some(BatchInput { name, path })
        })
        .collect())
}
