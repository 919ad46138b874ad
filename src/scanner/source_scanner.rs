use crate::config::DocsConfig;
use crate::error::{Result, ToolsError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A wrapper source file selected for doc-block extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub source_path: PathBuf,
    pub filename: String,
    pub size: u64,
}

impl SourceFile {
    pub fn new(source_path: PathBuf, size: u64) -> Self {
        let filename = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();

        Self {
            source_path,
            filename,
            size,
        }
    }

    pub fn read_text(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.source_path)?)
    }
}

pub struct SourceScanner {
    suffixes: Vec<String>,
}

impl SourceScanner {
    pub fn new(config: &DocsConfig) -> Self {
        Self::with_suffixes(config.suffixes.clone())
    }

    pub fn with_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-sensitive suffix match on the file name.
    pub fn is_source_file(&self, filename: &str) -> bool {
        self.suffixes.iter().any(|suffix| filename.ends_with(suffix.as_str()))
    }

    /// Lists the matching files directly inside `root`, sorted by name.
    ///
    /// Subdirectories are not descended into. Any error while listing aborts
    /// the scan.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<Vec<SourceFile>> {
        let root_path = root.as_ref();

        if !root_path.exists() {
            return Err(ToolsError::MissingSource {
                path: root_path.display().to_string(),
            });
        }

        if !root_path.is_dir() {
            return Err(ToolsError::InvalidPath {
                path: format!("{} is not a directory", root_path.display()),
            });
        }

        let mut sources = Vec::new();

        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| ToolsError::Io(e.into()))?;

            // Follows symlinks, so linked sources are scanned too.
            if !entry.path().is_file() {
                continue;
            }

            let Some(filename) = entry.file_name().to_str() else {
                warn!(
                    "Skipping source with non UTF-8 file name, no fragment will be written: {}",
                    entry.path().display()
                );
                continue;
            };

            if !self.is_source_file(filename) {
                continue;
            }

            let metadata = std::fs::metadata(entry.path())?;
            sources.push(SourceFile::new(entry.path().to_path_buf(), metadata.len()));
        }

        debug!(
            "Found {} source files in {}",
            sources.len(),
            root_path.display()
        );

        Ok(sources)
    }
}
