use crate::config::FilterPolicy;
use crate::error::{Result, ToolsError};
use regex::Regex;

/// Compiled form of a [`FilterPolicy`].
#[derive(Debug)]
pub struct FileFilter {
    exclude_suffixes: Vec<String>,
    exclude_substrings: Vec<String>,
    allow_patterns: Option<Vec<Regex>>,
}

impl FileFilter {
    pub fn new(policy: &FilterPolicy) -> Result<Self> {
        let filter = match policy {
            FilterPolicy::All => Self::allow_all(),
            FilterPolicy::Exclude {
                suffixes,
                substrings,
            } => Self {
                exclude_suffixes: suffixes.clone(),
                exclude_substrings: substrings.clone(),
                allow_patterns: None,
            },
            FilterPolicy::Allow { patterns } => {
                let compiled = patterns
                    .iter()
                    .map(|pattern| {
                        Regex::new(pattern).map_err(|e| ToolsError::Pattern {
                            pattern: pattern.clone(),
                            message: e.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Self {
                    exclude_suffixes: Vec::new(),
                    exclude_substrings: Vec::new(),
                    allow_patterns: Some(compiled),
                }
            }
        };

        Ok(filter)
    }

    pub fn allow_all() -> Self {
        Self {
            exclude_suffixes: Vec::new(),
            exclude_substrings: Vec::new(),
            allow_patterns: None,
        }
    }

    pub fn should_copy(&self, filename: &str) -> bool {
        if let Some(ref patterns) = self.allow_patterns {
            return patterns.iter().any(|pattern| pattern.is_match(filename));
        }

        if self
            .exclude_suffixes
            .iter()
            .any(|suffix| filename.ends_with(suffix.as_str()))
        {
            return false;
        }

        !self
            .exclude_substrings
            .iter()
            .any(|needle| filename.contains(needle.as_str()))
    }

    pub fn describe(&self) -> String {
        match self.allow_patterns {
            Some(ref patterns) => format!(
                "only files matching {}",
                patterns
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None if self.exclude_suffixes.is_empty() && self.exclude_substrings.is_empty() => {
                "all files".to_string()
            }
            None => {
                let mut rules: Vec<String> = self
                    .exclude_suffixes
                    .iter()
                    .map(|s| format!("*{}", s))
                    .collect();
                rules.extend(self.exclude_substrings.iter().map(|s| format!("*{}*", s)));
                format!("all files except {}", rules.join(", "))
            }
        }
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}
