use crate::error::{Result, ToolsError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub docs: DocsConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub suffixes: Vec<String>,
    pub block_pattern: String,
    pub fragment_extension: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub version: String,
    pub url_template: String,
    pub insecure: bool,
    pub scratch_dir: PathBuf,
    pub include_source: PathBuf,
    pub include_destination: PathBuf,
    pub arches: Vec<ArchTarget>,
}

/// One architecture-specific binary directory inside the vendor archive.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArchTarget {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(default)]
    pub filter: FilterPolicy,
}

/// Which files of an architecture directory get copied.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum FilterPolicy {
    All,
    Exclude {
        #[serde(default)]
        suffixes: Vec<String>,
        #[serde(default)]
        substrings: Vec<String>,
    },
    Allow {
        patterns: Vec<String>,
    },
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::Exclude {
            suffixes: vec![".jar".to_string()],
            substrings: vec!["java".to_string(), "csharp".to_string()],
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("../src"),
            output_dir: PathBuf::from("source").join("reference"),
            suffixes: vec![".cpp".to_string(), ".h".to_string()],
            block_pattern: r"(?s)/\*(\.\..*?)\*/".to_string(),
            fragment_extension: "rst".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            version: "nightly".to_string(),
            url_template: "http://ampl.com/dl/API/future/{version}/libampl.zip".to_string(),
            insecure: false,
            scratch_dir: PathBuf::from("tmp").join("libampl"),
            include_source: PathBuf::from("include").join("ampl"),
            include_destination: PathBuf::from("src").join("include").join("ampl"),
            arches: vec![
                ArchTarget {
                    name: "i386".to_string(),
                    source: PathBuf::from("lib32"),
                    destination: PathBuf::from("inst").join("libs").join("i386"),
                    filter: FilterPolicy::default(),
                },
                ArchTarget {
                    name: "x64".to_string(),
                    source: PathBuf::from("lib64"),
                    destination: PathBuf::from("inst").join("libs").join("x64"),
                    filter: FilterPolicy::default(),
                },
            ],
        }
    }
}

impl SyncConfig {
    /// The archive URL with `{version}` substituted.
    pub fn default_url(&self) -> String {
        self.url_template.replace("{version}", &self.version)
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ToolsError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ToolsError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ToolsError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["rampl-tools.toml", ".rampl-tools.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref source_dir) = cli_args.source_dir {
            self.docs.source_dir = source_dir.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.docs.output_dir = output_dir.clone();
        }

        if let Some(ref version) = cli_args.version {
            self.sync.version = version.clone();
        }

        if cli_args.insecure {
            self.sync.insecure = true;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ToolsError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ToolsError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.docs.suffixes.is_empty() {
            return Err(ToolsError::Config {
                message: "At least one source file suffix must be specified".to_string(),
            });
        }

        Regex::new(&self.docs.block_pattern).map_err(|e| ToolsError::Pattern {
            pattern: self.docs.block_pattern.clone(),
            message: e.to_string(),
        })?;

        if self.sync.arches.is_empty() {
            return Err(ToolsError::Config {
                message: "At least one architecture must be configured".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for arch in &self.sync.arches {
            if !seen.insert(arch.name.as_str()) {
                return Err(ToolsError::Config {
                    message: format!("Architecture '{}' is configured twice", arch.name),
                });
            }

            if let FilterPolicy::Allow { patterns } = &arch.filter {
                for pattern in patterns {
                    Regex::new(pattern).map_err(|e| ToolsError::Pattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    })?;
                }
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub version: Option<String>,
    pub insecure: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_dir(mut self, source_dir: Option<PathBuf>) -> Self {
        self.source_dir = source_dir;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }
}
