use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "parse-wrappers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract reference doc-blocks from the wrapper sources")]
#[command(
    long_about = "Scans the C++ wrapper sources for /*.. */ comment blocks and writes one \
                  reStructuredText fragment per source file into the reference directory."
)]
#[command(after_help = "EXAMPLES:\n  \
    parse-wrappers\n  \
    parse-wrappers --source-dir ../src --output-dir source/reference\n  \
    parse-wrappers --output-format json")]
pub struct DocsCli {
    /// Directory holding the wrapper sources
    #[arg(long, help = "Directory to scan (default: ../src)")]
    pub source_dir: Option<PathBuf>,

    /// Directory receiving the fragments
    #[arg(long, help = "Fragment directory (default: source/reference)")]
    pub output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Parser, Debug)]
#[command(name = "updatelib")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Refresh the vendored AMPL headers and binaries")]
#[command(
    long_about = "Downloads (or unpacks a local copy of) the libampl archive, then replaces \
                  src/include/ampl and the per-architecture directories under inst/libs."
)]
#[command(after_help = "EXAMPLES:\n  \
    updatelib\n  \
    updatelib ~/Downloads/libampl.zip\n  \
    updatelib --version-tag 2.0.1 --dry-run\n  \
    updatelib https://mirror.example.com/libampl.zip --insecure")]
pub struct SyncCli {
    /// Archive URL or local zip path
    #[arg(help = "HTTP(S) URL or local path of libampl.zip (default: templated URL)")]
    pub archive: Option<String>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Archive version substituted into the URL template
    #[arg(long, help = "Version used in the download URL (default: nightly)")]
    pub version_tag: Option<String>,

    #[arg(long, help = "Skip TLS certificate verification when downloading")]
    pub insecure: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show the sync plan without downloading or copying")]
    pub dry_run: bool,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<OutputFormat> for OutputMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

fn load_merged(config_path: Option<&PathBuf>, overrides: &CliOverrides) -> Result<Config> {
    let mut config = Config::load_with_defaults(config_path)?;
    config.merge_with_cli_args(overrides);
    config.validate()?;
    Ok(config)
}

fn verbosity(verbose: u8, quiet: bool) -> u8 {
    if quiet {
        0
    } else {
        verbose
    }
}

impl DocsCli {
    pub fn load_config(&self) -> Result<Config> {
        load_merged(self.config.as_ref(), &self.create_cli_overrides())
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_source_dir(self.source_dir.clone())
            .with_output_dir(self.output_dir.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        verbosity(self.verbose, self.quiet)
    }
}

impl SyncCli {
    pub fn load_config(&self) -> Result<Config> {
        load_merged(self.config.as_ref(), &self.create_cli_overrides())
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_version(self.version_tag.clone())
            .with_insecure(self.insecure)
    }

    pub fn verbosity_level(&self) -> u8 {
        verbosity(self.verbose, self.quiet)
    }
}
