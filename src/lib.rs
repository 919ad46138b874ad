pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod scanner;
pub mod sync;
pub mod ui;

// Public API re-exports
pub use cli::{DocsCli, OutputFormat, SyncCli};
pub use config::{ArchTarget, CliOverrides, Config, DocsConfig, FilterPolicy, SyncConfig};
pub use error::{Result, ToolsError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{BlockExtractor, DocBlock, DocExtractor, ExtractionProgress, ExtractionReport};
pub use scanner::{SourceFile, SourceScanner};
pub use sync::{ArchiveSource, Fetch, HttpFetcher, LibrarySync, SyncEvent, SyncPlan, SyncReport};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::io;
use std::path::Path;
use tokio::task::{self, JoinError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared driver behind the `parse-wrappers` and `updatelib` binaries.
pub struct RamplTools {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl RamplTools {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    pub fn from_docs_cli(cli_args: &DocsCli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Ok(Self::new(
            config,
            cli_args.output_format.into(),
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    pub fn from_sync_cli(cli_args: &SyncCli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Ok(Self::new(
            config,
            cli_args.output_format.into(),
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// Writes one reference fragment per wrapper source carrying doc-blocks.
    pub async fn extract_doc_blocks(&self) -> Result<ExtractionReport> {
        self.output_formatter.start_operation(&format!(
            "Scanning {} for doc-blocks",
            self.config.docs.source_dir.display()
        ));

        let extractor = DocExtractor::new(&self.config.docs)?;
        let file_progress = self.progress_manager.create_file_progress(0);

        let pb = file_progress.clone();
        let result = task::spawn_blocking(move || {
            let callback = move |progress: &ExtractionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            };
            extractor.run(Some(&callback))
        })
        .await
        .map_err(|e| task_failed("Extraction", e))?;

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Scanned {} sources", report.files_scanned),
            report.duration,
        );

        if report.fragments.is_empty() {
            self.output_formatter
                .warning("No doc-blocks found; no fragments were written");
        }

        Ok(report)
    }

    /// Picks the archive to sync from: the given location, or the
    /// version-templated default URL.
    pub fn resolve_archive(&self, location: Option<&str>) -> Result<ArchiveSource> {
        match location {
            Some(location) => ArchiveSource::parse(location),
            None => ArchiveSource::parse(&self.config.sync.default_url()),
        }
    }

    pub fn plan_update(&self, location: Option<&str>) -> Result<SyncPlan> {
        let source = self.resolve_archive(location)?;
        LibrarySync::new(self.config.sync.clone()).plan(&source)
    }

    /// Refreshes the vendored headers and binaries.
    pub async fn update_library(&self, location: Option<&str>) -> Result<SyncReport> {
        let source = self.resolve_archive(location)?;
        self.output_formatter.start_operation("Updating vendored AMPL library");

        let archive_progress = if source.is_remote() {
            self.progress_manager.create_download_progress()
        } else {
            self.progress_manager.create_spinner("Unpacking archive...")
        };

        let fetcher = HttpFetcher::new()
            .with_insecure(self.config.sync.insecure)
            .with_progress({
                let pb = archive_progress.clone();
                move |progress| ui::progress::update_download_progress(&pb, &progress)
            });

        let formatter = self.output_formatter.clone();
        let pb = archive_progress.clone();
        let library_sync = LibrarySync::with_fetcher(self.config.sync.clone(), fetcher)
            .with_observer(move |event| {
                if let SyncEvent::Extracted { .. } = event {
                    pb.finish_and_clear();
                }
                pb.suspend(|| formatter.sync_event(&event));
            });

        let result = task::spawn_blocking(move || library_sync.run(&source))
            .await
            .map_err(|e| task_failed("Library sync", e))?;

        archive_progress.finish_and_clear();
        result
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ToolsError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

fn task_failed(operation: &str, error: JoinError) -> ToolsError {
    ToolsError::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("{} task failed: {}", operation, error),
    ))
}

/// Installs the stderr log subscriber used by both binaries.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the crate's level from
/// warn to info and `-vv` to debug.
pub fn init_logging(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "rampl_tools=error",
        (false, 0) => "rampl_tools=warn",
        (false, 1) => "rampl_tools=info",
        _ => "rampl_tools=debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init()
        .ok();
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_tools(config: Config) -> RamplTools {
        RamplTools::new(config, OutputMode::Plain, 0, true)
    }

    #[test]
    fn test_creation_disables_progress_outside_human_mode() {
        let tools = RamplTools::new(Config::default(), OutputMode::Json, 1, false);
        assert!(!tools.progress_manager.is_enabled());
        assert_eq!(tools.config().docs.suffixes, vec![".cpp", ".h"]);

        let tools = RamplTools::new(Config::default(), OutputMode::Human, 0, true);
        assert!(!tools.progress_manager.is_enabled());
    }

    #[test]
    fn test_resolve_archive() {
        let mut config = Config::default();
        config.sync.version = "2.0.1".to_string();
        let tools = quiet_tools(config);

        match tools.resolve_archive(None).unwrap() {
            ArchiveSource::Remote(url) => assert!(url.as_str().contains("/2.0.1/")),
            other => panic!("expected remote archive, got {:?}", other),
        }

        assert!(!tools
            .resolve_archive(Some("libampl.zip"))
            .unwrap()
            .is_remote());
    }

    #[test]
    fn test_plan_update() {
        let tools = quiet_tools(Config::default());
        let plan = tools.plan_update(Some("libampl.zip")).unwrap();

        assert!(!plan.remote);
        assert_eq!(plan.archive, "libampl.zip");
        assert_eq!(plan.arches.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_doc_blocks() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("src");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(
            source_dir.join("ampl.cpp"),
            "/*.. alpha */\nint x;\n/*.. beta */\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.docs.source_dir = source_dir;
        config.docs.output_dir = temp_dir.path().join("reference");

        let report = quiet_tools(config).extract_doc_blocks().await.unwrap();

        assert_eq!(report.total_blocks, 2);
        let fragment = fs::read_to_string(temp_dir.path().join("reference/amplcpp.rst")).unwrap();
        let lines: Vec<&str> = fragment.lines().map(str::trim_end).collect();
        assert_eq!(lines, vec![".. alpha", ".. beta"]);
    }

    #[tokio::test]
    async fn test_extract_doc_blocks_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.docs.source_dir = temp_dir.path().join("absent");

        let result = quiet_tools(config).extract_doc_blocks().await;
        assert!(matches!(result, Err(ToolsError::MissingSource { .. })));
    }

    #[tokio::test]
    async fn test_update_library_from_local_archive() {
        use std::io::Write;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        {
            let mut writer = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, content) in [
                ("include/ampl/ampl.h", "h"),
                ("lib32/ampl.dll", "dll"),
                ("lib64/libampl.so", "so"),
                ("lib64/ampl.jar", "jar"),
            ] {
                writer.start_file(name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }

        let mut config = Config::default();
        config.sync.scratch_dir = root.join("tmp/libampl");
        config.sync.include_destination = root.join("src/include/ampl");
        for arch in &mut config.sync.arches {
            arch.destination = root.join("inst/libs").join(&arch.name);
        }

        let report = quiet_tools(config)
            .update_library(archive.to_str())
            .await
            .unwrap();

        assert!(!report.downloaded);
        assert_eq!(report.headers_copied, 1);
        assert!(root.join("inst/libs/x64/libampl.so").exists());
        assert!(!root.join("inst/libs/x64/ampl.jar").exists());
        assert!(root.join("inst/libs/i386/.gitignore").exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("rampl-tools.toml");

        RamplTools::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[docs]"));
        assert!(content.contains("[sync]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
    }
}
