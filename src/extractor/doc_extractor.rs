use crate::config::DocsConfig;
use crate::error::Result;
use crate::extractor::{BlockExtractor, FragmentWriter};
use crate::scanner::SourceScanner;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub blocks_found: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            blocks_found: 0,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn update_file(&mut self, filename: String, blocks: usize) {
        self.files_processed += 1;
        self.blocks_found += blocks;
        self.current_file = Some(filename);
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// One fragment written during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentInfo {
    pub source: String,
    pub fragment: PathBuf,
    pub blocks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub files_scanned: usize,
    pub total_blocks: usize,
    pub fragments: Vec<FragmentInfo>,
    pub duration: Duration,
}

impl ExtractionReport {
    pub fn files_without_blocks(&self) -> usize {
        self.files_scanned - self.fragments.len()
    }
}

/// Scans the wrapper sources and writes one reference fragment per file that
/// carries doc-blocks.
pub struct DocExtractor {
    source_dir: PathBuf,
    scanner: SourceScanner,
    blocks: BlockExtractor,
    writer: FragmentWriter,
}

impl DocExtractor {
    pub fn new(config: &DocsConfig) -> Result<Self> {
        Ok(Self {
            source_dir: config.source_dir.clone(),
            scanner: SourceScanner::new(config),
            blocks: BlockExtractor::new(&config.block_pattern)?,
            writer: FragmentWriter::new(config.output_dir.clone(), config.fragment_extension.clone()),
        })
    }

    pub fn run(
        &self,
        progress_callback: Option<&dyn Fn(&ExtractionProgress)>,
    ) -> Result<ExtractionReport> {
        let sources = self.scanner.scan_directory(&self.source_dir)?;
        let mut progress = ExtractionProgress::new(sources.len());
        let mut fragments = Vec::new();

        for source in &sources {
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let text = source.read_text()?;
            let blocks = self.blocks.extract(&text);

            match self.writer.write(&source.filename, &blocks)? {
                Some(fragment) => {
                    info!(
                        "{}: {} blocks -> {}",
                        source.filename,
                        blocks.len(),
                        fragment.display()
                    );
                    fragments.push(FragmentInfo {
                        source: source.filename.clone(),
                        fragment,
                        blocks: blocks.len(),
                    });
                }
                None => debug!("{}: no doc-blocks", source.filename),
            }

            progress.update_file(source.filename.clone(), blocks.len());
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok(ExtractionReport {
            source_dir: self.source_dir.clone(),
            output_dir: self.writer.output_dir().to_path_buf(),
            files_scanned: progress.files_processed,
            total_blocks: progress.blocks_found,
            fragments,
            duration: progress.elapsed(),
        })
    }
}
