use crate::config::SyncConfig;
use crate::error::Result;
use crate::sync::archive::extract_zip;
use crate::sync::destination::{remove_dir_best_effort, Destination};
use crate::sync::{ArchiveSource, Fetch, FileFilter, HttpFetcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Milestones of a sync run, in the order they happen.
#[derive(Debug, Clone)]
pub enum SyncEvent<'a> {
    Downloading { url: &'a str },
    Extracted { files: usize, scratch: &'a Path },
    Headers { destination: &'a Path, files: usize },
    ArchStarted { name: &'a str, destination: &'a Path },
    FileCopied { arch: &'a str, filename: &'a str },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchReport {
    pub name: String,
    pub destination: PathBuf,
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub archive: String,
    pub downloaded: bool,
    pub files_extracted: usize,
    pub include_destination: PathBuf,
    pub headers_copied: usize,
    pub arches: Vec<ArchReport>,
    pub duration: Duration,
}

impl SyncReport {
    pub fn total_copied(&self) -> usize {
        self.headers_copied + self.arches.iter().map(|a| a.copied.len()).sum::<usize>()
    }
}

/// What a run would do, resolved without touching disk or network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPlan {
    pub archive: String,
    pub remote: bool,
    pub insecure: bool,
    pub scratch_dir: PathBuf,
    pub include_source: PathBuf,
    pub include_destination: PathBuf,
    pub arches: Vec<PlannedArch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedArch {
    pub name: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub filter: String,
}

type EventObserver = Box<dyn for<'a> Fn(SyncEvent<'a>) + Send + Sync>;

/// Refreshes the vendored headers and per-architecture binaries from a
/// vendor archive.
///
/// The run is strictly linear: clear scratch, obtain archive, extract,
/// replace the include tree, replace each architecture directory. The first
/// failing step aborts the run and leaves earlier steps in place.
pub struct LibrarySync<F: Fetch = HttpFetcher> {
    config: SyncConfig,
    fetcher: F,
    root: PathBuf,
    destination: Destination,
    observer: Option<EventObserver>,
}

impl LibrarySync<HttpFetcher> {
    pub fn new(config: SyncConfig) -> Self {
        let fetcher = HttpFetcher::new().with_insecure(config.insecure);
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: Fetch> LibrarySync<F> {
    pub fn with_fetcher(config: SyncConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            root: PathBuf::from("."),
            destination: Destination::new(),
            observer: None,
        }
    }

    /// Directory the configured relative paths are resolved against.
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: for<'a> Fn(SyncEvent<'a>) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// The archive used when no location is given.
    pub fn default_source(&self) -> Result<ArchiveSource> {
        ArchiveSource::parse(&self.config.default_url())
    }

    pub fn plan(&self, source: &ArchiveSource) -> Result<SyncPlan> {
        let arches = self
            .config
            .arches
            .iter()
            .map(|arch| {
                Ok(PlannedArch {
                    name: arch.name.clone(),
                    source: self.scratch_dir().join(&arch.source),
                    destination: self.root.join(&arch.destination),
                    filter: FileFilter::new(&arch.filter)?.describe(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SyncPlan {
            archive: source.to_string(),
            remote: source.is_remote(),
            insecure: self.config.insecure,
            scratch_dir: self.scratch_dir(),
            include_source: self.scratch_dir().join(&self.config.include_source),
            include_destination: self.root.join(&self.config.include_destination),
            arches,
        })
    }

    pub fn run(&self, source: &ArchiveSource) -> Result<SyncReport> {
        let start = Instant::now();
        let scratch = self.scratch_dir();

        remove_dir_best_effort(&scratch);

        let files_extracted = self.obtain_and_extract(source, &scratch)?;
        self.emit(SyncEvent::Extracted {
            files: files_extracted,
            scratch: &scratch,
        });

        let include_destination = self.root.join(&self.config.include_destination);
        let headers_copied = self.destination.replace_tree(
            &scratch.join(&self.config.include_source),
            &include_destination,
        )?;
        info!(
            "headers: {} ({} files)",
            include_destination.display(),
            headers_copied
        );
        self.emit(SyncEvent::Headers {
            destination: &include_destination,
            files: headers_copied,
        });

        let mut arches = Vec::with_capacity(self.config.arches.len());
        for arch in &self.config.arches {
            let filter = FileFilter::new(&arch.filter)?;
            let destination = self.root.join(&arch.destination);

            self.emit(SyncEvent::ArchStarted {
                name: &arch.name,
                destination: &destination,
            });

            let outcome =
                self.destination
                    .replace_files(&scratch.join(&arch.source), &destination, &filter)?;

            for filename in &outcome.copied {
                self.emit(SyncEvent::FileCopied {
                    arch: &arch.name,
                    filename,
                });
            }
            info!(
                "{} ({}): {} copied, {} skipped",
                arch.name,
                destination.display(),
                outcome.copied.len(),
                outcome.skipped.len()
            );

            arches.push(ArchReport {
                name: arch.name.clone(),
                destination,
                copied: outcome.copied,
                skipped: outcome.skipped,
            });
        }

        Ok(SyncReport {
            archive: source.to_string(),
            downloaded: source.is_remote(),
            files_extracted,
            include_destination,
            headers_copied,
            arches,
            duration: start.elapsed(),
        })
    }

    fn obtain_and_extract(&self, source: &ArchiveSource, scratch: &Path) -> Result<usize> {
        match source {
            ArchiveSource::Remote(url) => {
                self.emit(SyncEvent::Downloading { url: url.as_str() });
                info!("Downloading: {}", url);

                let archive = self.fetcher.fetch(url)?;
                let files = extract_zip(archive.path(), scratch)?;

                if let Err(e) = archive.close() {
                    warn!("Could not delete downloaded archive: {}", e);
                }

                Ok(files)
            }
            ArchiveSource::Local(path) => {
                info!("Using local archive: {}", path.display());
                extract_zip(path, scratch)
            }
        }
    }

    fn scratch_dir(&self) -> PathBuf {
        self.root.join(&self.config.scratch_dir)
    }

    fn emit(&self, event: SyncEvent<'_>) {
        if let Some(ref observer) = self.observer {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchTarget, FilterPolicy};
    use crate::error::ToolsError;
    use crate::sync::destination::{IGNORE_MARKER, IGNORE_MARKER_CONTENT};
    use std::collections::BTreeMap;
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::{NamedTempFile, TempDir};
    use url::Url;
    use walkdir::WalkDir;

    const ARCHIVE_FILES: &[(&str, &[u8])] = &[
        ("include/ampl/ampl.h", b"#include \"ampl/environment.h\"\n"),
        ("include/ampl/environment.h", b"class Environment;\n"),
        ("lib32/ampl.dll", b"MZ32"),
        ("lib32/ampl.jar", b"PK"),
        ("lib64/libampl.so", b"\x7fELF64"),
        ("lib64/libampl-csharp.so", b"\x7fELF"),
        ("lib64/libampl-java.so", b"\x7fELF"),
    ];

    fn create_test_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (entry_name, content) in files {
            writer.start_file(entry_name.to_string(), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    /// Serves a prepared zip, counts how often it was asked to and remembers
    /// where the download landed.
    struct FakeFetcher {
        files: &'static [(&'static str, &'static [u8])],
        corrupt: bool,
        calls: Arc<AtomicUsize>,
        fetched: Arc<Mutex<Option<PathBuf>>>,
    }

    impl FakeFetcher {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                files: ARCHIVE_FILES,
                corrupt: false,
                calls,
                fetched: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Fetch for FakeFetcher {
        fn fetch(&self, _url: &Url) -> Result<NamedTempFile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let temp = NamedTempFile::new()?;
            if self.corrupt {
                fs::write(temp.path(), b"<html>404 Not Found</html>")?;
            } else {
                create_test_zip(temp.path(), self.files);
            }
            *self.fetched.lock().unwrap() = Some(temp.path().to_path_buf());
            Ok(temp)
        }
    }

    fn fake_sync(root: &Path) -> (LibrarySync<FakeFetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = FakeFetcher::new(calls.clone());
        let sync = LibrarySync::with_fetcher(SyncConfig::default(), fetcher).with_root(root);
        (sync, calls)
    }

    fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(dir).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_remote_archive_populates_destinations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let (sync, calls) = fake_sync(root);

        let report = sync.run(&sync.default_source().unwrap()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.downloaded);
        assert_eq!(report.files_extracted, ARCHIVE_FILES.len());
        assert_eq!(report.headers_copied, 2);

        let include = root.join("src/include/ampl");
        assert!(include.join("ampl.h").exists());
        assert_eq!(
            fs::read_to_string(include.join(IGNORE_MARKER)).unwrap(),
            IGNORE_MARKER_CONTENT
        );

        let i386 = root.join("inst/libs/i386");
        assert!(i386.join("ampl.dll").exists());
        assert!(!i386.join("ampl.jar").exists());
        assert!(i386.join(IGNORE_MARKER).exists());

        let x64 = root.join("inst/libs/x64");
        assert!(x64.join("libampl.so").exists());
        assert!(!x64.join("libampl-java.so").exists());
        assert!(!x64.join("libampl-csharp.so").exists());

        assert_eq!(report.arches[1].copied, vec!["libampl.so"]);
        assert_eq!(report.total_copied(), 4);
    }

    #[test]
    fn test_downloaded_archive_is_deleted_after_run() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new(Arc::new(AtomicUsize::new(0)));
        let fetched = fetcher.fetched.clone();
        let sync = LibrarySync::with_fetcher(SyncConfig::default(), fetcher)
            .with_root(temp_dir.path());

        sync.run(&sync.default_source().unwrap()).unwrap();

        let path = fetched.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_downloaded_archive_is_deleted_when_extraction_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = FakeFetcher::new(Arc::new(AtomicUsize::new(0)));
        fetcher.corrupt = true;
        let fetched = fetcher.fetched.clone();
        let sync = LibrarySync::with_fetcher(SyncConfig::default(), fetcher)
            .with_root(temp_dir.path());

        let result = sync.run(&sync.default_source().unwrap());

        assert!(matches!(result, Err(ToolsError::Archive { .. })));
        let path = fetched.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
        assert!(!temp_dir.path().join("src/include/ampl").exists());
    }

    #[test]
    fn test_local_archive_never_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        create_test_zip(&archive, ARCHIVE_FILES);

        let (sync, calls) = fake_sync(root);
        let report = sync.run(&ArchiveSource::Local(archive.clone())).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!report.downloaded);
        assert!(archive.exists());
        assert!(root.join("inst/libs/x64/libampl.so").exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        create_test_zip(&archive, ARCHIVE_FILES);
        let (sync, _) = fake_sync(root);
        let source = ArchiveSource::Local(archive);

        sync.run(&source).unwrap();
        let first = (snapshot(&root.join("src")), snapshot(&root.join("inst")));

        sync.run(&source).unwrap();
        let second = (snapshot(&root.join("src")), snapshot(&root.join("inst")));

        assert_eq!(first, second);
    }

    #[test]
    fn test_marker_regenerated_after_deletion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        create_test_zip(&archive, ARCHIVE_FILES);
        let (sync, _) = fake_sync(root);
        let source = ArchiveSource::Local(archive);

        sync.run(&source).unwrap();
        let marker = root.join("inst/libs/i386").join(IGNORE_MARKER);
        fs::remove_file(&marker).unwrap();
        fs::write(root.join("inst/libs/i386/leftover.dll"), "old").unwrap();

        sync.run(&source).unwrap();

        assert_eq!(fs::read_to_string(&marker).unwrap(), IGNORE_MARKER_CONTENT);
        assert!(!root.join("inst/libs/i386/leftover.dll").exists());
    }

    #[test]
    fn test_configured_filter_policies() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        create_test_zip(&archive, ARCHIVE_FILES);

        let mut config = SyncConfig::default();
        config.arches = vec![
            ArchTarget {
                name: "i386".to_string(),
                source: PathBuf::from("lib32"),
                destination: PathBuf::from("libs/i386"),
                filter: FilterPolicy::All,
            },
            ArchTarget {
                name: "x64".to_string(),
                source: PathBuf::from("lib64"),
                destination: PathBuf::from("libs/x64"),
                filter: FilterPolicy::Allow {
                    patterns: vec![r"csharp".to_string()],
                },
            },
        ];

        let sync = LibrarySync::new(config).with_root(root);
        let report = sync.run(&ArchiveSource::Local(archive)).unwrap();

        assert_eq!(report.arches[0].copied, vec!["ampl.dll", "ampl.jar"]);
        assert_eq!(report.arches[1].copied, vec!["libampl-csharp.so"]);
        assert_eq!(report.arches[1].skipped.len(), 2);
    }

    #[test]
    fn test_missing_arch_directory_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let archive = root.join("libampl.zip");
        create_test_zip(
            &archive,
            &[("include/ampl/ampl.h", b"h"), ("lib32/ampl.dll", b"dll")],
        );
        let (sync, _) = fake_sync(root);

        let result = sync.run(&ArchiveSource::Local(archive));

        assert!(matches!(result, Err(ToolsError::MissingSource { .. })));
        // Steps before the failure stay applied.
        assert!(root.join("src/include/ampl/ampl.h").exists());
        assert!(root.join("inst/libs/i386/ampl.dll").exists());
    }

    #[test]
    fn test_events_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let (sync, _) = fake_sync(temp_dir.path());
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();

        let sync = sync.with_observer(move |event| {
            let line = match event {
                SyncEvent::Downloading { .. } => "download".to_string(),
                SyncEvent::Extracted { files, .. } => format!("extracted {}", files),
                SyncEvent::Headers { files, .. } => format!("headers {}", files),
                SyncEvent::ArchStarted { name, .. } => format!("arch {}", name),
                SyncEvent::FileCopied { filename, .. } => format!("file {}", filename),
            };
            log_clone.lock().unwrap().push(line);
        });

        sync.run(&sync.default_source().unwrap()).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "download",
                "extracted 7",
                "headers 2",
                "arch i386",
                "file ampl.dll",
                "arch x64",
                "file libampl.so",
            ]
        );
    }

    #[test]
    fn test_plan_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (sync, calls) = fake_sync(temp_dir.path());

        let plan = sync.plan(&sync.default_source().unwrap()).unwrap();

        assert!(plan.remote);
        assert_eq!(plan.arches.len(), 2);
        assert_eq!(plan.arches[0].filter, "all files except *.jar, *java*, *csharp*");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!temp_dir.path().join("tmp").exists());
    }
}
