pub mod archive;
pub mod archive_source;
pub mod destination;
pub mod downloader;
pub mod file_filter;
pub mod library_sync;

pub use archive::extract_zip;
pub use archive_source::ArchiveSource;
pub use destination::{remove_dir_best_effort, CopyOutcome, Destination};
pub use downloader::{DownloadProgress, Fetch, HttpFetcher};
pub use file_filter::FileFilter;
pub use library_sync::{ArchReport, LibrarySync, PlannedArch, SyncEvent, SyncPlan, SyncReport};
