use crate::error::{Result, ToolsError};
use crate::sync::FileFilter;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const IGNORE_MARKER: &str = ".gitignore";
pub const IGNORE_MARKER_CONTENT: &str = "*\n!.gitignore\n";

/// Removes `path` recursively, swallowing any failure.
///
/// A missing directory is the normal first-run case and is not logged as a
/// warning. Returns whether the directory is gone afterwards.
pub fn remove_dir_best_effort(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!("Could not remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Files copied into (and skipped for) one architecture directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyOutcome {
    pub copied: Vec<String>,
    pub skipped: Vec<String>,
}

/// Replaces vendored directories wholesale.
pub struct Destination {
    buffer_size: usize,
}

impl Destination {
    pub fn new() -> Self {
        Self {
            buffer_size: 64 * 1024,
        }
    }

    /// Clears `dest`, mirrors the whole `source` tree into it and writes the
    /// ignore marker. Returns the number of files copied.
    pub fn replace_tree(&self, source: &Path, dest: &Path) -> Result<usize> {
        ensure_directory(source)?;

        remove_dir_best_effort(dest);
        fs::create_dir_all(dest)?;

        let mut count = 0;
        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ToolsError::Io(e.into()))?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|_| ToolsError::InvalidPath {
                    path: entry.path().display().to_string(),
                })?;
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else if entry.path().is_file() {
                self.copy_file(entry.path(), &target)?;
                count += 1;
            }
        }

        write_ignore_marker(dest)?;
        Ok(count)
    }

    /// Clears `dest` and copies the regular files found directly in `source`
    /// that pass `filter`, then writes the ignore marker.
    pub fn replace_files(
        &self,
        source: &Path,
        dest: &Path,
        filter: &FileFilter,
    ) -> Result<CopyOutcome> {
        ensure_directory(source)?;

        remove_dir_best_effort(dest);
        fs::create_dir_all(dest)?;

        let mut outcome = CopyOutcome::default();
        for entry in WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ToolsError::Io(e.into()))?;
            if !entry.path().is_file() {
                continue;
            }

            let filename = entry.file_name().to_string_lossy().to_string();
            if !filter.should_copy(&filename) {
                outcome.skipped.push(filename);
                continue;
            }

            self.copy_file(entry.path(), &dest.join(&filename))?;
            outcome.copied.push(filename);
        }

        write_ignore_marker(dest)?;
        Ok(outcome)
    }

    fn copy_file(&self, source: &Path, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut reader = BufReader::with_capacity(self.buffer_size, fs::File::open(source)?);
        let mut writer = BufWriter::with_capacity(self.buffer_size, fs::File::create(dest)?);

        let total_bytes = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;

        if let Ok(metadata) = fs::metadata(source) {
            let _ = fs::set_permissions(dest, metadata.permissions());
            if let Ok(modified) = metadata.modified() {
                let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
            }
        }

        Ok(total_bytes)
    }
}

impl Default for Destination {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a fresh marker into `dir`, replacing any copied one along with its
/// permissions.
pub fn write_ignore_marker(dir: &Path) -> Result<()> {
    let marker = dir.join(IGNORE_MARKER);
    match fs::remove_file(&marker) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::write(marker, IGNORE_MARKER_CONTENT)?;
    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(ToolsError::MissingSource {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterPolicy;
    use tempfile::TempDir;

    fn populate(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_remove_missing_dir_is_silent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(remove_dir_best_effort(&temp_dir.path().join("never-created")));
    }

    #[test]
    fn test_remove_existing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("scratch");
        populate(&dir, &[("a/b.txt", "x")]);

        assert!(remove_dir_best_effort(&dir));
        assert!(!dir.exists());
    }

    #[test]
    fn test_replace_tree() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("include");
        let dest = temp_dir.path().join("src/include/ampl");
        populate(&source, &[("ampl.h", "h"), ("detail/util.h", "u")]);
        populate(&dest, &[("stale.h", "old")]);

        let count = Destination::new().replace_tree(&source, &dest).unwrap();

        assert_eq!(count, 2);
        assert!(dest.join("ampl.h").exists());
        assert_eq!(fs::read_to_string(dest.join("detail/util.h")).unwrap(), "u");
        assert!(!dest.join("stale.h").exists());
        assert_eq!(
            fs::read_to_string(dest.join(IGNORE_MARKER)).unwrap(),
            IGNORE_MARKER_CONTENT
        );
    }

    #[test]
    fn test_replace_files_applies_filter() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib64");
        let dest = temp_dir.path().join("inst/libs/x64");
        populate(
            &source,
            &[
                ("libampl.so", "so"),
                ("ampl.jar", "jar"),
                ("libampl-java.so", "java"),
                ("docs/readme.txt", "nested"),
            ],
        );
        populate(&dest, &[("old.so", "old")]);

        let filter = FileFilter::new(&FilterPolicy::default()).unwrap();
        let outcome = Destination::new()
            .replace_files(&source, &dest, &filter)
            .unwrap();

        assert_eq!(outcome.copied, vec!["libampl.so"]);
        assert_eq!(outcome.skipped, vec!["ampl.jar", "libampl-java.so"]);
        assert!(dest.join("libampl.so").exists());
        assert!(!dest.join("old.so").exists());
        assert!(!dest.join("docs").exists());
        assert!(dest.join(IGNORE_MARKER).exists());
    }

    #[test]
    fn test_marker_overrides_archive_copy() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib32");
        let dest = temp_dir.path().join("inst/libs/i386");
        populate(&source, &[(".gitignore", "vendor rules\n"), ("ampl.dll", "dll")]);

        Destination::new()
            .replace_files(&source, &dest, &FileFilter::allow_all())
            .unwrap();

        assert_eq!(
            fs::read_to_string(dest.join(IGNORE_MARKER)).unwrap(),
            IGNORE_MARKER_CONTENT
        );
    }

    #[test]
    fn test_read_only_archived_marker_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib64");
        let dest = temp_dir.path().join("inst/libs/x64");
        populate(&source, &[(".gitignore", "vendor rules\n"), ("libampl.so", "so")]);

        let archived = source.join(IGNORE_MARKER);
        let mut permissions = fs::metadata(&archived).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&archived, permissions).unwrap();

        let outcome = Destination::new()
            .replace_files(&source, &dest, &FileFilter::allow_all())
            .unwrap();

        assert!(outcome.copied.contains(&IGNORE_MARKER.to_string()));
        let marker = dest.join(IGNORE_MARKER);
        assert_eq!(fs::read_to_string(&marker).unwrap(), IGNORE_MARKER_CONTENT);
        assert!(!fs::metadata(&marker).unwrap().permissions().readonly());
    }

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("ampl.dll");
        let dest = temp_dir.path().join("out/ampl.dll");
        let content = vec![7u8; 200 * 1024];
        fs::write(&source, &content).unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(&source, mtime).unwrap();

        let copied = Destination::new().copy_file(&source, &dest).unwrap();

        assert_eq!(copied, content.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), content);
        let dest_mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(dest_mtime, mtime);
    }

    #[test]
    fn test_missing_source_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = Destination::new().replace_files(
            &temp_dir.path().join("lib32"),
            &temp_dir.path().join("out"),
            &FileFilter::allow_all(),
        );
        assert!(matches!(result, Err(ToolsError::MissingSource { .. })));
    }
}
