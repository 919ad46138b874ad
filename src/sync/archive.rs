use crate::error::{Result, ToolsError};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Extracts every entry of the zip at `archive_path` below `dest_path`.
///
/// Returns the number of files written. Entries whose names would escape
/// `dest_path` are skipped.
pub fn extract_zip(archive_path: &Path, dest_path: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ToolsError::MissingSource {
                path: archive_path.display().to_string(),
            }
        } else {
            ToolsError::Io(e)
        }
    })?;

    let mut archive = zip::ZipArchive::new(file)?;
    fs::create_dir_all(dest_path)?;

    let mut count = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let Some(entry_path) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path: {}", entry.name());
            continue;
        };

        let output_path = dest_path.join(entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = fs::File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&output_path, fs::Permissions::from_mode(mode & 0o777))?;
        }

        count += 1;
    }

    debug!(
        "Extracted {} files from {} into {}",
        count,
        archive_path.display(),
        dest_path.display()
    );

    Ok(count)
}
