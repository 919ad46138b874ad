use crate::error::{Result, ToolsError};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Where the vendor archive comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveSource {
    Remote(Url),
    Local(PathBuf),
}

impl ArchiveSource {
    /// `http://` and `https://` locations are fetched, `file://` URLs and
    /// anything else are treated as a path on disk.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();

        if location.is_empty() {
            return Err(ToolsError::InvalidPath {
                path: "empty archive location".to_string(),
            });
        }

        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                if url.host_str().is_none() {
                    return Err(ToolsError::InvalidPath {
                        path: format!("URL without host: {}", location),
                    });
                }
                Ok(ArchiveSource::Remote(url))
            }
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(ArchiveSource::Local)
                .map_err(|_| ToolsError::InvalidPath {
                    path: location.to_string(),
                }),
            // Windows drive letters parse as one-letter schemes.
            _ => Ok(ArchiveSource::Local(PathBuf::from(location))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ArchiveSource::Remote(_))
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Remote(url) => write!(f, "{}", url),
            ArchiveSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
