use crate::error::{Result, ToolsError};
use std::io::{BufWriter, Read, Write};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub received_bytes: u64,
    pub total_bytes: Option<u64>,
}

/// Retrieves a remote archive into a temporary file.
///
/// The returned file is deleted when dropped; callers that want to observe a
/// failed deletion should call [`NamedTempFile::close`].
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<NamedTempFile>;
}

pub struct HttpFetcher {
    insecure: bool,
    buffer_size: usize,
    progress_callback: Option<Box<dyn Fn(DownloadProgress) + Send + Sync>>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            insecure: false,
            buffer_size: 64 * 1024,
            progress_callback: None,
        }
    }

    /// Skip TLS certificate verification.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(DownloadProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    fn build_client(&self) -> Result<reqwest::blocking::Client> {
        if self.insecure {
            warn!("TLS certificate verification is disabled for this download");
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.insecure)
            .timeout(None::<Duration>)
            .build()?;

        Ok(client)
    }

    fn report(&self, progress: DownloadProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress);
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<NamedTempFile> {
        let client = self.build_client()?;
        let mut response = client.get(url.as_str()).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolsError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length();
        let temp_file = tempfile::Builder::new()
            .prefix("libampl-")
            .suffix(".zip")
            .tempfile()?;

        let mut writer = BufWriter::new(temp_file.as_file());
        let mut buffer = vec![0u8; self.buffer_size];
        let mut received_bytes = 0u64;

        loop {
            let bytes_read = response.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read])?;
            received_bytes += bytes_read as u64;

            self.report(DownloadProgress {
                received_bytes,
                total_bytes,
            });
        }

        writer.flush()?;
        drop(writer);

        debug!(
            "Downloaded {} bytes from {} to {}",
            received_bytes,
            url,
            temp_file.path().display()
        );

        Ok(temp_file)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}
