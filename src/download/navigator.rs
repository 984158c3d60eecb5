//! Navigators act on a direct link once a download is triggered.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use crate::direct_link::DirectLink;
use crate::http_client::build_http_client;
use crate::metadata::FileMetadata;

use super::error::DownloadError;
use super::filename::{
    FALLBACK_FILENAME, parse_content_disposition, resolve_unique_path, sanitize_filename,
};

/// What a navigator did with a direct link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigated {
    /// The link that was followed.
    pub link: DirectLink,
    /// Where the bytes landed, for navigators that write files.
    pub path: Option<PathBuf>,
    /// Bytes received.
    pub bytes_written: u64,
}

/// Follows a direct link on behalf of the user.
///
/// # Object Safety
///
/// This trait uses `async_trait` so a [`DownloadTrigger`](super::DownloadTrigger)
/// can hold `Arc<dyn Navigator>`.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Navigates to `link` for the file described by `metadata`.
    async fn navigate(
        &self,
        link: &DirectLink,
        metadata: &FileMetadata,
    ) -> Result<Navigated, DownloadError>;
}

/// Streams the redirect service's response body into a local file.
#[derive(Debug, Clone)]
pub struct StreamingNavigator {
    client: Client,
    output_dir: PathBuf,
    show_progress: bool,
}

impl StreamingNavigator {
    /// Creates a navigator writing into `output_dir`.
    ///
    /// Only the connect phase is time-limited; bodies may take as long as
    /// the file needs.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if HTTP client construction fails.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        connect_timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = build_http_client(connect_timeout, None)
            .map_err(|source| DownloadError::Client { source })?;
        Ok(Self {
            client,
            output_dir: output_dir.into(),
            show_progress: false,
        })
    }

    /// Enables or disables the terminal progress bar.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, content_length: Option<u64>, file_name: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = match content_length {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "{msg} [{bar:40}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
                );
                bar
            }
            None => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::with_template("{spinner} {msg} {bytes}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                spinner
            }
        };
        bar.set_message(file_name.to_string());
        bar
    }
}

#[async_trait]
impl Navigator for StreamingNavigator {
    #[instrument(skip_all, fields(link = %link))]
    async fn navigate(
        &self,
        link: &DirectLink,
        metadata: &FileMetadata,
    ) -> Result<Navigated, DownloadError> {
        Url::parse(link.as_str()).map_err(|_| DownloadError::invalid_url(link.as_str()))?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DownloadError::io(self.output_dir.clone(), e))?;

        debug!("requesting direct link");
        let response = self
            .client
            .get(link.as_str())
            .send()
            .await
            .map_err(|e| DownloadError::network(link.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(link.as_str(), status.as_u16()));
        }

        let header_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_disposition);
        let file_name = choose_file_name(&metadata.file_name, header_name.as_deref());
        let (mut file, file_path) = create_unique_file(&self.output_dir, &file_name).await?;
        debug!(path = %file_path.display(), "resolved output path");

        let progress = self.progress_bar(response.content_length(), &file_name);
        let stream_result =
            stream_to_file(&mut file, response, link.as_str(), &file_path, &progress).await;
        progress.finish_and_clear();

        let bytes_written = match stream_result {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %file_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&file_path).await;
                return Err(error);
            }
        };

        info!(path = %file_path.display(), bytes = bytes_written, "download complete");
        Ok(Navigated {
            link: link.clone(),
            path: Some(file_path),
            bytes_written,
        })
    }
}

/// Prefers the metadata name, then the response header, then a fixed fallback.
fn choose_file_name(metadata_name: &str, header_name: Option<&str>) -> String {
    let from_metadata = sanitize_filename(metadata_name);
    if from_metadata != FALLBACK_FILENAME {
        return from_metadata;
    }
    header_name.map_or_else(|| FALLBACK_FILENAME.to_string(), sanitize_filename)
}

/// Attempts made to claim a fresh output name before giving up.
const CREATE_ATTEMPTS: usize = 16;

/// Creates a new file in `dir` without ever opening an existing one.
///
/// A name taken between the uniqueness check and the create is retried with
/// the next free suffix.
async fn create_unique_file(
    dir: &Path,
    file_name: &str,
) -> Result<(File, PathBuf), DownloadError> {
    let mut attempt = 0;
    loop {
        let file_path = resolve_unique_path(dir, file_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(file) => return Ok((file, file_path)),
            Err(e)
                if e.kind() == std::io::ErrorKind::AlreadyExists
                    && attempt + 1 < CREATE_ATTEMPTS =>
            {
                debug!(path = %file_path.display(), "output name taken, retrying");
                attempt += 1;
            }
            Err(e) => return Err(DownloadError::io(file_path, e)),
        }
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    progress: &ProgressBar,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
        progress.set_position(bytes_written);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
