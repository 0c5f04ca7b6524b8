//! Asset byte acquisition.
//!
//! A model source is either a local file or an HTTP(S) URL. Both readers
//! stream the payload and report byte progress through a callback as data
//! arrives, so the status line can show a percentage while the download is
//! in flight. There is no cancellation, timeout-retry or resume: the read
//! resolves once with the full payload or fails once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use url::Url;

use crate::errors::{Result, ViewerError};

const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// Where the model bytes come from.
pub enum ByteSource {
    File(PathBuf),
    Http(Url),
}

impl ByteSource {
    /// Classifies a source string: URL schemes go over HTTP, everything
    /// else is treated as a filesystem path.
    pub fn parse(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Ok(Self::Http(Url::parse(source)?))
        } else {
            Ok(Self::File(PathBuf::from(source)))
        }
    }

    /// Reads the full payload, invoking `on_progress(bytes_loaded, total)`
    /// as chunks arrive. `total` is `None` when the size is not known in
    /// advance (e.g. chunked HTTP responses).
    pub async fn read(&self, on_progress: &mut dyn FnMut(u64, Option<u64>)) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => read_file(path, on_progress).await,
            Self::Http(url) => read_http(url, on_progress).await,
        }
    }

    /// The file-name portion of a source string, for display purposes.
    #[must_use]
    pub fn source_filename(source: &str) -> &str {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}

async fn read_file(path: &Path, on_progress: &mut dyn FnMut(u64, Option<u64>)) -> Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await.ok().map(|m| m.len());

    let mut out = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut buf = vec![0_u8; FILE_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        on_progress(out.len() as u64, total);
    }
    Ok(out)
}

async fn read_http(url: &Url, on_progress: &mut dyn FnMut(u64, Option<u64>)) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()?;

    let mut response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(ViewerError::HttpResponseError {
            status: response.status().as_u16(),
        });
    }

    let total = response.content_length();
    let mut out = Vec::with_capacity(total.unwrap_or(0) as usize);
    while let Some(chunk) = response.chunk().await? {
        out.extend_from_slice(&chunk);
        on_progress(out.len() as u64, total);
    }
    Ok(out)
}
