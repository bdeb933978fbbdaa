use std::io::Write as _;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::DownloadError;
use crate::fetch::{PageFetcher, Transport};
use crate::paths::{sanitize_filename, sanitize_folder};

/// File name the library serves for books without a cover.
pub const PLACEHOLDER_IMAGE: &str = "nopic.gif";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Download {
    Written(PathBuf),
    /// Destination already present and `skip_existing` is on.
    Existing(PathBuf),
    /// Placeholder asset; nothing was requested.
    Placeholder,
}

impl Download {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Written(path) | Self::Existing(path) => Some(path),
            Self::Placeholder => None,
        }
    }
}

pub struct AssetDownloader<'a, T> {
    fetcher: &'a PageFetcher<T>,
    placeholder: Option<String>,
    skip_existing: bool,
}

impl<'a, T: Transport> AssetDownloader<'a, T> {
    pub fn new(fetcher: &'a PageFetcher<T>) -> Self {
        Self {
            fetcher,
            placeholder: Some(PLACEHOLDER_IMAGE.to_owned()),
            skip_existing: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: Option<&str>) -> Self {
        self.placeholder = placeholder.map(str::to_owned);
        self
    }

    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    pub fn is_placeholder(&self, filename: &str) -> bool {
        self.placeholder.as_deref() == Some(filename)
    }

    /// Saves the body of `url` as `folder/filename`, both sanitized.
    pub async fn download(
        &self,
        url: &Url,
        folder: &Path,
        filename: &str,
    ) -> Result<Download, DownloadError> {
        if self.is_placeholder(filename) {
            tracing::debug!(%url, "placeholder asset; not downloading");
            return Ok(Download::Placeholder);
        }

        let folder = sanitize_folder(folder);
        let path = folder.join(sanitize_filename(filename));
        if self.skip_existing && path.exists() {
            tracing::debug!(path = %path.display(), "asset already exists; skipping");
            return Ok(Download::Existing(path));
        }

        std::fs::create_dir_all(&folder).map_err(|source| DownloadError::Io {
            path: folder.clone(),
            source,
        })?;

        let page = self.fetcher.fetch(url).await?;
        write_atomically(&folder, &path, &page.body)?;

        tracing::debug!(%url, path = %path.display(), bytes = page.body.len(), "asset saved");
        Ok(Download::Written(path))
    }
}

fn write_atomically(folder: &Path, path: &Path, body: &[u8]) -> Result<(), DownloadError> {
    let io_err = |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    };

    // The temp file is removed on drop if anything below fails.
    let mut file = tempfile::NamedTempFile::new_in(folder).map_err(io_err)?;
    file.write_all(body).map_err(io_err)?;
    file.flush().map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

/// Last path segment of `url`, percent-decoded.
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| segment.to_owned());
    Some(decoded)
}
