use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::domain::Asset;
use crate::github::{DEFAULT_API_URL, GitHubRepo};
use crate::http::HttpClient;
use crate::runtime::Runtime;

/// File name of the downloaded archive inside its temporary directory.
pub const ARCHIVE_FILE_NAME: &str = "licensed.tar.gz";

const TEMP_DIR_PREFIX: &str = "setup-licensed-";

/// A downloaded archive living in its own temporary directory.
///
/// Dropping the value removes the directory together with the archive.
#[derive(Debug)]
pub struct DownloadedArchive {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl DownloadedArchive {
    pub fn new(temp_dir: TempDir, file_name: &str) -> Self {
        let path = temp_dir.path().join(file_name);
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Fetch the binary content of `asset` into a fresh temporary location.
    async fn download(&self, asset: &Asset) -> Result<DownloadedArchive>;
}

/// Downloads release assets through the GitHub asset API.
///
/// Requests are sent without credentials.
pub struct GitHubAssetDownloader<R: Runtime> {
    runtime: Arc<R>,
    http_client: HttpClient,
    api_url: String,
    repo: GitHubRepo,
}

impl<R: Runtime> GitHubAssetDownloader<R> {
    pub fn new(
        runtime: Arc<R>,
        http_client: HttpClient,
        api_url: Option<String>,
        repo: GitHubRepo,
    ) -> Self {
        Self {
            runtime,
            http_client,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            repo,
        }
    }

    fn asset_url(&self, asset: &Asset) -> String {
        format!(
            "{}/releases/assets/{}",
            self.repo.api_path(&self.api_url),
            asset.id
        )
    }
}

#[async_trait]
impl<R: Runtime + 'static> AssetDownloader for GitHubAssetDownloader<R> {
    #[tracing::instrument(skip(self, asset), fields(asset = %asset.name))]
    async fn download(&self, asset: &Asset) -> Result<DownloadedArchive> {
        let temp_root = self.runtime.temp_dir();
        let temp_dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(&temp_root)
            .with_context(|| {
                format!(
                    "Failed to create temporary directory in {}",
                    temp_root.display()
                )
            })?;
        let archive = DownloadedArchive::new(temp_dir, ARCHIVE_FILE_NAME);

        let url = self.asset_url(asset);
        info!("Downloading {}...", asset.name);

        let bytes = self
            .http_client
            .download_file(&asset.name, &url, || {
                self.runtime.create_file(archive.path()).with_context(|| {
                    format!("Failed to create archive file at {:?}", archive.path())
                })
            })
            .await?;

        info!("Downloaded {} ({} bytes).", asset.name, bytes);
        Ok(archive)
    }
}
