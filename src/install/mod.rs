use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    actions,
    archive::ArchiveInstaller,
    asset::{AssetPicker, PlatformAssetPicker},
    download::AssetDownloader,
    github::ReleaseCatalog,
    runtime::Runtime,
    version::{SemverMatcher, VersionMatcher, find_release},
};

pub mod config;

pub use config::{Config, InstallOptions};

/// Install `licensed` according to `options`.
///
/// Returns the installed tag, or `None` when there was nothing to install.
#[tracing::instrument(skip(runtime, options))]
pub async fn install<R: Runtime + 'static>(
    runtime: R,
    options: InstallOptions,
) -> Result<Option<String>> {
    let config = Config::new(runtime, options)?;
    run(config).await
}

#[tracing::instrument(skip(config))]
pub async fn run<R: Runtime + 'static>(config: Config<R>) -> Result<Option<String>> {
    let installer = Installer::new(
        config.runtime,
        config.catalog,
        config.downloader,
        config.extractor,
    );
    installer
        .install(&config.version, config.install_dir.as_deref())
        .await
}

pub struct Installer<R: Runtime, C: ReleaseCatalog, D: AssetDownloader, X: ArchiveInstaller> {
    runtime: Arc<R>,
    catalog: C,
    downloader: D,
    extractor: X,
    matcher: Box<dyn VersionMatcher>,
    picker: Box<dyn AssetPicker>,
}

impl<R: Runtime, C: ReleaseCatalog, D: AssetDownloader, X: ArchiveInstaller>
    Installer<R, C, D, X>
{
    pub fn new(runtime: Arc<R>, catalog: C, downloader: D, extractor: X) -> Self {
        Self {
            runtime,
            catalog,
            downloader,
            extractor,
            matcher: Box::new(SemverMatcher),
            picker: Box::new(PlatformAssetPicker::default()),
        }
    }

    pub fn with_matcher(mut self, matcher: impl VersionMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn with_picker(mut self, picker: impl AssetPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    #[tracing::instrument(skip(self))]
    pub async fn install(
        &self,
        requested: &str,
        install_dir: Option<&Path>,
    ) -> Result<Option<String>> {
        let Some(install_dir) = install_dir else {
            info!("No install directory given, skipping licensed installation.");
            return Ok(None);
        };

        let releases = self.catalog.list_releases().await?;
        let tags: Vec<String> = releases.iter().map(|r| r.tag.clone()).collect();

        let Some(tag) = self.matcher.resolve(&tags, requested) else {
            info!("No licensed release matches version '{}'.", requested);
            return Ok(None);
        };
        let Some(release) = find_release(&releases, &tag) else {
            info!("Release {} is not in the catalog.", tag);
            return Ok(None);
        };

        let Some(asset) = self.picker.pick(release) else {
            info!("licensed {} has no asset for this platform.", tag);
            return Ok(None);
        };
        info!("Installing licensed {} from {}", tag, asset.name);

        let install_dir = self.prepare_install_dir(install_dir).await?;
        let archive = self.downloader.download(asset).await?;
        self.extractor
            .install_archive(archive, &install_dir)
            .await?;

        actions::add_path(self.runtime.as_ref(), &install_dir)?;

        info!("Installed licensed {} to {}", tag, install_dir.display());
        Ok(Some(tag))
    }

    /// Absolute install directory, created if missing.
    ///
    /// When the current user may not create it and the process is not
    /// privileged, the directory is created with `sudo mkdir -p`.
    async fn prepare_install_dir(&self, dir: &Path) -> Result<PathBuf> {
        let dir: PathBuf = if dir.is_absolute() {
            dir.components().collect()
        } else {
            self.runtime.current_dir()?.join(dir).components().collect()
        };

        if self.runtime.exists(&dir) {
            if !self.runtime.is_dir(&dir) {
                bail!("Install path {:?} is not a directory", dir);
            }
            return Ok(dir);
        }

        match self.runtime.create_dir_all(&dir) {
            Ok(()) => {}
            Err(err) if self.runtime.is_privileged() => {
                return Err(err)
                    .with_context(|| format!("Failed to create install directory {:?}", dir));
            }
            Err(err) => {
                debug!("{:#}, retrying with sudo", err);
                self.create_dir_elevated(&dir).await?;
            }
        }

        Ok(dir)
    }

    async fn create_dir_elevated(&self, dir: &Path) -> Result<()> {
        let sudo = self.runtime.which("sudo")?;
        let args = vec![
            OsString::from("mkdir"),
            OsString::from("-p"),
            dir.as_os_str().to_owned(),
        ];

        match self.runtime.run(&sudo, &args).await? {
            Some(0) => Ok(()),
            code => bail!(
                "Failed to create install directory {:?} with sudo (exit code {:?})",
                dir,
                code
            ),
        }
    }
}
