//! Archive extraction through the host `tar`, elevated with `sudo` when the
//! install directory is not writable by the current user.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info};
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use crate::download::DownloadedArchive;
use crate::error::InstallError;
use crate::runtime::Runtime;

/// The only archive member that gets extracted.
pub const LICENSED_ENTRY: &str = "./licensed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Run `tar` as the current user.
    Direct,
    /// Run `tar` through `sudo`.
    Elevated,
}

/// Elevation is only needed when the directory is not writable and the
/// process is not already privileged.
pub fn extraction_mode<R: Runtime + ?Sized>(runtime: &R, install_dir: &Path) -> ExtractionMode {
    if runtime.is_writable(install_dir) || runtime.is_privileged() {
        ExtractionMode::Direct
    } else {
        ExtractionMode::Elevated
    }
}

fn tar_args(archive_path: &Path, install_dir: &Path) -> Vec<OsString> {
    vec![
        "-xzv".into(),
        "-f".into(),
        archive_path.as_os_str().to_owned(),
        "-C".into(),
        install_dir.as_os_str().to_owned(),
        LICENSED_ENTRY.into(),
    ]
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveInstaller: Send + Sync {
    /// Extract the tool from `archive` into `install_dir`.
    ///
    /// The archive is consumed; its temporary location is removed whether
    /// extraction succeeds or not.
    async fn install_archive(&self, archive: DownloadedArchive, install_dir: &Path) -> Result<()>;
}

pub struct TarInstaller<R: Runtime> {
    runtime: Arc<R>,
}

impl<R: Runtime> TarInstaller<R> {
    pub fn new(runtime: Arc<R>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl<R: Runtime + 'static> ArchiveInstaller for TarInstaller<R> {
    #[tracing::instrument(skip(self, archive))]
    async fn install_archive(&self, archive: DownloadedArchive, install_dir: &Path) -> Result<()> {
        let tar = self.runtime.which("tar")?;
        let mode = extraction_mode(self.runtime.as_ref(), install_dir);
        debug!("Extraction mode for {:?}: {:?}", install_dir, mode);

        let mut args = tar_args(archive.path(), install_dir);
        let program = match mode {
            ExtractionMode::Direct => tar,
            ExtractionMode::Elevated => {
                info!(
                    "{} is not writable, extracting with sudo.",
                    install_dir.display()
                );
                let sudo = self.runtime.which("sudo")?;
                args.insert(0, tar.into_os_string());
                sudo
            }
        };

        let code = self.runtime.run(&program, &args).await?;
        drop(archive);

        match code {
            Some(0) => {
                info!("Extracted licensed to {}", install_dir.display());
                Ok(())
            }
            code => Err(InstallError::Extraction { code }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn archive() -> (DownloadedArchive, PathBuf) {
        let archive = DownloadedArchive::new(tempfile::tempdir().unwrap(), "licensed.tar.gz");
        std::fs::write(archive.path(), b"not really gzip").unwrap();
        let path = archive.path().to_path_buf();
        (archive, path)
    }

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_extraction_mode_writable() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_writable().return_const(true);
        runtime.expect_is_privileged().never();
        assert_eq!(
            extraction_mode(&runtime, Path::new("/opt/bin")),
            ExtractionMode::Direct
        );
    }

    #[test]
    fn test_extraction_mode_privileged() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_writable().return_const(false);
        runtime.expect_is_privileged().return_const(true);
        assert_eq!(
            extraction_mode(&runtime, Path::new("/usr/local/bin")),
            ExtractionMode::Direct
        );
    }

    #[test]
    fn test_extraction_mode_elevated() {
        let mut runtime = MockRuntime::new();
        runtime.expect_is_writable().return_const(false);
        runtime.expect_is_privileged().return_const(false);
        assert_eq!(
            extraction_mode(&runtime, Path::new("/usr/local/bin")),
            ExtractionMode::Elevated
        );
    }

    #[tokio::test]
    async fn test_install_archive_direct() {
        let (archive, archive_path) = archive();
        let expected = os(&[
            "-xzv",
            "-f",
            archive_path.to_str().unwrap(),
            "-C",
            "/opt/bin",
            "./licensed",
        ]);

        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .with(eq("tar"))
            .returning(|_| Ok(PathBuf::from("/usr/bin/tar")));
        runtime.expect_is_writable().return_const(true);
        runtime
            .expect_run()
            .withf(move |program, args| program == Path::new("/usr/bin/tar") && args == expected)
            .times(1)
            .returning(|_, _| Ok(Some(0)));

        let installer = TarInstaller::new(Arc::new(runtime));
        installer
            .install_archive(archive, Path::new("/opt/bin"))
            .await
            .unwrap();

        assert!(!archive_path.exists());
    }

    #[tokio::test]
    async fn test_install_archive_elevated_uses_sudo() {
        let (archive, archive_path) = archive();
        let expected = os(&[
            "/usr/bin/tar",
            "-xzv",
            "-f",
            archive_path.to_str().unwrap(),
            "-C",
            "/usr/local/bin",
            "./licensed",
        ]);

        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .with(eq("tar"))
            .returning(|_| Ok(PathBuf::from("/usr/bin/tar")));
        runtime
            .expect_which()
            .with(eq("sudo"))
            .returning(|_| Ok(PathBuf::from("/usr/bin/sudo")));
        runtime.expect_is_writable().return_const(false);
        runtime.expect_is_privileged().return_const(false);
        runtime
            .expect_run()
            .withf(move |program, args| program == Path::new("/usr/bin/sudo") && args == expected)
            .times(1)
            .returning(|_, _| Ok(Some(0)));

        let installer = TarInstaller::new(Arc::new(runtime));
        installer
            .install_archive(archive, Path::new("/usr/local/bin"))
            .await
            .unwrap();

        assert!(!archive_path.exists());
    }

    #[tokio::test]
    async fn test_install_archive_failure_still_removes_archive() {
        let (archive, archive_path) = archive();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .returning(|_| Ok(PathBuf::from("/usr/bin/tar")));
        runtime.expect_is_writable().return_const(true);
        runtime.expect_run().returning(|_, _| Ok(Some(2)));

        let installer = TarInstaller::new(Arc::new(runtime));
        let err = installer
            .install_archive(archive, Path::new("/opt/bin"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<InstallError>(),
            Some(&InstallError::Extraction { code: Some(2) })
        );
        assert!(!archive_path.exists());
    }

    #[tokio::test]
    async fn test_install_archive_killed_by_signal() {
        let (archive, _) = archive();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .returning(|_| Ok(PathBuf::from("/usr/bin/tar")));
        runtime.expect_is_writable().return_const(true);
        runtime.expect_run().returning(|_, _| Ok(None));

        let installer = TarInstaller::new(Arc::new(runtime));
        let err = installer
            .install_archive(archive, Path::new("/opt/bin"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<InstallError>(),
            Some(&InstallError::Extraction { code: None })
        );
    }

    #[tokio::test]
    async fn test_install_archive_missing_sudo() {
        let (archive, archive_path) = archive();

        let mut runtime = MockRuntime::new();
        runtime
            .expect_which()
            .with(eq("tar"))
            .returning(|_| Ok(PathBuf::from("/usr/bin/tar")));
        runtime.expect_which().with(eq("sudo")).returning(|_| {
            Err(InstallError::ToolMissing {
                tool: "sudo".into(),
            }
            .into())
        });
        runtime.expect_is_writable().return_const(false);
        runtime.expect_is_privileged().return_const(false);
        runtime.expect_run().never();

        let installer = TarInstaller::new(Arc::new(runtime));
        let err = installer
            .install_archive(archive, Path::new("/usr/local/bin"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<InstallError>(),
            Some(&InstallError::ToolMissing {
                tool: "sudo".into()
            })
        );
        assert!(!archive_path.exists());
    }

    #[tokio::test]
    async fn test_install_archive_missing_tar() {
        let (archive, _) = archive();

        let mut runtime = MockRuntime::new();
        runtime.expect_which().with(eq("tar")).returning(|_| {
            Err(InstallError::ToolMissing { tool: "tar".into() }.into())
        });
        runtime.expect_run().never();

        let installer = TarInstaller::new(Arc::new(runtime));
        let err = installer
            .install_archive(archive, Path::new("/opt/bin"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::ToolMissing { .. })
        ));
    }
}
