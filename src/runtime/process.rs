//! Executable lookup and subprocess execution.

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use crate::error::InstallError;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn which_impl(&self, program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|e| {
            debug!("which {}: {}", program, e);
            InstallError::ToolMissing {
                tool: program.to_string(),
            }
            .into()
        })
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn run_impl(&self, program: &Path, args: &[OsString]) -> Result<Option<i32>> {
        debug!("Running {:?} {:?}", program, args);
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to start {:?}", program))?;
        Ok(status.code())
    }
}
