//! Process search path and GitHub Actions workflow commands.
//!
//! Under GitHub Actions, `GITHUB_PATH` and `GITHUB_OUTPUT` name files that the
//! runner reads after the step finishes. Outside of Actions they are unset and
//! only the current process environment is touched.

use anyhow::{Context, Result};
use log::debug;
use std::env;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

const PATH: &str = "PATH";
const GITHUB_PATH: &str = "GITHUB_PATH";
const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Prepend `dir` to `PATH` unless it is already listed.
///
/// Returns `false` when `PATH` already contained `dir` and nothing changed.
#[tracing::instrument(skip(runtime))]
pub fn add_path<R: Runtime + ?Sized>(runtime: &R, dir: &Path) -> Result<bool> {
    let current = runtime.env_var(PATH).unwrap_or_default();

    if env::split_paths(&current).any(|entry| entry == dir) {
        debug!("{:?} is already on PATH", dir);
        return Ok(false);
    }

    let entries = std::iter::once(dir.to_path_buf())
        .chain(env::split_paths(&current).filter(|entry| !entry.as_os_str().is_empty()))
        .collect::<Vec<PathBuf>>();
    let joined = env::join_paths(entries)
        .with_context(|| format!("Failed to add {:?} to PATH", dir))?;
    runtime.set_env_var(PATH, &joined);

    let mut line = dir.as_os_str().to_string_lossy().into_owned();
    line.push('\n');
    append_command_file(runtime, GITHUB_PATH, &line)?;

    debug!("Added {:?} to PATH", dir);
    Ok(true)
}

/// Publish a step output as `name=value`.
#[tracing::instrument(skip(runtime))]
pub fn set_output<R: Runtime + ?Sized>(runtime: &R, name: &str, value: &str) -> Result<()> {
    append_command_file(runtime, GITHUB_OUTPUT, &format!("{}={}\n", name, value))
}

fn append_command_file<R: Runtime + ?Sized>(runtime: &R, key: &str, line: &str) -> Result<()> {
    let file = match runtime.env_var(key) {
        Ok(file) if !file.is_empty() => PathBuf::from(file),
        _ => return Ok(()),
    };

    runtime
        .append(&file, line.as_bytes())
        .with_context(|| format!("Failed to write to {} file {:?}", key, file))
}
