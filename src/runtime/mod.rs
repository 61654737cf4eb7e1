//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables and system information
//! - `fs` - File system operations (create, append, permission probes)
//! - `process` - Executable lookup and subprocess execution

mod env;
mod fs;
mod process;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;
    fn set_env_var(&self, key: &str, value: &OsStr);
    fn current_dir(&self) -> Result<PathBuf>;
    fn temp_dir(&self) -> PathBuf;

    // File System
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>>;

    /// Append `contents` to the file at `path`, creating it if needed.
    fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Whether the current process may create files inside `path`.
    fn is_writable(&self, path: &Path) -> bool;

    // Privilege
    fn is_privileged(&self) -> bool;

    // Processes
    /// Locate an executable on PATH.
    fn which(&self, program: &str) -> Result<PathBuf>;

    /// Run `program` with inherited stdio and wait for it.
    /// Returns the exit code, or `None` if the process was killed by a signal.
    async fn run(&self, program: &Path, args: &[OsString]) -> Result<Option<i32>>;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn set_env_var(&self, key: &str, value: &OsStr) {
        self.set_env_var_impl(key, value)
    }

    fn current_dir(&self) -> Result<PathBuf> {
        self.current_dir_impl()
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp_dir_impl()
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path)
    }

    fn create_file(&self, path: &Path) -> Result<Box<dyn std::io::Write + Send>> {
        self.create_file_impl(path)
    }

    fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.append_impl(path, contents)
    }

    fn is_writable(&self, path: &Path) -> bool {
        self.is_writable_impl(path)
    }

    fn is_privileged(&self) -> bool {
        self.is_privileged_impl()
    }

    fn which(&self, program: &str) -> Result<PathBuf> {
        self.which_impl(program)
    }

    async fn run(&self, program: &Path, args: &[OsString]) -> Result<Option<i32>> {
        self.run_impl(program, args).await
    }
}
