//! Environment and system information operations.

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn set_env_var_impl(&self, key: &str, value: &OsStr) {
        // SAFETY: the binary drives everything from a current-thread tokio
        // runtime and only updates the environment after all network and
        // subprocess work has completed, so no other thread reads it.
        unsafe { env::set_var(key, value) }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn current_dir_impl(&self) -> Result<PathBuf> {
        env::current_dir().context("Failed to get current directory")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn temp_dir_impl(&self) -> PathBuf {
        env::temp_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_privileged_impl(&self) -> bool {
        #[cfg(unix)]
        return nix::unistd::geteuid().as_raw() == 0;

        #[cfg(windows)]
        return is_elevated::is_elevated();
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};

    #[test]
    fn test_real_runtime_env_and_dirs() {
        let runtime = RealRuntime;

        // PATH should exist on all systems
        assert!(runtime.env_var("PATH").is_ok());
        assert!(
            runtime
                .env_var("SETUP_LICENSED_SURELY_UNSET_VARIABLE")
                .is_err()
        );

        let temp = runtime.temp_dir();
        assert!(temp.is_absolute() || cfg!(windows));

        assert!(runtime.current_dir().unwrap().is_absolute());

        // Must not panic
        let _ = runtime.is_privileged();
    }

    #[test]
    fn test_real_runtime_set_env_var() {
        let runtime = RealRuntime;
        let key = "SETUP_LICENSED_TEST_SET_ENV_VAR";

        runtime.set_env_var(key, std::ffi::OsStr::new("value"));
        assert_eq!(runtime.env_var(key).unwrap(), "value");
    }
}
