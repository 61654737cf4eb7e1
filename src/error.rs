//! Fatal installation errors.
//!
//! "Nothing to install" outcomes are not errors: they surface as `Ok(None)`
//! from the installer. Everything here aborts the CI step.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// The asset download did not finish with HTTP 200.
    Download { asset: String, status: u16 },
    /// A required host executable could not be found on PATH.
    ToolMissing { tool: String },
    /// The extraction subprocess exited unsuccessfully.
    /// `code` is `None` when the process was terminated by a signal.
    Extraction { code: Option<i32> },
    /// The upstream API kept rate limiting the request past the retry ceiling.
    RateLimited { operation: String, attempts: usize },
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::Download { asset, status } => {
                write!(f, "Failed to download {}: HTTP {}", asset, status)
            }
            InstallError::ToolMissing { tool } => {
                write!(f, "Unable to find '{}' on PATH", tool)
            }
            InstallError::Extraction { code: Some(code) } => {
                write!(f, "Archive extraction failed with exit code {}", code)
            }
            InstallError::Extraction { code: None } => {
                write!(f, "Archive extraction was terminated by a signal")
            }
            InstallError::RateLimited {
                operation,
                attempts,
            } => {
                write!(
                    f,
                    "{}: rate limit exceeded after {} attempts. Try again later or provide a GitHub token.",
                    operation, attempts
                )
            }
        }
    }
}

impl std::error::Error for InstallError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_error_display() {
        let err = InstallError::Download {
            asset: "licensed-4.3.0-linux-x64.tar.gz".into(),
            status: 404,
        };
        assert!(err.to_string().contains("HTTP 404"));
        assert!(err.to_string().contains("licensed-4.3.0-linux-x64.tar.gz"));

        let err = InstallError::ToolMissing { tool: "tar".into() };
        assert!(err.to_string().contains("'tar'"));

        let err = InstallError::Extraction { code: Some(2) };
        assert!(err.to_string().contains("exit code 2"));

        let err = InstallError::Extraction { code: None };
        assert!(err.to_string().contains("signal"));

        let err = InstallError::RateLimited {
            operation: "Fetching releases".into(),
            attempts: 6,
        };
        assert!(err.to_string().contains("Fetching releases"));
        assert!(err.to_string().contains("6 attempts"));
    }

    #[test]
    fn test_install_error_downcast() {
        let err = anyhow::Error::from(InstallError::ToolMissing { tool: "sudo".into() });
        assert_eq!(
            err.downcast_ref::<InstallError>(),
            Some(&InstallError::ToolMissing { tool: "sudo".into() })
        );
    }
}
