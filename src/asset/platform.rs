use std::fmt;

/// Platform identifier matched against release asset names.
///
/// Upstream names its archives after the Node.js platform names
/// (`licensed-4.3.0-darwin-x64.tar.gz`), so macOS reports `darwin` and
/// Windows reports `win32`. Other systems report `std::env::consts::OS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform(String);

impl Platform {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Detect the current platform
    pub fn detect() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Self {
        let identifier = match os {
            "macos" => "darwin",
            "windows" => "win32",
            other => other,
        };
        Self(identifier.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detect() {
        let platform = Platform::detect();
        assert!(!platform.as_str().is_empty());

        #[cfg(target_os = "macos")]
        assert_eq!(platform.as_str(), "darwin");

        #[cfg(target_os = "linux")]
        assert_eq!(platform.as_str(), "linux");

        #[cfg(target_os = "windows")]
        assert_eq!(platform.as_str(), "win32");
    }

    #[test]
    fn test_platform_from_os() {
        assert_eq!(Platform::from_os("macos").as_str(), "darwin");
        assert_eq!(Platform::from_os("windows").as_str(), "win32");
        assert_eq!(Platform::from_os("linux").as_str(), "linux");
        assert_eq!(Platform::from_os("freebsd").as_str(), "freebsd");
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::new("linux").to_string(), "linux");
    }
}
