use crate::domain::{Asset, Release};

use super::Platform;

/// Trait for selecting the asset to install from a release
pub trait AssetPicker: Send + Sync {
    /// Pick the asset to download from `release`.
    ///
    /// Returns `None` if no suitable asset is found
    fn pick<'a>(&self, release: &'a Release) -> Option<&'a Asset>;
}

/// Picks the first uploaded asset whose name contains the platform identifier.
///
/// Matching is a plain substring test in catalog order, so with both
/// `linux-x64` and `linux-arm64` uploaded the one listed first wins.
pub struct PlatformAssetPicker {
    platform: Platform,
}

impl PlatformAssetPicker {
    pub fn new() -> Self {
        Self {
            platform: Platform::detect(),
        }
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}

impl Default for PlatformAssetPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetPicker for PlatformAssetPicker {
    fn pick<'a>(&self, release: &'a Release) -> Option<&'a Asset> {
        release
            .assets
            .iter()
            .filter(|a| a.is_uploaded())
            .find(|a| a.name.contains(self.platform.as_str()))
    }
}
