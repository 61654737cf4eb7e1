use std::fmt;

/// Upload state of a release asset.
///
/// GitHub reports `uploaded` for assets that finished uploading; anything
/// else (`open`, `starter`, ...) is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Uploaded,
    Other(String),
}

impl From<String> for AssetState {
    fn from(state: String) -> Self {
        if state == "uploaded" {
            AssetState::Uploaded
        } else {
            AssetState::Other(state)
        }
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetState::Uploaded => write!(f, "uploaded"),
            AssetState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub state: AssetState,
}

impl Asset {
    /// Only fully uploaded assets can be downloaded.
    pub fn is_uploaded(&self) -> bool {
        self.state == AssetState::Uploaded
    }
}

/// A tagged release of the upstream tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Release {
    /// Version tag (e.g., "v4.3.0")
    pub tag: String,
    /// Assets in upstream order
    pub assets: Vec<Asset>,
}

impl Release {
    pub fn has_assets(&self) -> bool {
        !self.assets.is_empty()
    }
}
