//! GitHub API response types.

use serde::Deserialize;

use crate::domain::{Asset, AssetState, Release};

#[derive(Deserialize, Debug)]
pub struct ApiRelease {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ApiAsset>,
}

#[derive(Deserialize, Debug)]
pub struct ApiAsset {
    pub id: u64,
    pub name: String,
    pub state: String,
}

impl From<ApiRelease> for Release {
    fn from(r: ApiRelease) -> Self {
        Release {
            tag: r.tag_name,
            assets: r.assets.into_iter().map(|a| a.into()).collect(),
        }
    }
}

impl From<ApiAsset> for Asset {
    fn from(a: ApiAsset) -> Self {
        Asset {
            id: a.id,
            name: a.name,
            state: AssetState::from(a.state),
        }
    }
}
