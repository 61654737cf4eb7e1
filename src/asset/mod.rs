//! Asset selection module
//!
//! Chooses which uploaded asset of a release to download for the host
//! platform.

mod picker;
mod platform;

pub use picker::{AssetPicker, PlatformAssetPicker};
pub use platform::Platform;
