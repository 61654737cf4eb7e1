pub mod actions;
pub mod archive;
pub mod asset;
pub mod domain;
pub mod download;
pub mod error;
pub mod github;
pub mod http;
pub mod install;
pub mod runtime;
pub mod version;
