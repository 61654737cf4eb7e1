use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    archive::TarInstaller,
    download::GitHubAssetDownloader,
    github::{GitHub, GitHubRepo},
    http::HttpClient,
    runtime::Runtime,
};

const USER_AGENT: &str = "setup-licensed";

/// User-facing inputs of an installation run.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Requested version specifier (e.g. "4", "v4.3.0", "^4.1")
    pub version: String,
    /// Target directory; `None` skips the installation
    pub install_dir: Option<PathBuf>,
    /// Token for the release listing; falls back to `GITHUB_TOKEN`
    pub github_token: Option<String>,
    pub api_url: Option<String>,
}

/// Fully wired production stages plus the normalized inputs.
pub struct Config<R: Runtime> {
    pub runtime: Arc<R>,
    pub catalog: GitHub,
    pub downloader: GitHubAssetDownloader<R>,
    pub extractor: TarInstaller<R>,
    pub version: String,
    pub install_dir: Option<PathBuf>,
}

impl<R: Runtime + 'static> Config<R> {
    pub fn new(runtime: R, options: InstallOptions) -> Result<Self> {
        let runtime = Arc::new(runtime);

        let token = non_empty(options.github_token)
            .or_else(|| non_empty(runtime.env_var("GITHUB_TOKEN").ok()));

        let mut headers = HeaderMap::new();
        if let Some(token) = &token {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GitHub token for authentication: {}", mask_token(token));
        }

        let authenticated = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;
        let anonymous = Client::builder().user_agent(USER_AGENT).build()?;

        let api_url = non_empty(options.api_url);
        let catalog = GitHub::new(
            HttpClient::new(authenticated),
            api_url.clone(),
            GitHubRepo::licensed(),
        );
        let downloader = GitHubAssetDownloader::new(
            runtime.clone(),
            HttpClient::new(anonymous),
            api_url,
            GitHubRepo::licensed(),
        );
        let extractor = TarInstaller::new(runtime.clone());

        Ok(Self {
            runtime,
            catalog,
            downloader,
            extractor,
            version: options.version,
            install_dir: options.install_dir.filter(|dir| !dir.as_os_str().is_empty()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Keep the first and last four characters of long tokens, hide everything else.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
