use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use super::repo::GitHubRepo;
use super::types::ApiRelease;
use crate::domain::Release;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PER_PAGE: usize = 100;

// 10 pages of 100 releases, to prevent an infinite loop
const MAX_PAGES: usize = 10;

/// Source of the installable releases of the upstream project.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseCatalog: Send + Sync {
    /// All releases that have at least one asset, in upstream order.
    async fn list_releases(&self) -> Result<Vec<Release>>;
}

/// Release catalog backed by the GitHub REST API.
pub struct GitHub {
    http_client: HttpClient,
    api_url: String,
    repo: GitHubRepo,
}

impl GitHub {
    #[tracing::instrument(skip(http_client, api_url))]
    pub fn new(http_client: HttpClient, api_url: Option<String>, repo: GitHubRepo) -> Self {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            http_client,
            api_url,
            repo,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_releases(&self) -> Result<Vec<ApiRelease>> {
        let url = format!("{}/releases", self.repo.api_path(&self.api_url));
        let per_page = PER_PAGE.to_string();
        let mut releases = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!("Fetching releases page {} from {}...", page, url);

            let page_str = page.to_string();
            let parsed: Vec<ApiRelease> = self
                .http_client
                .get_json_with_query(
                    "Fetching releases",
                    &url,
                    &[("per_page", &per_page), ("page", &page_str)],
                )
                .await?;

            let len = parsed.len();
            releases.extend(parsed);

            if len < PER_PAGE {
                break;
            }
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseCatalog for GitHub {
    #[tracing::instrument(skip(self))]
    async fn list_releases(&self) -> Result<Vec<Release>> {
        let releases: Vec<Release> = self
            .fetch_releases()
            .await?
            .into_iter()
            .map(Release::from)
            .filter(Release::has_assets)
            .collect();

        debug!("{} has {} release(s) with assets", self.repo, releases.len());
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AssetState;
    use crate::error::InstallError;
    use reqwest::Client;

    const RELEASES_PATH: &str = "/repos/github/licensed/releases?per_page=100&page=1";

    fn catalog(url: &str) -> GitHub {
        GitHub::new(
            HttpClient::new(Client::new()),
            Some(url.to_string()),
            GitHubRepo::licensed(),
        )
    }

    #[test]
    fn test_default_api_url() {
        let github = GitHub::new(HttpClient::new(Client::new()), None, GitHubRepo::licensed());
        assert_eq!(github.api_url(), "https://api.github.com");
    }

    #[tokio::test]
    async fn test_list_releases_single_page() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", RELEASES_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {
                        "tag_name": "v4.3.0",
                        "assets": [
                            {"id": 1, "name": "licensed-4.3.0-linux-x64.tar.gz", "state": "uploaded"}
                        ]
                    },
                    {
                        "tag_name": "v4.2.0",
                        "assets": [
                            {"id": 2, "name": "licensed-4.2.0-linux-x64.tar.gz", "state": "open"}
                        ]
                    }
                ]"#,
            )
            .create_async()
            .await;

        let releases = catalog(&url).list_releases().await.unwrap();

        mock.assert_async().await;
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag, "v4.3.0");
        assert_eq!(releases[0].assets[0].state, AssetState::Uploaded);
        assert_eq!(releases[1].assets[0].state, AssetState::Other("open".into()));
    }

    #[tokio::test]
    async fn test_list_releases_drops_releases_without_assets() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", RELEASES_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"tag_name": "v5.0.0-rc.1", "assets": []},
                    {"tag_name": "v4.3.0", "assets": [
                        {"id": 1, "name": "licensed-4.3.0-linux-x64.tar.gz", "state": "uploaded"}
                    ]}
                ]"#,
            )
            .create_async()
            .await;

        let releases = catalog(&url).list_releases().await.unwrap();

        mock.assert_async().await;
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].tag, "v4.3.0");
    }

    #[tokio::test]
    async fn test_list_releases_multiple_pages() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let page1: Vec<serde_json::Value> = (0..100)
            .map(|i| {
                serde_json::json!({
                    "tag_name": format!("v3.0.{}", i),
                    "assets": [{"id": i, "name": format!("licensed-3.0.{}-linux-x64.tar.gz", i), "state": "uploaded"}]
                })
            })
            .collect();

        let mock_p1 = server
            .mock("GET", RELEASES_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&page1).unwrap())
            .create_async()
            .await;

        let mock_p2 = server
            .mock("GET", "/repos/github/licensed/releases?per_page=100&page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"tag_name": "v1.0.0", "assets": [{"id": 999, "name": "licensed-1.0.0-linux-x64.tar.gz", "state": "uploaded"}]}]"#,
            )
            .create_async()
            .await;

        let releases = catalog(&url).list_releases().await.unwrap();

        mock_p1.assert_async().await;
        mock_p2.assert_async().await;
        assert_eq!(releases.len(), 101);
        assert_eq!(releases[100].tag, "v1.0.0");
    }

    #[tokio::test]
    async fn test_list_releases_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", RELEASES_PATH)
            .with_status(404)
            .create_async()
            .await;

        let result = catalog(&url).list_releases().await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_releases_retries_secondary_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let limited = server
            .mock("GET", RELEASES_PATH)
            .with_status(403)
            .with_header("retry-after", "0")
            .with_body(r#"{"message": "You have exceeded a secondary rate limit."}"#)
            .expect(4)
            .create_async()
            .await;
        let ok = server
            .mock("GET", RELEASES_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"tag_name": "v4.3.0", "assets": [{"id": 1, "name": "licensed-4.3.0-linux-x64.tar.gz", "state": "uploaded"}]}]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let releases = catalog(&url).list_releases().await.unwrap();

        limited.assert_async().await;
        ok.assert_async().await;
        assert_eq!(releases[0].tag, "v4.3.0");
    }

    #[tokio::test]
    async fn test_list_releases_fails_after_six_rate_limits() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let limited = server
            .mock("GET", RELEASES_PATH)
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(6)
            .create_async()
            .await;

        let err = catalog(&url).list_releases().await.unwrap_err();

        limited.assert_async().await;
        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::RateLimited { attempts: 6, .. })
        ));
    }
}
