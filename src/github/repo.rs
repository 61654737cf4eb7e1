/// Coordinates of a GitHub repository.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl GitHubRepo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// The upstream repository publishing `licensed` releases.
    pub fn licensed() -> Self {
        Self::new("github", "licensed")
    }

    /// `{api_url}/repos/{owner}/{repo}`
    pub fn api_path(&self, api_url: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
