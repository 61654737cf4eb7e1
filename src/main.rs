use anyhow::Result;
use clap::Parser;
use log::debug;
use setup_licensed::{
    actions,
    install::{InstallOptions, install},
    runtime::RealRuntime,
};
use std::path::PathBuf;

/// setup-licensed - install the `licensed` CLI in CI
///
/// Resolves a version of github/licensed against its GitHub releases,
/// downloads the archive built for this platform and extracts the
/// `licensed` executable into the install directory, which is then added
/// to PATH.
///
/// Inputs follow the GitHub Actions convention, so every flag can also be
/// given through its INPUT_* environment variable.
///
/// Examples:
///   setup-licensed --version 4 --install-dir /usr/local/bin
#[derive(Parser, Debug)]
#[command(author, about, disable_version_flag = true)]
struct Cli {
    /// Version of licensed to install: exact tag or semver requirement
    #[arg(long = "version", env = "INPUT_VERSION", value_name = "VERSION")]
    licensed_version: String,

    /// Directory to extract licensed into; installation is skipped when empty
    #[arg(long = "install-dir", env = "INPUT_INSTALL-DIR", value_name = "PATH")]
    install_dir: Option<PathBuf>,

    /// Token used to list releases (falls back to GITHUB_TOKEN)
    #[arg(
        long = "github-token",
        env = "INPUT_GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    github_token: Option<String>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", env = "GITHUB_API_URL", value_name = "URL")]
    api_url: Option<String>,
}

impl From<Cli> for InstallOptions {
    fn from(cli: Cli) -> Self {
        InstallOptions {
            version: cli.licensed_version,
            install_dir: cli.install_dir,
            github_token: cli.github_token,
            api_url: cli.api_url,
        }
    }
}

// The runtime stays on a single thread: PATH is mutated in-process.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("setup-licensed {}", env!("SETUP_LICENSED_VERSION"));

    if let Some(tag) = install(RealRuntime, cli.into()).await? {
        println!("{}", tag);
        actions::set_output(&RealRuntime, "version", &tag)?;
    }
    Ok(())
}
