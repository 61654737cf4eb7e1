//! GitHub release catalog for the upstream repository.

mod client;
mod repo;
mod types;

#[cfg(test)]
pub use client::MockReleaseCatalog;
pub use client::{DEFAULT_API_URL, GitHub, ReleaseCatalog};
pub use repo::GitHubRepo;
