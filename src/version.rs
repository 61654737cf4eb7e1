//! Version resolution against the release catalog.
//!
//! A requested version is either an exact tag (`v4.3.0`), a partial version
//! (`4`, `v4.3`) or a semver requirement (`^4.1`, `>=3, <5`, `*`).

use log::debug;
use semver::{Version, VersionReq};

use crate::domain::Release;

/// Resolves a requested version specifier to one of the known tags.
#[cfg_attr(test, mockall::automock)]
pub trait VersionMatcher: Send + Sync {
    /// Returns the matching tag, or `None` if nothing matches.
    fn resolve(&self, known_tags: &[String], requested: &str) -> Option<String>;
}

/// Exact tag match first, then the highest semver-compatible tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct SemverMatcher;

impl VersionMatcher for SemverMatcher {
    fn resolve(&self, known_tags: &[String], requested: &str) -> Option<String> {
        let requested = requested.trim();

        if let Some(tag) = known_tags.iter().find(|t| versions_match(t, requested)) {
            return Some(tag.clone());
        }

        let Some(requirement) = parse_requirement(requested) else {
            debug!("'{}' is not a valid version requirement", requested);
            return None;
        };

        known_tags
            .iter()
            .filter_map(|tag| parse_tag(tag).map(|version| (version, tag)))
            .filter(|(version, _)| requirement.matches(version))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, tag)| tag.clone())
    }
}

/// Find the release carrying exactly `tag`.
pub fn find_release<'a>(releases: &'a [Release], tag: &str) -> Option<&'a Release> {
    releases.iter().find(|r| r.tag == tag)
}

/// Check if two version strings match, ignoring a leading 'v' on either side.
pub fn versions_match(v1: &str, v2: &str) -> bool {
    let n1 = v1.strip_prefix('v').unwrap_or(v1);
    let n2 = v2.strip_prefix('v').unwrap_or(v2);
    n1 == n2
}

fn parse_tag(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// Bare partial versions become wildcards over the omitted components
/// (`4` => `>=4.0.0, <5.0.0`, `4.3` => `>=4.3.0, <4.4.0`).
fn parse_requirement(requested: &str) -> Option<VersionReq> {
    let bare = requested.strip_prefix('v').unwrap_or(requested);
    if is_partial_version(bare) {
        VersionReq::parse(&format!("={}", bare)).ok()
    } else {
        VersionReq::parse(requested).ok()
    }
}

fn is_partial_version(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() <= 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
