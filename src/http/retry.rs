//! Rate-limit detection and bounded retry for GitHub API requests.
//!
//! Only rate limiting is retried. Every other failure is reported to the
//! caller immediately with a user-friendly message.

use anyhow::Result;
use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::InstallError;

/// Number of times a rate-limited request is retried before giving up.
pub const MAX_RATE_LIMIT_RETRIES: usize = 5;

/// Wait used when a secondary rate limit does not say how long to back off.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_RESET: &str = "x-ratelimit-reset";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    /// Hourly request quota exhausted.
    Primary,
    /// Abuse-detection throttling, independent of the quota.
    Secondary,
}

impl std::fmt::Display for RateLimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitKind::Primary => write!(f, "primary"),
            RateLimitKind::Secondary => write!(f, "secondary"),
        }
    }
}

/// A rate-limit signal together with the server-requested backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub kind: RateLimitKind,
    pub retry_after: Duration,
}

/// Outcome of a single request attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Complete(T),
    RateLimited(RateLimit),
}

/// Errors that are reported without retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// HTTP 401
    AuthenticationFailed,
    /// HTTP 403 that is not rate limiting
    Forbidden,
    /// HTTP 404
    NotFound,
    /// Any other 4xx
    ClientError(u16),
    /// 5xx
    ServerError(u16),
}

impl RequestError {
    /// Maps an unsuccessful status to an error. Returns `None` for 1xx-3xx.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::UNAUTHORIZED => Some(RequestError::AuthenticationFailed),
            StatusCode::FORBIDDEN => Some(RequestError::Forbidden),
            StatusCode::NOT_FOUND => Some(RequestError::NotFound),
            s if s.is_client_error() => Some(RequestError::ClientError(s.as_u16())),
            s if s.is_server_error() => Some(RequestError::ServerError(s.as_u16())),
            _ => None,
        }
    }

    /// The HTTP status this error stands for.
    pub fn status(&self) -> u16 {
        match self {
            RequestError::AuthenticationFailed => 401,
            RequestError::Forbidden => 403,
            RequestError::NotFound => 404,
            RequestError::ClientError(status) | RequestError::ServerError(status) => *status,
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::AuthenticationFailed => {
                write!(
                    f,
                    "Authentication failed: invalid or missing token. Check the github_token input."
                )
            }
            RequestError::Forbidden => {
                write!(f, "Access forbidden. You may need authentication.")
            }
            RequestError::NotFound => {
                write!(f, "Not found: the requested resource does not exist")
            }
            RequestError::ClientError(status) => write!(f, "Request error: HTTP {}", status),
            RequestError::ServerError(status) => write!(f, "Server error: HTTP {}", status),
        }
    }
}

impl std::error::Error for RequestError {}

/// Decides whether a response is a rate-limit signal.
///
/// Primary limits carry `x-ratelimit-remaining: 0` and a reset epoch;
/// secondary limits carry `retry-after` or mention a secondary rate limit in
/// the body. A bare 429 is treated as secondary.
pub fn detect_rate_limit(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: SystemTime,
) -> Option<RateLimit> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    if header_str(headers, RATELIMIT_REMAINING) == Some("0") {
        let retry_after = header_str(headers, RATELIMIT_RESET)
            .and_then(|v| v.parse::<u64>().ok())
            .map(|reset| {
                let now = now
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                Duration::from_secs(reset.saturating_sub(now))
            })
            .unwrap_or(DEFAULT_RETRY_AFTER);
        return Some(RateLimit {
            kind: RateLimitKind::Primary,
            retry_after,
        });
    }

    if let Some(value) = header_str(headers, RETRY_AFTER.as_str()) {
        let retry_after = value
            .parse::<u64>()
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_AFTER);
        return Some(RateLimit {
            kind: RateLimitKind::Secondary,
            retry_after,
        });
    }

    if status == StatusCode::TOO_MANY_REQUESTS
        || body.to_lowercase().contains("secondary rate limit")
    {
        return Some(RateLimit {
            kind: RateLimitKind::Secondary,
            retry_after: DEFAULT_RETRY_AFTER,
        });
    }

    None
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Runs `operation`, sleeping and retrying while it reports a rate limit.
///
/// The operation runs at most `max_retries + 1` times. Errors returned by the
/// operation are never retried.
pub async fn with_rate_limit_retry<F, Fut, T>(
    operation_name: &str,
    max_retries: usize,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Attempt<T>>>,
{
    let max_attempts = max_retries + 1;

    for attempt in 1..=max_attempts {
        match operation().await? {
            Attempt::Complete(value) => return Ok(value),
            Attempt::RateLimited(limit) => {
                if attempt == max_attempts {
                    debug!(
                        "{}: {} rate limit on final attempt {}",
                        operation_name, limit.kind, attempt
                    );
                    break;
                }
                warn!(
                    "{}: {} rate limit hit (attempt {}/{}), retrying in {}s...",
                    operation_name,
                    limit.kind,
                    attempt,
                    max_attempts,
                    limit.retry_after.as_secs()
                );
                tokio::time::sleep(limit.retry_after).await;
            }
        }
    }

    Err(InstallError::RateLimited {
        operation: operation_name.to_string(),
        attempts: max_attempts,
    }
    .into())
}
