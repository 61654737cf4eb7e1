//! HTTP client module with rate-limit retry and error handling.

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{
    Attempt, DEFAULT_RETRY_AFTER, MAX_RATE_LIMIT_RETRIES, RateLimit, RateLimitKind, RequestError,
    detect_rate_limit, with_rate_limit_retry,
};
