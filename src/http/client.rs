//! HTTP client with rate-limit retry and status handling.

use anyhow::{Context, Result};
use log::debug;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::time::SystemTime;

use super::retry::{
    Attempt, MAX_RATE_LIMIT_RETRIES, RequestError, detect_rate_limit, with_rate_limit_retry,
};
use crate::error::InstallError;

const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP client that transparently retries rate-limited requests.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Sends the request built by `build`, retrying while the server reports
    /// a rate limit. Non-rate-limit responses are returned as-is, whatever
    /// their status.
    #[tracing::instrument(skip(self, build))]
    pub async fn send<F>(&self, operation_name: &str, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let client = &self.client;
        let build = &build;
        with_rate_limit_retry(operation_name, MAX_RATE_LIMIT_RETRIES, || async move {
            let response = build(client)
                .send()
                .await
                .context("Failed to send request")?;
            check_rate_limit(response).await
        })
        .await
    }

    /// Performs a GET request with query parameters and deserializes the JSON response.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!("GET JSON from {} with query {:?}...", url, query);

        let response = self
            .send(operation_name, |client| client.get(url).query(query))
            .await?;

        if let Some(err) = RequestError::from_status(response.status()) {
            return Err(err).with_context(|| format!("{}: GET {} failed", operation_name, url));
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse JSON response")
    }

    /// Downloads binary content from `url` into the writer returned by
    /// `create_writer`. The writer is only created once the server answered
    /// with HTTP 200; any other final status is an [`InstallError::Download`].
    #[tracing::instrument(skip(self, create_writer))]
    pub async fn download_file<W, F>(&self, label: &str, url: &str, create_writer: F) -> Result<u64>
    where
        W: Write,
        F: FnOnce() -> Result<W>,
    {
        debug!("Downloading {} from {}...", label, url);

        let sent = self
            .send("Downloading asset", |client| {
                client
                    .get(url)
                    .header(ACCEPT, HeaderValue::from_static(OCTET_STREAM))
            })
            .await;

        // A 403 without a rate-limit signal is rejected inside `send`
        let mut response = match sent {
            Ok(response) => response,
            Err(err) => {
                return match err.downcast_ref::<RequestError>() {
                    Some(request_err) => Err(InstallError::Download {
                        asset: label.to_string(),
                        status: request_err.status(),
                    }
                    .into()),
                    None => Err(err),
                };
            }
        };

        if response.status() != StatusCode::OK {
            return Err(InstallError::Download {
                asset: label.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let mut writer = create_writer()?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

/// Turns 403/429 rate-limit responses into [`Attempt::RateLimited`].
async fn check_rate_limit(response: Response) -> Result<Attempt<Response>> {
    let status = response.status();
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return Ok(Attempt::Complete(response));
    }

    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();

    match detect_rate_limit(status, &headers, &body, SystemTime::now()) {
        Some(limit) => Ok(Attempt::RateLimited(limit)),
        None => {
            debug!("HTTP {} without rate limit signal: {}", status, body);
            let err = RequestError::from_status(status).unwrap_or(RequestError::Forbidden);
            Err(err.into())
        }
    }
}
