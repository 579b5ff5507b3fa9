use futures::StreamExt;
use reqwest::redirect::Policy;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::feed::types::RawFeedDocument;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching one feed URL.
///
/// The orchestrator treats every variant the same way (move on to the next
/// source); the variants exist for logging.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, redirect policy, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Any HTTP status other than 200
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout or the remaining chain budget
    #[error("Request timed out")]
    Timeout,
    /// Server answered 200 with no body
    #[error("Empty response body")]
    EmptyBody,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Builds the HTTP client used for every feed request.
///
/// Redirects are followed, timeouts come from the config, and certificate
/// verification stays on unless `danger_accept_invalid_certs` is set.
pub fn build_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(redirect_policy())
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
        .build()
}

fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("Too many redirects (max {MAX_REDIRECTS})"));
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len(),
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Retrieves raw feed bytes over HTTP(S). One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::with_client(
            build_client(config)?,
            config.request_timeout(),
        ))
    }

    pub fn with_client(client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    /// Fetches `url`, succeeding only on HTTP 200 with a non-empty body.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection, TLS or redirect errors
    /// - [`FetchError::Timeout`] - Request exceeded the configured timeout
    /// - [`FetchError::HttpStatus`] - Any status other than 200
    /// - [`FetchError::EmptyBody`] - 200 with nothing in it
    /// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
    pub async fn fetch(&self, url: &str) -> Result<RawFeedDocument, FetchError> {
        self.fetch_within(url, self.request_timeout).await
    }

    /// Like [`fetch`](Self::fetch), but gives up after `limit` if that is
    /// shorter than the configured request timeout.
    pub async fn fetch_within(
        &self,
        url: &str,
        limit: Duration,
    ) -> Result<RawFeedDocument, FetchError> {
        let limit = limit.min(self.request_timeout);
        tokio::time::timeout(limit, self.fetch_once(url))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn fetch_once(&self, url: &str) -> Result<RawFeedDocument, FetchError> {
        let response = self.client.get(url).send().await.map_err(network_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let encoding = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_of);

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        tracing::debug!(url = %url, bytes = bytes.len(), "Fetched feed");

        Ok(RawFeedDocument {
            url: url.to_owned(),
            bytes,
            encoding,
        })
    }
}

fn network_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e)
    }
}

/// Extracts the `charset` parameter from a Content-Type value.
fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
            .filter(|v| !v.is_empty())
    })
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(network_error)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // EDGE-005: Network interruptions can end the stream early
    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
