//! Thin HTTP client shared by feed downloads and full-text page fetches.

use std::time::Duration;

use newsdigest_shared::{NewsDigestError, Result};
use reqwest::Client;
use tracing::debug;

/// Maximum number of redirects followed for a single request.
const MAX_REDIRECTS: usize = 5;

/// Default maximum response size (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// HTTP GET with a fixed user agent, per-request timeout and body size cap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_response_size: u64,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| NewsDigestError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    pub fn with_max_response_size(mut self, bytes: u64) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Fetch raw bytes. Non-2xx statuses are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.send(url).await?;
        self.read_limited(url, response).await
    }

    /// Fetch a body as text, replacing invalid UTF-8. Non-2xx statuses are errors.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the body chunk by chunk, failing as soon as it exceeds the cap.
    /// Chunked responses carry no `Content-Length` to check up front.
    async fn read_limited(&self, url: &str, mut response: reqwest::Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsDigestError::Network(format!("{url}: failed to read body: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_response_size {
                return Err(self.too_large(url, body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn too_large(&self, url: &str, len: impl std::fmt::Display) -> NewsDigestError {
        NewsDigestError::validation(format!(
            "{url}: response too large ({len} bytes, max {})",
            self.max_response_size
        ))
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewsDigestError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsDigestError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_response_size {
                return Err(self.too_large(url, len));
            }
        }

        Ok(response)
    }
}
