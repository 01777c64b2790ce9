//! HTTP fetcher: the default `PageFetcher`
//!
//! A plain reqwest-based renderer. Sites that require JavaScript rendering
//! or browser automation plug in their own `PageFetcher`; the engine only
//! cares about the `{html, final_url}` contract.

use crate::crawler::collaborators::{FetchOutcome, PageFetcher};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Builds the HTTP client used for page fetches
pub fn build_http_client(user_agent: &str, timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over plain HTTP(S)
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent, timeout_secs)?,
        })
    }

    /// Wraps an existing client (e.g. one shared across sources)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return FetchOutcome::Failed {
                    error: format!("Request failed: {}", e),
                };
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return FetchOutcome::Failed {
                error: format!("HTTP {}", status.as_u16()),
            };
        }

        match response.text().await {
            Ok(html) => FetchOutcome::Success { html, final_url },
            Err(e) => FetchOutcome::Failed {
                error: format!("Failed to read body: {}", e),
            },
        }
    }
}
