use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use crate::data::types::RacesResponse;

/// Failure of a single `nextraces` fetch
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Network unreachable, DNS, timeout. Carries the underlying message as-is.
    #[error("{0}")]
    Transport(String),

    #[error("Failed to fetch next races: {0}")]
    Status(String),

    #[error("Failed to decode next races response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn from_status(status: StatusCode) -> Self {
        let text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        FetchError::Status(text)
    }
}

/// Anything that can produce a next-to-go response
pub trait RaceSource: Send + Sync {
    fn fetch_next_races(
        &self,
        count: u32,
    ) -> impl Future<Output = Result<RacesResponse, FetchError>> + Send;
}

pub struct RacingApiClient {
    client: Client,
    base_url: String,
}

impl RacingApiClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build racing API HTTP client")?;

        Ok(Self { client, base_url })
    }
}

impl RaceSource for RacingApiClient {
    /// `GET <base>?method=nextraces&count=<n>`
    async fn fetch_next_races(&self, count: u32) -> Result<RacesResponse, FetchError> {
        debug!("Fetching next {} races from {}", count, self.base_url);

        let response = self.client
            .get(&self.base_url)
            .query(&[("method", "nextraces".to_string()), ("count", count.to_string())])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }

        response
            .json::<RacesResponse>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
