//! HTTP implementation of the [`Fetcher`] contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info};

use crate::contract::Fetcher;
use crate::error::FetchError;

/// Fetches JSON documents over HTTP(S) with a bounded per-request timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Value, FetchError> {
        info!(url = %location, "Downloading document");

        let response = self.client.get(location).send().await.map_err(|e| {
            error!(error = ?e, url = %location, "Failed to send request");
            FetchError::Transport {
                url: location.to_string(),
                source: e,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %location, "Server returned non-success status");
            return Err(FetchError::Status {
                url: location.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, url = %location, "Failed to read response body");
            FetchError::Transport {
                url: location.to_string(),
                source: e,
            }
        })?;

        let document = serde_json::from_slice::<Value>(&body).map_err(|e| {
            error!(error = %e, url = %location, "Response is not well-formed JSON");
            FetchError::Malformed {
                url: location.to_string(),
                source: e,
            }
        })?;

        info!(url = %location, bytes = body.len(), "Downloaded and parsed document");
        Ok(document)
    }
}
