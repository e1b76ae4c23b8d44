use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::ContainerRecord;
use crate::ports::{FeedError, StatsFeed};

/// Error body returned by the API on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Reads aggregated records from a running dockpulse server
pub struct ApiFeed {
    client: reqwest::Client,
    stats_url: String,
}

impl ApiFeed {
    /// `base_url` is the API root, e.g. `http://localhost:5001/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            stats_url: format!("{}/containers/stats", base_url.trim_end_matches('/')),
        })
    }

    pub fn stats_url(&self) -> &str {
        &self.stats_url
    }
}

#[async_trait]
impl StatsFeed for ApiFeed {
    async fn fetch(&self) -> Result<Vec<ContainerRecord>, FeedError> {
        let response = self
            .client
            .get(&self.stats_url)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(FeedError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let records: Vec<ContainerRecord> = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;
        debug!(count = records.len(), "fetched container records");
        Ok(records)
    }
}
