use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ContainerRecord;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Port for the polling client: where aggregated container records come from
#[async_trait]
pub trait StatsFeed: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ContainerRecord>, FeedError>;
}
