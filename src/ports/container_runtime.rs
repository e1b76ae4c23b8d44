use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContainerId, ContainerSummary, DiskDriver, StatsReading};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Socket missing, permission denied, daemon down
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    #[error("container {0} not found")]
    ContainerNotFound(ContainerId),

    #[error("container runtime rejected request: {0}")]
    Engine(String),

    #[error("no stats returned for container {0}")]
    EmptyStats(ContainerId),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// One entry of a container listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListedContainer {
    pub summary: ContainerSummary,
    /// The engine's own listing entry, served verbatim by `/api/containers`
    pub native: serde_json::Value,
}

impl ListedContainer {
    pub fn new(summary: ContainerSummary) -> Self {
        Self {
            summary,
            native: serde_json::Value::Null,
        }
    }

    pub fn with_native(mut self, native: serde_json::Value) -> Self {
        self.native = native;
        self
    }
}

/// Port for talking to the container engine.
///
/// Every call is a fresh round trip: no retry, no caching.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// List containers; stopped ones only when `include_stopped` is set
    async fn list_containers(&self, include_stopped: bool) -> RuntimeResult<Vec<ListedContainer>>;

    /// Single-shot stats. Blocks for about a second while the engine takes
    /// its two internal samples; size timeouts accordingly.
    async fn stats(&self, id: &ContainerId) -> RuntimeResult<StatsReading>;

    /// Storage driver details of one container
    async fn inspect(&self, id: &ContainerId) -> RuntimeResult<DiskDriver>;

    /// Cheap liveness probe of the engine
    async fn ping(&self) -> RuntimeResult<()>;
}
