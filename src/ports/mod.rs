pub mod container_runtime;
pub mod stats_feed;

pub use container_runtime::{ContainerRuntime, ListedContainer, RuntimeError, RuntimeResult};
pub use stats_feed::{FeedError, StatsFeed};
