pub mod aggregation;
pub mod polling;

pub use aggregation::{AggregateOutcome, AggregationService, Omission};
pub use polling::{DashboardState, OverlapPolicy, Poller, RefreshOutcome, DEFAULT_POLL_INTERVAL};
