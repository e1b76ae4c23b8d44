pub mod container;
pub mod metrics;
pub mod record;
pub mod stats;

pub use container::{ContainerId, ContainerStatus, ContainerSummary, DiskDriver};
pub use metrics::{normalize, round2, NormalizedMetrics};
pub use record::{ContainerRecord, MemoryReport};
pub use stats::{CpuCounters, InterfaceCounters, MemoryCounters, StatsReading, StatsSnapshot};
