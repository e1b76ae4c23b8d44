// Scripted in-memory runtime for tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{
    normalize, ContainerId, ContainerRecord, ContainerStatus, ContainerSummary, CpuCounters, DiskDriver,
    MemoryCounters, StatsReading, StatsSnapshot,
};
use crate::ports::{ContainerRuntime, ListedContainer, RuntimeError, RuntimeResult};

#[derive(Default)]
pub struct ScriptedRuntime {
    containers: Vec<ListedContainer>,
    readings: HashMap<ContainerId, RuntimeResult<StatsReading>>,
    disks: HashMap<ContainerId, DiskDriver>,
    delays: HashMap<ContainerId, Duration>,
    list_delay: Option<Duration>,
    list_error: Option<RuntimeError>,
}

/// A reading that normalizes to `cpu` percent on 4 CPUs and the given memory.
pub fn reading(cpu_percent: u64, usage: u64, limit: u64) -> StatsReading {
    let previous = StatsSnapshot::new(CpuCounters::new(0, 0), MemoryCounters::default());
    let current = StatsSnapshot::new(
        CpuCounters::new(cpu_percent * 10, 4_000).with_online_cpus(4),
        MemoryCounters::new(usage, limit),
    );
    StatsReading::new(current, previous).with_native(json!({ "memory_stats": { "usage": usage, "limit": limit } }))
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(self, id: &str, name: &str, status: ContainerStatus, stats: StatsReading) -> Self {
        self.with_container_result(id, name, status, Ok(stats))
    }

    pub fn with_failing_container(self, id: &str, name: &str, error: RuntimeError) -> Self {
        self.with_container_result(id, name, ContainerStatus::Running, Err(error))
    }

    fn with_container_result(
        mut self,
        id: &str,
        name: &str,
        status: ContainerStatus,
        stats: RuntimeResult<StatsReading>,
    ) -> Self {
        let container_id = ContainerId::new(id);
        let summary = ContainerSummary::new(
            container_id.clone(),
            name.to_string(),
            format!("{name}:latest"),
            status,
            DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        );
        let native = json!({ "Id": id, "Names": [format!("/{name}")], "State": status.as_str() });
        self.containers.push(ListedContainer::new(summary).with_native(native));
        self.readings.insert(container_id.clone(), stats);
        self.disks.insert(container_id, DiskDriver::new("overlay2"));
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(ContainerId::new(id), delay);
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_list_error(mut self, error: RuntimeError) -> Self {
        self.list_error = Some(error);
        self
    }
}

#[async_trait]
impl ContainerRuntime for ScriptedRuntime {
    async fn list_containers(&self, include_stopped: bool) -> RuntimeResult<Vec<ListedContainer>> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.list_error {
            return Err(err.clone());
        }
        // without `all` the engine lists running, paused and restarting containers
        Ok(self
            .containers
            .iter()
            .filter(|c| {
                include_stopped
                    || matches!(
                        c.summary.status,
                        ContainerStatus::Running | ContainerStatus::Paused | ContainerStatus::Restarting
                    )
            })
            .cloned()
            .collect())
    }

    async fn stats(&self, id: &ContainerId) -> RuntimeResult<StatsReading> {
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        self.readings
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(RuntimeError::ContainerNotFound(id.clone())))
    }

    async fn inspect(&self, id: &ContainerId) -> RuntimeResult<DiskDriver> {
        self.disks
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::ContainerNotFound(id.clone()))
    }

    async fn ping(&self) -> RuntimeResult<()> {
        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// An aggregated record as the API would serve it.
pub fn record(id: &str, name: &str, status: ContainerStatus, cpu_percent: u64, usage: u64, limit: u64) -> ContainerRecord {
    let summary = ContainerSummary::new(
        ContainerId::new(id),
        name.to_string(),
        format!("{name}:latest"),
        status,
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
    );
    let stats = reading(cpu_percent, usage, limit);
    let metrics = normalize(&stats.current, &stats.previous);
    ContainerRecord::assemble(summary, metrics, stats, DiskDriver::new("overlay2"))
}
