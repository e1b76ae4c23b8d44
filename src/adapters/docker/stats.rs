// Engine stats document -> current/previous snapshot pair.
//
// Parsed leniently from the JSON form of the document so older engines that
// omit counters still parse. Documents that went through bollard's typed
// `Stats` have already lost `nvidia_gpu_stats`; the GPU block is only filled
// when the source JSON still carries it.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{CpuCounters, InterfaceCounters, MemoryCounters, StatsReading, StatsSnapshot};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineStats {
    cpu_stats: EngineCpuStats,
    precpu_stats: EngineCpuStats,
    memory_stats: EngineMemoryStats,
    networks: Option<BTreeMap<String, InterfaceCounters>>,
    nvidia_gpu_stats: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineCpuStats {
    cpu_usage: EngineCpuUsage,
    system_cpu_usage: Option<u64>,
    online_cpus: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineCpuUsage {
    total_usage: u64,
    percpu_usage: Option<Vec<u64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EngineMemoryStats {
    usage: Option<u64>,
    limit: Option<u64>,
}

impl From<&EngineCpuStats> for CpuCounters {
    fn from(stats: &EngineCpuStats) -> Self {
        CpuCounters {
            total_usage: stats.cpu_usage.total_usage,
            system_usage: stats.system_cpu_usage.unwrap_or(0),
            online_cpus: stats.online_cpus,
            per_cpu_usage: stats.cpu_usage.percpu_usage.clone().unwrap_or_default(),
        }
    }
}

/// Split a single-shot stats document into its two samples.
///
/// `cpu_stats` is the end reading and `precpu_stats` the start reading the
/// engine took about a second earlier. Memory, network and GPU counters are
/// only reported for the end reading.
pub(crate) fn reading_from_native(native: serde_json::Value) -> Result<StatsReading, serde_json::Error> {
    let engine = EngineStats::deserialize(&native)?;

    let memory = MemoryCounters::new(
        engine.memory_stats.usage.unwrap_or(0),
        engine.memory_stats.limit.unwrap_or(0),
    );
    let mut current = StatsSnapshot::new(CpuCounters::from(&engine.cpu_stats), memory);
    current.networks = engine.networks.unwrap_or_default();
    current.gpu = engine.nvidia_gpu_stats;

    let previous = StatsSnapshot::new(CpuCounters::from(&engine.precpu_stats), MemoryCounters::default());

    Ok(StatsReading::new(current, previous).with_native(native))
}
