use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cumulative CPU counters at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuCounters {
    /// Total CPU time consumed by the container (nanoseconds)
    pub total_usage: u64,
    /// Total CPU time of the host (nanoseconds)
    pub system_usage: u64,
    /// Absent on older engine versions
    pub online_cpus: Option<u32>,
    pub per_cpu_usage: Vec<u64>,
}

impl CpuCounters {
    pub fn new(total_usage: u64, system_usage: u64) -> Self {
        Self {
            total_usage,
            system_usage,
            online_cpus: None,
            per_cpu_usage: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_online_cpus(mut self, online_cpus: u32) -> Self {
        self.online_cpus = Some(online_cpus);
        self
    }

    #[cfg(test)]
    pub fn with_per_cpu_usage(mut self, per_cpu_usage: Vec<u64>) -> Self {
        self.per_cpu_usage = per_cpu_usage;
        self
    }

    /// Online CPU count, falling back to the length of the per-CPU list.
    pub fn cpu_count(&self) -> u32 {
        match self.online_cpus {
            Some(n) if n > 0 => n,
            _ => self.per_cpu_usage.len() as u32,
        }
    }
}

/// Memory counters at one instant (bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCounters {
    pub usage: u64,
    pub limit: u64,
}

impl MemoryCounters {
    pub fn new(usage: u64, limit: u64) -> Self {
        Self { usage, limit }
    }
}

/// Per-interface network counters, passed through to clients unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceCounters {
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub rx_packets: u64,
    #[serde(default)]
    pub rx_errors: u64,
    #[serde(default)]
    pub rx_dropped: u64,
    #[serde(default)]
    pub tx_bytes: u64,
    #[serde(default)]
    pub tx_packets: u64,
    #[serde(default)]
    pub tx_errors: u64,
    #[serde(default)]
    pub tx_dropped: u64,
}

impl InterfaceCounters {
    #[cfg(test)]
    pub fn new(rx_bytes: u64, tx_bytes: u64) -> Self {
        Self {
            rx_bytes,
            tx_bytes,
            ..Default::default()
        }
    }
}

/// A point-in-time set of cumulative resource counters for one container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub cpu: CpuCounters,
    pub memory: MemoryCounters,
    pub networks: BTreeMap<String, InterfaceCounters>,
    pub gpu: Option<serde_json::Value>,
}

impl StatsSnapshot {
    pub fn new(cpu: CpuCounters, memory: MemoryCounters) -> Self {
        Self {
            cpu,
            memory,
            networks: BTreeMap::new(),
            gpu: None,
        }
    }

    #[cfg(test)]
    pub fn with_network(mut self, interface: impl Into<String>, counters: InterfaceCounters) -> Self {
        self.networks.insert(interface.into(), counters);
        self
    }
}

/// Result of one single-shot stats call.
///
/// The engine samples twice internally (roughly one second apart), so a
/// reading already carries the previous snapshot needed for rate
/// computation. `native` is the engine's own document, kept for
/// pass-through endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReading {
    pub current: StatsSnapshot,
    pub previous: StatsSnapshot,
    pub native: serde_json::Value,
}

impl StatsReading {
    pub fn new(current: StatsSnapshot, previous: StatsSnapshot) -> Self {
        Self {
            current,
            previous,
            native: serde_json::Value::Null,
        }
    }

    pub fn with_native(mut self, native: serde_json::Value) -> Self {
        self.native = native;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_count_prefers_online_cpus() {
        let cpu = CpuCounters::new(0, 0)
            .with_online_cpus(8)
            .with_per_cpu_usage(vec![1, 2]);
        assert_eq!(cpu.cpu_count(), 8);
    }

    #[test]
    fn cpu_count_falls_back_to_per_cpu_list() {
        let cpu = CpuCounters::new(0, 0).with_per_cpu_usage(vec![1, 2, 3]);
        assert_eq!(cpu.cpu_count(), 3);

        let zero_reported = CpuCounters {
            online_cpus: Some(0),
            ..cpu
        };
        assert_eq!(zero_reported.cpu_count(), 3);
    }
}
