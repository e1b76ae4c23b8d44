use serde::{Deserialize, Serialize};

use super::StatsSnapshot;

/// Derived per-container percentages, recomputed on every poll
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    /// Share of one CPU times the core count, so up to `100 * cores`
    pub cpu_percent: f64,
    /// `None` when the container reports no memory limit
    pub memory_percent: Option<f64>,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

/// Derive CPU and memory percentages from two consecutive snapshots.
///
/// CPU uses the delta method: the container's share of the host CPU time
/// elapsed between the two readings, scaled by the number of CPUs. A
/// non-positive delta on either counter (first sample, counter reset after
/// a restart) yields 0.
pub fn normalize(current: &StatsSnapshot, previous: &StatsSnapshot) -> NormalizedMetrics {
    NormalizedMetrics {
        cpu_percent: cpu_percent(current, previous),
        memory_percent: memory_percent(current.memory.usage, current.memory.limit),
        memory_usage_bytes: current.memory.usage,
        memory_limit_bytes: current.memory.limit,
    }
}

fn cpu_percent(current: &StatsSnapshot, previous: &StatsSnapshot) -> f64 {
    let cpu_delta = current.cpu.total_usage as i128 - previous.cpu.total_usage as i128;
    let system_delta = current.cpu.system_usage as i128 - previous.cpu.system_usage as i128;

    if cpu_delta <= 0 || system_delta <= 0 {
        return 0.0;
    }

    let cpu_count = current.cpu.cpu_count() as f64;
    (cpu_delta as f64 / system_delta as f64) * cpu_count * 100.0
}

/// `usage / limit * 100`, or `None` for a zero limit.
pub fn memory_percent(usage: u64, limit: u64) -> Option<f64> {
    if limit == 0 {
        return None;
    }
    Some(usage as f64 / limit as f64 * 100.0)
}

/// Two-decimal rounding for display and the wire format.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
