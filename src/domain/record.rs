use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::metrics::round2;
use super::{
    ContainerId, ContainerStatus, ContainerSummary, DiskDriver, InterfaceCounters, NormalizedMetrics,
    StatsReading,
};

/// Memory block of a record; `percentage` is null when the limit is zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryReport {
    pub usage: u64,
    pub limit: u64,
    #[serde(serialize_with = "serialize_rounded_opt")]
    pub percentage: Option<f64>,
}

/// Everything the aggregate endpoint reports for one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    #[serde(with = "unix_seconds")]
    pub created: DateTime<Utc>,
    #[serde(serialize_with = "serialize_rounded")]
    pub cpu: f64,
    pub memory: MemoryReport,
    #[serde(default)]
    pub network: BTreeMap<String, InterfaceCounters>,
    #[serde(default)]
    pub disk: Option<DiskDriver>,
    #[serde(default)]
    pub gpu: Option<serde_json::Value>,
}

impl ContainerRecord {
    pub fn assemble(
        summary: ContainerSummary,
        metrics: NormalizedMetrics,
        reading: StatsReading,
        disk: DiskDriver,
    ) -> Self {
        let StatsReading { current, .. } = reading;
        Self {
            id: summary.id,
            name: summary.name,
            image: summary.image,
            status: summary.status,
            created: summary.created_at,
            cpu: metrics.cpu_percent,
            memory: MemoryReport {
                usage: metrics.memory_usage_bytes,
                limit: metrics.memory_limit_bytes,
                percentage: metrics.memory_percent,
            },
            network: current.networks,
            disk: Some(disk).filter(|d| !d.name.is_empty()),
            gpu: current.gpu,
        }
    }
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

fn serialize_rounded_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round2(*v)),
        None => serializer.serialize_none(),
    }
}

mod unix_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.timestamp())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {secs}")))
    }
}
