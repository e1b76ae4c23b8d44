use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Container lifecycle status as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Running,
    Exited,
    Paused,
    Created,
    Restarting,
    Removing,
    Dead,
    #[serde(other)]
    Unknown,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Paused => "paused",
            Self::Created => "created",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Maps the engine's state string; anything unrecognized becomes `Unknown`.
    pub fn from_engine(state: Option<&str>) -> Self {
        state
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized container status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ContainerStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "exited" => Ok(Self::Exited),
            "paused" => Ok(Self::Paused),
            "created" => Ok(Self::Created),
            "restarting" => Ok(Self::Restarting),
            "removing" => Ok(Self::Removing),
            "dead" => Ok(Self::Dead),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Identity and lifecycle status of one container, as listed by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    pub created_at: DateTime<Utc>,
}

impl ContainerSummary {
    pub fn new(
        id: ContainerId,
        name: String,
        image: String,
        status: ContainerStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            image,
            status,
            created_at,
        }
    }

    /// Engine names carry a leading slash (`/web`); the first name wins.
    pub fn display_name(names: Option<&[String]>, id: &ContainerId) -> String {
        names
            .and_then(|n| n.first())
            .map(|s| s.trim_start_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| id.as_str().to_string())
    }
}

/// Storage driver details from an inspect call (`GraphDriver` in the engine API)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskDriver {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Data", default)]
    pub data: BTreeMap<String, String>,
}

impl DiskDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
