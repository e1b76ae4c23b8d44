use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, StatsOptions};
use bollard::errors::Error as BollardError;
use bollard::models::ContainerSummary as EngineSummary;
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures::stream::StreamExt;
use nix::unistd::{access, AccessFlags};
use tracing::{debug, info, warn};

use super::stats::reading_from_native;
use crate::domain::{ContainerId, ContainerStatus, ContainerSummary, DiskDriver, StatsReading};
use crate::ports::{ContainerRuntime, ListedContainer, RuntimeError, RuntimeResult};

/// Process-wide engine handle: either connected or known to be unavailable
enum Connection {
    Ready(Docker),
    Unavailable(String),
}

/// Docker adapter using bollard client
pub struct DockerAdapter {
    socket_path: PathBuf,
    timeout_secs: u64,
    connection: RwLock<Connection>,
}

impl DockerAdapter {
    /// Probe the socket and build the handle. Never fails: an inaccessible
    /// socket leaves the handle unavailable and every call reports it.
    pub fn connect(docker_host: &str, timeout_secs: u64) -> Self {
        let socket_path = PathBuf::from(docker_host.trim_start_matches("unix://"));

        let connection = match Self::open(&socket_path, timeout_secs) {
            Ok(client) => {
                info!("✓ Docker socket {} is accessible", socket_path.display());
                Connection::Ready(client)
            }
            Err(reason) => {
                warn!("⚠ {}. Container endpoints will fail until the socket is reachable.", reason);
                warn!("  Make sure the current user can read and write the socket (e.g. is in the docker group).");
                Connection::Unavailable(reason)
            }
        };

        Self {
            socket_path,
            timeout_secs,
            connection: RwLock::new(connection),
        }
    }

    /// Why the last connection attempt failed, if the handle is unavailable
    pub fn unavailable_reason(&self) -> Option<String> {
        match &*self.connection.read().unwrap_or_else(PoisonError::into_inner) {
            Connection::Ready(_) => None,
            Connection::Unavailable(reason) => Some(reason.clone()),
        }
    }

    fn open(socket_path: &Path, timeout_secs: u64) -> Result<Docker, String> {
        access(socket_path, AccessFlags::R_OK | AccessFlags::W_OK)
            .map_err(|errno| format!("cannot access Docker socket {}: {}", socket_path.display(), errno))?;

        let path = socket_path
            .to_str()
            .ok_or_else(|| format!("Docker socket path is not valid UTF-8: {}", socket_path.display()))?;

        Docker::connect_with_socket(path, timeout_secs, bollard::API_DEFAULT_VERSION)
            .map_err(|e| format!("cannot connect to Docker socket {}: {}", socket_path.display(), e))
    }

    /// Current client, re-validating an unavailable handle once per call.
    fn client(&self) -> RuntimeResult<Docker> {
        if let Connection::Ready(client) = &*self.connection.read().unwrap_or_else(PoisonError::into_inner) {
            return Ok(client.clone());
        }

        let mut connection = self.connection.write().unwrap_or_else(PoisonError::into_inner);
        match Self::open(&self.socket_path, self.timeout_secs) {
            Ok(client) => {
                info!("✓ Docker socket {} became accessible", self.socket_path.display());
                *connection = Connection::Ready(client.clone());
                Ok(client)
            }
            Err(reason) => {
                *connection = Connection::Unavailable(reason.clone());
                Err(RuntimeError::Unavailable(reason))
            }
        }
    }

    fn listed_from_engine(summary: EngineSummary) -> ListedContainer {
        let id = ContainerId::new(summary.id.clone().unwrap_or_default());
        let name = ContainerSummary::display_name(summary.names.as_deref(), &id);
        let image = summary.image.clone().unwrap_or_else(|| "unknown".to_string());
        let status = ContainerStatus::from_engine(summary.state.as_deref());
        let created_at = summary
            .created
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default();

        let native = serde_json::to_value(&summary).unwrap_or_else(|e| {
            warn!("Could not re-encode listing entry for {}: {}", id, e);
            serde_json::Value::Null
        });

        ListedContainer::new(ContainerSummary::new(id, name, image, status, created_at)).with_native(native)
    }
}

/// Map a bollard error onto the runtime taxonomy. A 404 names a missing
/// container only when the call was about one.
fn classify(err: BollardError, id: Option<&ContainerId>) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => match id {
            Some(id) => RuntimeError::ContainerNotFound(id.clone()),
            None => RuntimeError::Engine(message),
        },
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::Engine(message),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ContainerRuntime for DockerAdapter {
    async fn list_containers(&self, include_stopped: bool) -> RuntimeResult<Vec<ListedContainer>> {
        let client = self.client()?;
        let options = Some(ListContainersOptions::<String> {
            all: include_stopped,
            ..Default::default()
        });

        let summaries = client
            .list_containers(options)
            .await
            .map_err(|e| classify(e, None))?;
        debug!(count = summaries.len(), include_stopped, "listed containers");

        Ok(summaries.into_iter().map(Self::listed_from_engine).collect())
    }

    async fn stats(&self, id: &ContainerId) -> RuntimeResult<StatsReading> {
        let client = self.client()?;

        // one_shot = false: the engine takes two samples so precpu_stats is populated
        let mut stream = client.stats(
            id.as_str(),
            Some(StatsOptions {
                stream: false,
                one_shot: false,
            }),
        );

        let stats = stream
            .next()
            .await
            .ok_or_else(|| RuntimeError::EmptyStats(id.clone()))?
            .map_err(|e| classify(e, Some(id)))?;

        // bollard's re-encoding: fields it does not model are gone by now
        let native = serde_json::to_value(&stats)
            .map_err(|e| RuntimeError::Engine(format!("unreadable stats for {}: {}", id, e)))?;

        reading_from_native(native).map_err(|e| RuntimeError::Engine(format!("unreadable stats for {}: {}", id, e)))
    }

    async fn inspect(&self, id: &ContainerId) -> RuntimeResult<DiskDriver> {
        let client = self.client()?;
        let details = client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| classify(e, Some(id)))?;

        Ok(details
            .graph_driver
            .map(|driver| DiskDriver {
                name: driver.name,
                data: driver.data.into_iter().collect(),
            })
            .unwrap_or_default())
    }

    async fn ping(&self) -> RuntimeResult<()> {
        let client = self.client()?;
        client.ping().await.map(|_| ()).map_err(|e| classify(e, None))
    }
}
