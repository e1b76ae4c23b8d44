use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::domain::{normalize, ContainerId, ContainerRecord, ContainerSummary};
use crate::ports::{ContainerRuntime, RuntimeError, RuntimeResult};

/// A container left out of an aggregate because its fetch failed
#[derive(Debug, Clone, PartialEq)]
pub struct Omission {
    pub id: ContainerId,
    pub name: String,
    pub reason: RuntimeError,
}

/// Records in list order plus whatever had to be skipped
#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub records: Vec<ContainerRecord>,
    pub omitted: Vec<Omission>,
}

/// Request-scoped operations over the container runtime.
///
/// Holds no state between calls besides the runtime handle.
pub struct AggregationService {
    runtime: Arc<dyn ContainerRuntime>,
    timeout: Duration,
}

impl AggregationService {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, timeout: Duration) -> Self {
        Self { runtime, timeout }
    }

    /// Bound applied to a whole request and to each per-container fetch
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Engine-native listing of every container, stopped ones included
    pub async fn list_all(&self) -> RuntimeResult<Vec<serde_json::Value>> {
        let listed = self.runtime.list_containers(true).await?;
        Ok(listed.into_iter().map(|c| c.native).collect())
    }

    /// Engine-native single-shot stats document for one container
    pub async fn container_stats(&self, id: &ContainerId) -> RuntimeResult<serde_json::Value> {
        let reading = self.runtime.stats(id).await?;
        Ok(reading.native)
    }

    /// Normalized records for every listed (running) container.
    ///
    /// One deadline, `timeout` from the call, bounds the listing and every
    /// per-container fetch. Fetches run concurrently; a container whose stats
    /// or inspect call fails or misses the deadline is omitted and logged
    /// instead of failing the whole aggregate. Output order follows the listing.
    pub async fn collect(&self) -> RuntimeResult<AggregateOutcome> {
        let deadline = Instant::now() + self.timeout;

        let listed = timeout_at(deadline, self.runtime.list_containers(false))
            .await
            .unwrap_or(Err(RuntimeError::Timeout(self.timeout)))?;
        debug!(count = listed.len(), "collecting container stats");

        let results = join_all(listed.into_iter().map(|c| self.collect_one(c.summary, deadline))).await;

        let mut records = Vec::with_capacity(results.len());
        let mut omitted = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(omission) => {
                    warn!(
                        container = %omission.id,
                        name = %omission.name,
                        error = %omission.reason,
                        "omitting container from aggregate"
                    );
                    omitted.push(omission);
                }
            }
        }

        Ok(AggregateOutcome { records, omitted })
    }

    async fn collect_one(&self, summary: ContainerSummary, deadline: Instant) -> Result<ContainerRecord, Omission> {
        let id = summary.id.clone();
        let fetch = async { tokio::try_join!(self.runtime.stats(&id), self.runtime.inspect(&id)) };

        let fetched = timeout_at(deadline, fetch)
            .await
            .unwrap_or(Err(RuntimeError::Timeout(self.timeout)));

        match fetched {
            Ok((reading, disk)) => {
                let metrics = normalize(&reading.current, &reading.previous);
                Ok(ContainerRecord::assemble(summary, metrics, reading, disk))
            }
            Err(reason) => Err(Omission {
                id,
                name: summary.name,
                reason,
            }),
        }
    }

    /// Ping the engine within the request timeout
    pub async fn health(&self) -> RuntimeResult<()> {
        match tokio::time::timeout(self.timeout, self.runtime.ping()).await {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::{reading, ScriptedRuntime};
    use crate::domain::{round2, ContainerStatus};

    fn service(runtime: ScriptedRuntime) -> AggregationService {
        AggregationService::new(Arc::new(runtime), Duration::from_secs(5))
    }

    fn names(outcome: &AggregateOutcome) -> Vec<&str> {
        outcome.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[tokio::test]
    async fn records_follow_listing_order() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_container("c2", "api", ContainerStatus::Running, reading(20, 1, 2))
            .with_container("c3", "web", ContainerStatus::Running, reading(30, 1, 2))
            // slowest container listed first must still come first
            .with_delay("c1", Duration::from_millis(50));

        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["db", "api", "web"]);
        assert!(outcome.omitted.is_empty());
    }

    #[tokio::test]
    async fn records_carry_normalized_metrics() {
        let runtime = ScriptedRuntime::new().with_container(
            "c1",
            "web",
            ContainerStatus::Running,
            reading(25, 50_000_000, 100_000_000),
        );

        let outcome = service(runtime).collect().await.unwrap();
        let record = &outcome.records[0];
        assert_eq!(round2(record.cpu), 25.0);
        assert_eq!(record.memory.percentage.map(round2), Some(50.0));
        assert_eq!(record.disk.as_ref().map(|d| d.name.as_str()), Some("overlay2"));
    }

    #[tokio::test]
    async fn one_failing_container_is_omitted() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_failing_container("c2", "flaky", RuntimeError::ContainerNotFound(ContainerId::new("c2")))
            .with_container("c3", "web", ContainerStatus::Running, reading(30, 1, 2));

        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["db", "web"]);
        assert_eq!(outcome.omitted.len(), 1);
        assert_eq!(outcome.omitted[0].name, "flaky");
        assert_eq!(
            outcome.omitted[0].reason,
            RuntimeError::ContainerNotFound(ContainerId::new("c2"))
        );
    }

    #[tokio::test]
    async fn stopped_containers_are_not_aggregated() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_container("c2", "old", ContainerStatus::Exited, reading(0, 0, 0));

        let svc = service(runtime);
        let outcome = svc.collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["db"]);

        // the plain listing still includes it
        let all = svc.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1]["State"], "exited");
    }

    #[tokio::test]
    async fn list_failure_fails_the_aggregate() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_list_error(RuntimeError::Unavailable("socket gone".to_string()));

        let err = service(runtime).collect().await.unwrap_err();
        assert_eq!(err, RuntimeError::Unavailable("socket gone".to_string()));
    }

    #[tokio::test]
    async fn repeated_collection_is_idempotent() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_container("c2", "web", ContainerStatus::Running, reading(20, 1, 2));

        let svc = service(runtime);
        let first = svc.collect().await.unwrap();
        let second = svc.collect().await.unwrap();
        assert_eq!(first.records, second.records);
    }

    #[tokio::test(start_paused = true)]
    async fn per_container_fetches_run_concurrently() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "a", ContainerStatus::Running, reading(1, 1, 2))
            .with_container("c2", "b", ContainerStatus::Running, reading(1, 1, 2))
            .with_container("c3", "c", ContainerStatus::Running, reading(1, 1, 2))
            .with_delay("c1", Duration::from_secs(1))
            .with_delay("c2", Duration::from_secs(1))
            .with_delay("c3", Duration::from_secs(1));

        let started = tokio::time::Instant::now();
        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_container_times_out_and_is_omitted() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "fast", ContainerStatus::Running, reading(1, 1, 2))
            .with_container("c2", "stuck", ContainerStatus::Running, reading(1, 1, 2))
            .with_delay("c2", Duration::from_secs(60));

        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["fast"]);
        assert_eq!(outcome.omitted[0].reason, RuntimeError::Timeout(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_listing_shares_the_deadline_with_container_fetches() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "fast", ContainerStatus::Running, reading(1, 1, 2))
            .with_container("c2", "stuck", ContainerStatus::Running, reading(1, 1, 2))
            .with_list_delay(Duration::from_secs(3))
            .with_delay("c2", Duration::from_secs(600));

        let started = Instant::now();
        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["fast"]);
        assert_eq!(outcome.omitted[0].name, "stuck");
        assert!(started.elapsed() <= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn listing_past_the_deadline_fails_the_aggregate() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(1, 1, 2))
            .with_list_delay(Duration::from_secs(30));

        let err = service(runtime).collect().await.unwrap_err();
        assert_eq!(err, RuntimeError::Timeout(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn paused_containers_are_aggregated() {
        let runtime = ScriptedRuntime::new()
            .with_container("c1", "db", ContainerStatus::Running, reading(10, 1, 2))
            .with_container("c2", "held", ContainerStatus::Paused, reading(0, 1, 2))
            .with_container("c3", "old", ContainerStatus::Exited, reading(0, 0, 0));

        let outcome = service(runtime).collect().await.unwrap();
        assert_eq!(names(&outcome), vec!["db", "held"]);
    }

    #[tokio::test]
    async fn container_stats_passes_native_document_through() {
        let runtime = ScriptedRuntime::new().with_container(
            "c1",
            "db",
            ContainerStatus::Running,
            reading(10, 123, 456),
        );

        let doc = service(runtime).container_stats(&ContainerId::new("c1")).await.unwrap();
        assert_eq!(doc["memory_stats"]["usage"], 123);
    }

    #[tokio::test]
    async fn container_stats_for_unknown_id_is_not_found() {
        let svc = service(ScriptedRuntime::new());
        let err = svc.container_stats(&ContainerId::new("nope")).await.unwrap_err();
        assert_eq!(err, RuntimeError::ContainerNotFound(ContainerId::new("nope")));
    }
}
