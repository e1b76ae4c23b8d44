use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::ContainerRecord;
use crate::ports::StatsFeed;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shown whenever a fetch fails; the detailed cause goes to the log.
pub const FETCH_ERROR_BANNER: &str =
    "Unable to load container data. Make sure the Docker daemon is running and the dockpulse server is reachable.";

/// What to do when a tick fires while an earlier fetch is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Start another fetch anyway; whichever response arrives last is shown
    #[default]
    Tolerate,
    /// Skip the tick (and manual refreshes) until the pending fetch resolves
    SkipWhileInFlight,
}

/// Everything the presentation layer draws from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Last successfully fetched dataset
    pub containers: Vec<ContainerRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl DashboardState {
    /// The dataset on screen is older than the latest attempt
    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Failed,
    Skipped,
}

struct Inner {
    feed: Arc<dyn StatsFeed>,
    state: watch::Sender<DashboardState>,
    interval: Duration,
    overlap: OverlapPolicy,
    in_flight: AtomicUsize,
}

/// Fixed-interval polling loop feeding a [`DashboardState`].
///
/// Each tick launches its own fetch, so cadence does not depend on how long
/// the previous request took. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<Inner>,
}

impl Poller {
    pub fn new(feed: Arc<dyn StatsFeed>, interval: Duration, overlap: OverlapPolicy) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            inner: Arc::new(Inner {
                feed,
                state,
                interval,
                overlap,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.inner.state.borrow().clone()
    }

    /// Fetch once and apply the result.
    ///
    /// Start marks loading and clears the error. Success replaces the whole
    /// dataset; failure keeps the last good one and raises the banner.
    /// Concurrent refreshes apply in completion order.
    pub async fn refresh(&self) -> RefreshOutcome {
        let inner = &self.inner;

        match inner.overlap {
            OverlapPolicy::SkipWhileInFlight => {
                if inner
                    .in_flight
                    .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    debug!("previous fetch still in flight, skipping");
                    return RefreshOutcome::Skipped;
                }
            }
            OverlapPolicy::Tolerate => {
                inner.in_flight.fetch_add(1, Ordering::SeqCst);
            }
        }

        inner.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = inner.feed.fetch().await;
        let still_pending = inner.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;

        let outcome = match &result {
            Ok(records) => {
                debug!(count = records.len(), "dashboard data refreshed");
                RefreshOutcome::Updated
            }
            Err(e) => {
                warn!("Failed to fetch container data: {}", e);
                RefreshOutcome::Failed
            }
        };

        inner.state.send_modify(move |state| {
            state.loading = still_pending;
            match result {
                Ok(records) => {
                    state.containers = records;
                    state.error = None;
                    state.last_updated = Some(Utc::now());
                }
                Err(_) => state.error = Some(FETCH_ERROR_BANNER.to_string()),
            }
        });

        outcome
    }

    fn spawn_refresh(&self) {
        let poller = self.clone();
        tokio::spawn(async move {
            poller.refresh().await;
        });
    }

    /// Poll until `shutdown` resolves. The first fetch starts immediately;
    /// every message on `manual` triggers an extra fetch without cancelling
    /// any pending one.
    pub async fn run(self, mut manual: mpsc::Receiver<()>, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.inner.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        let mut manual_open = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.spawn_refresh();
                }
                request = manual.recv(), if manual_open => match request {
                    Some(()) => {
                        debug!("manual refresh requested");
                        self.spawn_refresh();
                    }
                    None => manual_open = false,
                },
                _ = &mut shutdown => break,
            }
        }
    }
}
