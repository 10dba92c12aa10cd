//! Two-generation sampling cache with lazy, rate-limited refresh
//!
//! The cache holds the `previous` and `current` snapshot generations and
//! refreshes them through a `SnapshotSource` at most once per minimum
//! pause interval. Staleness is checked lazily on demand; there is no
//! background ticking task, so the cache has zero idle cost between
//! reads.

use crate::core::{AgentError, Generation, Snapshot, SnapshotSource};
use log::debug;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Cache state after at least one successful refresh. Both generations
/// alias the same snapshot right after the first refresh, so the first
/// incremental read of any metric is exactly zero.
struct Populated {
    previous: Arc<Snapshot>,
    current: Arc<Snapshot>,
    last_refresh: Instant,
}

/// The sampling cache for one monitored server.
///
/// All state sits behind a single mutex that is held across the whole
/// "check staleness, fetch, rotate" region. A burst of concurrent metric
/// evaluations therefore performs at most one outbound fetch per
/// interval, and every evaluation in the burst observes the identical
/// pair of generations.
pub struct SamplingCache {
    source: Arc<dyn SnapshotSource>,
    min_pause: Duration,
    state: Mutex<Option<Populated>>,
}

impl SamplingCache {
    pub fn new(source: Arc<dyn SnapshotSource>, min_pause: Duration) -> Self {
        Self {
            source,
            min_pause,
            state: Mutex::new(None),
        }
    }

    /// Refreshes the generations if the cache is stale at `now`.
    ///
    /// On fetch failure the cache state is left untouched and the last
    /// refresh time is NOT advanced, so the next call retries the fetch
    /// immediately instead of waiting out the interval.
    pub async fn ensure_fresh(&self, now: Instant) -> Result<(), AgentError> {
        let mut state = self.state.lock().await;

        let stale = match state.as_ref() {
            None => true,
            Some(populated) => now.duration_since(populated.last_refresh) > self.min_pause,
        };
        if !stale {
            return Ok(());
        }

        let snapshot = Arc::new(self.source.fetch().await.inspect_err(|_| {
            counter!("solr.cache.refresh_failures").increment(1);
        })?);

        counter!("solr.cache.refreshes").increment(1);
        match state.as_mut() {
            None => {
                debug!("first refresh, both generations share one snapshot");
                *state = Some(Populated {
                    previous: Arc::clone(&snapshot),
                    current: snapshot,
                    last_refresh: now,
                });
            }
            Some(populated) => {
                debug!("rotating snapshot generations");
                populated.previous = std::mem::replace(&mut populated.current, snapshot);
                populated.last_refresh = now;
            }
        }
        Ok(())
    }

    /// Returns the `(previous, current)` generation pair, consistently
    /// taken under one lock. Snapshots are immutable, so the returned
    /// handles stay valid across later refreshes.
    pub async fn generations(&self) -> Result<(Arc<Snapshot>, Arc<Snapshot>), AgentError> {
        let state = self.state.lock().await;
        match state.as_ref() {
            Some(populated) => Ok((
                Arc::clone(&populated.previous),
                Arc::clone(&populated.current),
            )),
            None => Err(AgentError::NoSnapshot),
        }
    }

    /// Looks up one named value in the requested generation. Never
    /// mutates state and never triggers a refresh; refreshing is the
    /// caller's responsibility via [`ensure_fresh`](Self::ensure_fresh).
    pub async fn value(&self, block: &str, key: &str, generation: Generation) -> Option<f64> {
        let (previous, current) = self.generations().await.ok()?;
        let snapshot = match generation {
            Generation::Previous => previous,
            Generation::Current => current,
        };
        snapshot.block(block)?.value(key)
    }
}
