//! In-memory snapshot of the sheet and the background poller that keeps it
//! fresh.
//!
//! The snapshot is replaced wholesale by [`SyncCache::refresh`] and never
//! edited in place. Writers do not touch it; their effect shows up on the
//! next refresh.
//!
//! Refreshes are not deduplicated. Two overlapping refreshes both run to
//! completion and whichever finishes last wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use pkl_monitor_core::VendorRecord;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::sheets::RecordSource;

/// The cached record set as of the last successful fetch.
#[derive(Debug, Clone, Default)]
pub struct SyncSnapshot {
    pub records: Arc<Vec<VendorRecord>>,
    /// `None` until the first successful fetch.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Set when the most recent fetch failed; cleared by the next success.
    pub has_error: bool,
}

/// What a single refresh did to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot replaced with this many records.
    Replaced(usize),
    /// The source returned no rows; snapshot kept.
    Empty,
    /// The fetch failed; snapshot kept and flagged.
    Failed,
}

/// Sync status as reported to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub last_synced_at: Option<DateTime<Utc>>,
    pub has_error: bool,
    /// A foreground refresh is in flight.
    pub syncing: bool,
    pub records: usize,
}

/// Shared cache over a [`RecordSource`].
pub struct SyncCache<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    source: S,
    snapshot: RwLock<SyncSnapshot>,
    foreground: AtomicUsize,
}

impl<S> Clone for SyncCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for SyncCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCache")
            .field("foreground", &self.inner.foreground.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Counts a foreground refresh for as long as it is alive.
struct ForegroundGuard<'a>(&'a AtomicUsize);

impl<'a> ForegroundGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: RecordSource> SyncCache<S> {
    /// Create an empty cache.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::seeded(source, Vec::new())
    }

    /// Create a cache that starts out with `records`.
    ///
    /// The seed does not count as a sync, so `last_synced_at` stays `None`.
    #[must_use]
    pub fn seeded(source: S, records: Vec<VendorRecord>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                snapshot: RwLock::new(SyncSnapshot {
                    records: Arc::new(records),
                    last_synced_at: None,
                    has_error: false,
                }),
                foreground: AtomicUsize::new(0),
            }),
        }
    }

    /// Current snapshot. Cheap: the record list is shared.
    pub async fn snapshot(&self) -> SyncSnapshot {
        self.inner.snapshot.read().await.clone()
    }

    /// Whether a foreground refresh is running.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.inner.foreground.load(Ordering::SeqCst) > 0
    }

    /// Status summary for the dashboard.
    pub async fn status(&self) -> SyncStatus {
        let snapshot = self.inner.snapshot.read().await;
        SyncStatus {
            last_synced_at: snapshot.last_synced_at,
            has_error: snapshot.has_error,
            syncing: self.is_syncing(),
            records: snapshot.records.len(),
        }
    }

    /// Fetch from the source and update the snapshot.
    ///
    /// A non-empty result replaces the records, stamps the sync time, and
    /// clears the error flag. An empty result is ignored. A failure sets
    /// the error flag and keeps the last good records. `silent` only
    /// controls whether the refresh counts towards [`Self::is_syncing`].
    pub async fn refresh(&self, silent: bool) -> RefreshOutcome {
        let _guard = (!silent).then(|| ForegroundGuard::enter(&self.inner.foreground));

        match self.inner.source.fetch_all().await {
            Ok(records) if records.is_empty() => {
                debug!(silent, "Source returned no records, keeping snapshot");
                RefreshOutcome::Empty
            }
            Ok(records) => {
                let count = records.len();
                let mut snapshot = self.inner.snapshot.write().await;
                snapshot.records = Arc::new(records);
                snapshot.last_synced_at = Some(Utc::now());
                snapshot.has_error = false;
                drop(snapshot);
                debug!(records = count, silent, "Snapshot replaced");
                RefreshOutcome::Replaced(count)
            }
            Err(e) => {
                warn!(error = %e, silent, "Sheet fetch failed, serving stale snapshot");
                self.inner.snapshot.write().await.has_error = true;
                RefreshOutcome::Failed
            }
        }
    }
}

/// Background task refreshing a [`SyncCache`] on a fixed period.
///
/// The first refresh runs immediately in the foreground; later ones are
/// silent. Each tick spawns its own refresh, so a slow source can have
/// several in flight. Dropping the poller stops it.
#[derive(Debug)]
pub struct SyncPoller {
    handle: JoinHandle<()>,
}

impl SyncPoller {
    /// Start polling `cache` every `period`.
    #[must_use]
    pub fn spawn<S: RecordSource>(cache: SyncCache<S>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut silent = false;

            loop {
                ticker.tick().await;
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache.refresh(silent).await;
                });
                silent = true;
            }
        });

        info!(period_secs = period.as_secs_f64(), "Sync poller started");
        Self { handle }
    }

    /// Stop polling. Refreshes already in flight finish on their own.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.handle.abort();
        info!("Sync poller stopped");
    }
}
