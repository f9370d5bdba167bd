//! Read side: the most recently fetched leaderboard.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::events::{Event, EventBus};
use crate::store::{Record, RemoteStore, StoreError};

/// Holds the latest snapshot of the remote records and a fetch-in-flight flag.
pub struct Leaderboard {
    store: Arc<dyn RemoteStore>,
    events: Arc<EventBus>,
    snapshot: RwLock<Arc<Vec<Record>>>,
    fetching: AtomicBool,
    refreshes: AtomicUsize,
}

/// Clears the fetching flag however the refresh ends.
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Leaderboard {
    pub fn new(store: Arc<dyn RemoteStore>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            events,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            fetching: AtomicBool::new(false),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Re-query the store and replace the snapshot.
    ///
    /// On failure the previous snapshot stays, including when `list` panics.
    /// An unconfigured store has no records, so the snapshot becomes empty.
    pub async fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.fetching.store(true, Ordering::SeqCst);
        let _guard = FetchGuard(&self.fetching);
        self.events.emit(Event::RefreshStarted);

        let listed = match AssertUnwindSafe(self.store.list()).catch_unwind().await {
            Ok(listed) => listed,
            Err(_) => {
                error!("leaderboard fetch panicked");
                Err(StoreError::Unexpected("list panicked".to_string()))
            }
        };

        let (records, ok) = match listed {
            Ok(records) => {
                let count = records.len();
                self.replace(records);
                debug!(count, "leaderboard refreshed");
                (count, true)
            }
            Err(StoreError::NotConfigured) => {
                self.replace(Vec::new());
                (0, true)
            }
            Err(e) => {
                warn!("leaderboard refresh failed, keeping previous snapshot: {e}");
                (self.snapshot().len(), false)
            }
        };

        self.events.emit(Event::RefreshFinished { records, ok });
    }

    fn replace(&self, records: Vec<Record>) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(records);
    }

    /// The current snapshot, newest first.
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// How many refreshes have been started.
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}
