use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::Result;
use crate::cache::{InFlightGuard, TtlCell};
use crate::models::Record;

use super::{ControllerSettings, ListResult, Snapshot};

struct CollectionState<T> {
    cell: TtlCell<Vec<T>>,
    view: Vec<T>,
    error: Option<String>,
    last_synced: Option<DateTime<Utc>>,
    /// Bumped by every applied mutation and cache clear; a fetch that started
    /// under an older epoch must not overwrite the view.
    epoch: u64,
}

/// Cache cell, in-flight guard and current view for one whole-collection
/// resource.
///
/// All state sits behind one lock that is never held across an `.await`, so
/// every transition is atomic with respect to other tasks.
pub struct Collection<T> {
    resource: &'static str,
    sync_interval: Duration,
    guard: InFlightGuard,
    state: Mutex<CollectionState<T>>,
}

impl<T: Record> Collection<T> {
    pub fn new(resource: &'static str, settings: &ControllerSettings) -> Self {
        Self {
            resource,
            sync_interval: settings.sync_interval,
            guard: InFlightGuard::new(),
            state: Mutex::new(CollectionState {
                cell: TtlCell::new(settings.ttl),
                view: Vec::new(),
                error: None,
                last_synced: None,
                epoch: 0,
            }),
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }

    pub fn is_fetching(&self) -> bool {
        self.guard.is_active()
    }

    /// Cache-first list.
    ///
    /// Fresh cache answers without I/O unless `force` is set. When another
    /// fetch is already running this returns the current view untouched
    /// instead of issuing a second request. Failures are recorded as the
    /// controller error and returned.
    pub async fn fetch<F, Fut>(&self, force: bool, fetcher: F) -> Result<ListResult<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        self.fetch_with(force, true, fetcher).await
    }

    /// Non-forced fetch for sync ticks. Failures are returned but never
    /// recorded, so they stay out of the UI error state.
    pub async fn fetch_background<F, Fut>(&self, fetcher: F) -> Result<ListResult<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        self.fetch_with(false, false, fetcher).await
    }

    async fn fetch_with<F, Fut>(
        &self,
        force: bool,
        record_errors: bool,
        fetcher: F,
    ) -> Result<ListResult<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if !force {
            let cached = self.state.lock().cell.fresh(Instant::now()).cloned();
            if let Some(data) = cached {
                debug!(resource = self.resource, count = data.len(), "Cache hit");
                return Ok(ListResult::cached(data));
            }
        }

        let Some(_permit) = self.guard.try_acquire() else {
            debug!(resource = self.resource, "Fetch already in flight, skipping");
            return Ok(ListResult::skipped(self.view()));
        };

        let started_epoch = {
            let mut state = self.state.lock();
            if record_errors {
                state.error = None;
            }
            state.epoch
        };

        let result = fetcher().await;

        let mut state = self.state.lock();
        match result {
            Ok(records) => {
                if state.epoch != started_epoch {
                    warn!(
                        resource = self.resource,
                        "Discarding fetch that started before a mutation or cache clear"
                    );
                    return Ok(ListResult::superseded(state.view.clone()));
                }
                state.cell.put(records.clone(), Instant::now());
                state.view = records.clone();
                state.last_synced = Some(Utc::now());
                debug!(resource = self.resource, count = records.len(), "Fetched from network");
                Ok(ListResult::network(records))
            }
            Err(e) => {
                if record_errors {
                    state.error = Some(e.message());
                }
                Err(e)
            }
        }
    }

    /// Run a mutation; on success invalidate the cache and patch the view.
    /// On failure nothing is touched and the error is returned as is.
    pub async fn mutate<R, F, Fut, P>(&self, op: &'static str, call: F, patch: P) -> Result<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
        P: FnOnce(&mut Vec<T>, &R),
    {
        let outcome = match call().await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(resource = self.resource, op, error = %e, "Mutation failed");
                return Err(e);
            }
        };

        debug!(resource = self.resource, op, "Mutation applied, cache invalidated");
        let mut state = self.state.lock();
        state.cell.invalidate();
        state.epoch += 1;
        patch(&mut state.view, &outcome);
        Ok(outcome)
    }

    pub fn view(&self) -> Vec<T> {
        self.state.lock().view.clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.state.lock();
        Snapshot {
            data: state.view.clone(),
            // The permit is the loading flag, so a dropped fetch cannot leave it stuck
            loading: self.guard.is_active(),
            error: state.error.clone(),
            last_synced: state.last_synced,
        }
    }

    pub fn has_cache(&self) -> bool {
        !self.state.lock().cell.is_empty()
    }

    /// Invalidate the cached payload. The epoch moves too, so a fetch already
    /// in flight cannot write its payload back.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.cell.invalidate();
        state.epoch += 1;
        debug!(resource = self.resource, "Cache cleared");
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }
}

// ============================================================================
// View patching
// ============================================================================

pub fn append<T: Record>(view: &mut Vec<T>, record: &T) {
    // A concurrent fetch may already have delivered it
    if !view.iter().any(|r| r.id() == record.id()) {
        view.push(record.clone());
    }
}

/// Replace by id; records not yet in the view are appended.
pub fn replace<T: Record>(view: &mut Vec<T>, record: &T) {
    match view.iter_mut().find(|r| r.id() == record.id()) {
        Some(slot) => *slot = record.clone(),
        None => view.push(record.clone()),
    }
}

pub fn remove<T: Record>(view: &mut Vec<T>, id: &str) {
    view.retain(|r| r.id() != id);
}
