//! Images of an evidence item, cached per parent evidence id.
//!
//! Same contract as the whole-collection controllers, but the cache, the
//! in-flight guard, the view and the mutation epoch are all partitioned by the
//! owning evidence id. Work on one evidence item never touches another's
//! images.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::{ApiError, EvidenceImageApi, Result};
use crate::cache::{KeyedInFlightGuard, KeyedTtlCache};
use crate::models::{EvidenceImage, EvidenceImageInput};
use crate::sync::{self, SyncSlot};

use super::collection;
use super::{ControllerSettings, ListResult, Snapshot};

struct ImageState {
    cache: KeyedTtlCache<Vec<EvidenceImage>>,
    views: HashMap<String, Vec<EvidenceImage>>,
    epochs: HashMap<String, u64>,
    /// Bumped when every key is dropped at once, so fetches started before
    /// that cannot match a reset per-key epoch.
    generation: u64,
    error: Option<String>,
    last_synced: Option<DateTime<Utc>>,
}

impl ImageState {
    fn stamp(&self, key: &str) -> (u64, u64) {
        (
            self.generation,
            self.epochs.get(key).copied().unwrap_or(0),
        )
    }

    fn bump(&mut self, key: &str) {
        *self.epochs.entry(key.to_string()).or_insert(0) += 1;
    }

    fn view(&self, key: &str) -> Vec<EvidenceImage> {
        self.views.get(key).cloned().unwrap_or_default()
    }
}

pub struct EvidenceImageController {
    client: Arc<dyn EvidenceImageApi>,
    settings: ControllerSettings,
    guard: KeyedInFlightGuard,
    state: Mutex<ImageState>,
    sync: SyncSlot,
}

/// Blank ids never reach the service.
fn usable_key(evidence_id: &str) -> Option<&str> {
    let key = evidence_id.trim();
    (!key.is_empty()).then_some(key)
}

fn require_key(evidence_id: &str) -> Result<&str> {
    usable_key(evidence_id).ok_or(ApiError::MissingKey("evidence id"))
}

impl EvidenceImageController {
    pub const RESOURCE: &'static str = "evidence_images";

    pub fn new(client: Arc<dyn EvidenceImageApi>, settings: &ControllerSettings) -> Self {
        Self {
            client,
            settings: *settings,
            guard: KeyedInFlightGuard::new(),
            state: Mutex::new(ImageState {
                cache: KeyedTtlCache::new(settings.ttl),
                views: HashMap::new(),
                epochs: HashMap::new(),
                generation: 0,
                error: None,
                last_synced: None,
            }),
            sync: SyncSlot::new(),
        }
    }

    /// Cache-first list of one evidence item's images.
    pub async fn list(
        &self,
        evidence_id: &str,
        force_refresh: bool,
    ) -> Result<ListResult<EvidenceImage>> {
        self.fetch(evidence_id, force_refresh, true).await
    }

    async fn fetch(
        &self,
        evidence_id: &str,
        force: bool,
        record_errors: bool,
    ) -> Result<ListResult<EvidenceImage>> {
        let Some(key) = usable_key(evidence_id) else {
            debug!(resource = Self::RESOURCE, "No evidence id, nothing to fetch");
            return Ok(ListResult::missing_key());
        };

        if !force {
            let cached = self.state.lock().cache.fresh(key, Instant::now()).cloned();
            if let Some(data) = cached {
                debug!(resource = Self::RESOURCE, key, count = data.len(), "Cache hit");
                return Ok(ListResult::cached(data));
            }
        }

        let Some(_permit) = self.guard.try_acquire(key) else {
            debug!(resource = Self::RESOURCE, key, "Fetch already in flight, skipping");
            return Ok(ListResult::skipped(self.images(key)));
        };

        let started = {
            let mut state = self.state.lock();
            if record_errors {
                state.error = None;
            }
            state.stamp(key)
        };

        let result = self.client.list_images(key).await;

        let mut state = self.state.lock();
        match result {
            Ok(images) => {
                if state.stamp(key) != started {
                    warn!(
                        resource = Self::RESOURCE,
                        key, "Discarding fetch that started before a mutation or cache clear"
                    );
                    return Ok(ListResult::superseded(state.view(key)));
                }
                state.cache.put(key, images.clone(), Instant::now());
                state.views.insert(key.to_string(), images.clone());
                state.last_synced = Some(Utc::now());
                debug!(
                    resource = Self::RESOURCE,
                    key,
                    count = images.len(),
                    "Fetched from network"
                );
                Ok(ListResult::network(images))
            }
            Err(e) => {
                if record_errors {
                    state.error = Some(e.message());
                }
                Err(e)
            }
        }
    }

    /// Warm the cache for several evidence items at once. Each id goes
    /// through the normal cache and guard checks.
    pub async fn prefetch(
        &self,
        evidence_ids: &[String],
    ) -> Vec<Result<ListResult<EvidenceImage>>> {
        join_all(evidence_ids.iter().map(|id| self.list(id, false))).await
    }

    /// Current view for one evidence item.
    pub fn images(&self, evidence_id: &str) -> Vec<EvidenceImage> {
        self.state.lock().view(evidence_id.trim())
    }

    pub fn snapshot(&self, evidence_id: &str) -> Snapshot<EvidenceImage> {
        let key = evidence_id.trim();
        let state = self.state.lock();
        Snapshot {
            data: state.view(key),
            loading: self.guard.is_active(key),
            error: state.error.clone(),
            last_synced: state.last_synced,
        }
    }

    pub fn has_cache(&self, evidence_id: &str) -> bool {
        self.state.lock().cache.contains(evidence_id.trim())
    }

    pub async fn get_by_id(&self, evidence_id: &str, image_id: &str) -> Result<EvidenceImage> {
        let key = require_key(evidence_id)?;
        self.client.get_image(key, image_id).await
    }

    /// Mutations need an evidence id too; a blank one fails with
    /// `ApiError::MissingKey` before any request is made.
    pub async fn create(
        &self,
        evidence_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        let key = require_key(evidence_id)?;
        self.mutate(
            key,
            "create",
            || self.client.create_image(key, input),
            collection::append,
        )
        .await
    }

    pub async fn update(
        &self,
        evidence_id: &str,
        image_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        let key = require_key(evidence_id)?;
        self.mutate(
            key,
            "update",
            || self.client.update_image(key, image_id, input),
            collection::replace,
        )
        .await
    }

    pub async fn delete(&self, evidence_id: &str, image_id: &str) -> Result<()> {
        let key = require_key(evidence_id)?;
        self.mutate(
            key,
            "delete",
            || self.client.delete_image(key, image_id),
            |view, _| collection::remove(view, image_id),
        )
        .await
    }

    /// Remote call first; on success only `key`'s entry is invalidated and
    /// its view patched. `key` is already trimmed.
    async fn mutate<R, F, Fut, P>(
        &self,
        key: &str,
        op: &'static str,
        call: F,
        patch: P,
    ) -> Result<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R>>,
        P: FnOnce(&mut Vec<EvidenceImage>, &R),
    {
        let outcome = match call().await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(resource = Self::RESOURCE, key, op, error = %e, "Mutation failed");
                return Err(e);
            }
        };

        debug!(resource = Self::RESOURCE, key, op, "Mutation applied, cache invalidated");
        let mut state = self.state.lock();
        state.cache.invalidate(key);
        state.bump(key);
        patch(state.views.entry(key.to_string()).or_default(), &outcome);
        Ok(outcome)
    }

    /// Poll one evidence item's images. Replaces any loop already running,
    /// whichever evidence id it was watching.
    pub fn start_sync(self: &Arc<Self>, evidence_id: &str) {
        let Some(key) = usable_key(evidence_id) else {
            debug!(resource = Self::RESOURCE, "No evidence id, sync not started");
            return;
        };
        let key = key.to_string();
        let period = self.settings.sync_interval;
        self.sync.restart(|| {
            sync::spawn(self, period, Self::RESOURCE, move |controller: Arc<Self>| {
                let key = key.clone();
                async move { controller.fetch(&key, false, false).await.map(|_| ()) }
            })
        });
    }

    pub fn stop_sync(&self) {
        self.sync.stop();
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_running()
    }

    /// Drop one evidence item's cached images. The view is kept; a fetch
    /// already in flight for that id will not repopulate the cache.
    pub fn clear_cache(&self, evidence_id: &str) {
        let key = evidence_id.trim();
        let mut state = self.state.lock();
        state.cache.invalidate(key);
        state.bump(key);
        debug!(resource = Self::RESOURCE, key, "Cache cleared");
    }

    /// Forget every evidence item: cache entries, views and epochs. In-flight
    /// fetches are discarded when they land.
    pub fn clear_all_cache(&self) {
        let mut state = self.state.lock();
        state.cache.clear();
        state.views.clear();
        state.epochs.clear();
        state.generation += 1;
        debug!(resource = Self::RESOURCE, "All image caches cleared");
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }
}
