//! Per-resource controllers: cached collections kept in sync with the service.
//!
//! Each resource type (evidence, odontograms, reports, victims, evidence
//! images) has one dedicated controller. A controller owns a TTL cache, an
//! in-flight guard, the current view handed to the UI and an optional
//! background sync loop. Mutations go to the service first and then
//! invalidate the cache and patch the view in place.
//!
//! Controllers are meant to be shared: build them once (see
//! [`Controllers`](crate::Controllers)) and hand out `Arc`s, so every screen
//! sees the same cache and the same in-flight fetch.

pub mod collection;
pub mod evidence;
pub mod evidence_image;
pub mod odontogram;
pub mod report;
pub mod victim;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::Result;
use crate::cache::{age_display, DEFAULT_TTL};
use crate::models::Record;
use crate::sync::{self, SyncSlot, DEFAULT_SYNC_INTERVAL};

pub use collection::Collection;
pub use evidence::EvidenceController;
pub use evidence_image::EvidenceImageController;
pub use odontogram::OdontogramController;
pub use report::ReportController;
pub use victim::VictimController;

/// Timing knobs shared by every controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub ttl: Duration,
    pub sync_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Where the data returned by a list call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// Fresh cache, no request made
    Cache,
    /// Fetched from the service; cache and view updated
    Network,
    /// Another fetch for the same key was in flight; current view returned as is
    Skipped,
    /// Fetched, but a mutation or cache clear landed meanwhile so the
    /// payload was dropped
    Superseded,
    /// No key to fetch for (keyed resources only)
    MissingKey,
}

#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub data: Vec<T>,
    pub source: ListSource,
}

impl<T> ListResult<T> {
    pub fn cached(data: Vec<T>) -> Self {
        Self {
            data,
            source: ListSource::Cache,
        }
    }

    pub fn network(data: Vec<T>) -> Self {
        Self {
            data,
            source: ListSource::Network,
        }
    }

    pub fn skipped(data: Vec<T>) -> Self {
        Self {
            data,
            source: ListSource::Skipped,
        }
    }

    pub fn superseded(data: Vec<T>) -> Self {
        Self {
            data,
            source: ListSource::Superseded,
        }
    }

    pub fn missing_key() -> Self {
        Self {
            data: Vec::new(),
            source: ListSource::MissingKey,
        }
    }

    pub fn hit_network(&self) -> bool {
        matches!(self.source, ListSource::Network | ListSource::Superseded)
    }
}

/// What a UI binds to: the current view plus fetch status.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_synced: Option<DateTime<Utc>>,
}

impl<T> Snapshot<T> {
    pub fn last_synced_display(&self) -> String {
        self.last_synced
            .map(age_display)
            .unwrap_or_else(|| "never".to_string())
    }
}

/// Shared surface of the whole-collection controllers.
///
/// Implementors only provide their collection, their sync slot and the remote
/// list call; listing, sync and cache control come from the default methods.
#[async_trait]
pub trait CollectionController: Send + Sync + Sized + 'static {
    type Item: Record;

    fn collection(&self) -> &Collection<Self::Item>;

    fn sync_slot(&self) -> &SyncSlot;

    /// The remote list call, uncached.
    async fn fetch_remote(&self) -> Result<Vec<Self::Item>>;

    fn resource(&self) -> &'static str {
        self.collection().resource()
    }

    async fn list(&self, force_refresh: bool) -> Result<ListResult<Self::Item>> {
        self.collection()
            .fetch(force_refresh, || self.fetch_remote())
            .await
    }

    fn data(&self) -> Vec<Self::Item> {
        self.collection().view()
    }

    fn snapshot(&self) -> Snapshot<Self::Item> {
        self.collection().snapshot()
    }

    /// Start polling `list(false)`. Any loop already running is cancelled first.
    fn start_sync(self: &Arc<Self>) {
        let period = self.collection().sync_interval();
        let resource = self.resource();
        self.sync_slot().restart(|| {
            sync::spawn(self, period, resource, |controller: Arc<Self>| async move {
                controller
                    .collection()
                    .fetch_background(|| controller.fetch_remote())
                    .await
                    .map(|_| ())
            })
        });
    }

    fn stop_sync(&self) {
        self.sync_slot().stop();
    }

    fn is_syncing(&self) -> bool {
        self.sync_slot().is_running()
    }

    fn clear_cache(&self) {
        self.collection().clear_cache();
    }

    fn clear_error(&self) {
        self.collection().clear_error();
    }
}
