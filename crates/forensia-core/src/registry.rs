//! One shared controller per resource type.
//!
//! Build a `Controllers` once at startup and pass it (or the individual
//! `Arc`s) to whoever needs data. Every consumer of a resource then shares the
//! same cache, in-flight guard and sync loop.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, ResourceClient};
use crate::controller::{
    CollectionController, ControllerSettings, EvidenceController, EvidenceImageController,
    OdontogramController, ReportController, VictimController,
};

#[derive(Clone)]
pub struct Controllers {
    pub evidence: Arc<EvidenceController>,
    pub odontograms: Arc<OdontogramController>,
    pub reports: Arc<ReportController>,
    pub victims: Arc<VictimController>,
    pub images: Arc<EvidenceImageController>,
}

impl Controllers {
    pub fn new<C: ResourceClient + 'static>(client: Arc<C>, settings: &ControllerSettings) -> Self {
        Self {
            evidence: Arc::new(EvidenceController::new(client.clone(), settings)),
            odontograms: Arc::new(OdontogramController::new(client.clone(), settings)),
            reports: Arc::new(ReportController::new(client.clone(), settings)),
            victims: Arc::new(VictimController::new(client.clone(), settings)),
            images: Arc::new(EvidenceImageController::new(client, settings)),
        }
    }

    /// List every whole-collection resource concurrently. Returns the
    /// failures by resource name; successes are already in the views.
    pub async fn refresh_all(&self, force_refresh: bool) -> Vec<(&'static str, ApiError)> {
        let (evidence, odontograms, reports, victims) = tokio::join!(
            self.evidence.list(force_refresh),
            self.odontograms.list(force_refresh),
            self.reports.list(force_refresh),
            self.victims.list(force_refresh),
        );

        let mut failures = Vec::new();
        let outcomes = [
            (EvidenceController::RESOURCE, evidence.err()),
            (OdontogramController::RESOURCE, odontograms.err()),
            (ReportController::RESOURCE, reports.err()),
            (VictimController::RESOURCE, victims.err()),
        ];
        for (resource, error) in outcomes {
            if let Some(e) = error {
                warn!(resource, error = %e, "Refresh failed");
                failures.push((resource, e));
            }
        }
        failures
    }

    /// Start the sync loop of every whole-collection controller. Image sync
    /// needs an evidence id and is started on its own.
    pub fn start_all_sync(&self) {
        self.evidence.start_sync();
        self.odontograms.start_sync();
        self.reports.start_sync();
        self.victims.start_sync();
        info!("Background sync started for all collections");
    }

    pub fn stop_all_sync(&self) {
        self.evidence.stop_sync();
        self.odontograms.stop_sync();
        self.reports.stop_sync();
        self.victims.stop_sync();
        self.images.stop_sync();
    }

    /// Drop every cached payload, e.g. after switching user.
    pub fn clear_all_caches(&self) {
        self.evidence.clear_cache();
        self.odontograms.clear_cache();
        self.reports.clear_cache();
        self.victims.clear_cache();
        self.images.clear_all_cache();
    }
}
