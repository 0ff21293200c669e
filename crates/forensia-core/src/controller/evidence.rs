use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{EvidenceApi, Result};
use crate::models::{Evidence, EvidenceInput};
use crate::sync::SyncSlot;

use super::collection::{self, Collection};
use super::{CollectionController, ControllerSettings};

/// Shared evidence list for every screen of the app.
pub struct EvidenceController {
    client: Arc<dyn EvidenceApi>,
    collection: Collection<Evidence>,
    sync: SyncSlot,
}

impl EvidenceController {
    pub const RESOURCE: &'static str = "evidence";

    pub fn new(client: Arc<dyn EvidenceApi>, settings: &ControllerSettings) -> Self {
        Self {
            client,
            collection: Collection::new(Self::RESOURCE, settings),
            sync: SyncSlot::new(),
        }
    }

    /// Always a direct request; single records are never cached.
    pub async fn get_by_id(&self, id: &str) -> Result<Evidence> {
        self.client.get_evidence(id).await
    }

    pub async fn create(&self, input: &EvidenceInput) -> Result<Evidence> {
        self.collection
            .mutate("create", || self.client.create_evidence(input), collection::append)
            .await
    }

    pub async fn update(&self, id: &str, input: &EvidenceInput) -> Result<Evidence> {
        self.collection
            .mutate("update", || self.client.update_evidence(id, input), collection::replace)
            .await
    }

    /// `case_id` only travels to the service, which checks case ownership.
    pub async fn delete(&self, id: &str, case_id: &str) -> Result<()> {
        self.collection
            .mutate(
                "delete",
                || self.client.delete_evidence(id, case_id),
                |view, _| collection::remove(view, id),
            )
            .await
    }

    pub async fn add_image(&self, evidence_id: &str, image_id: &str) -> Result<Evidence> {
        self.collection
            .mutate(
                "add_image",
                || self.client.add_image_to_evidence(evidence_id, image_id),
                collection::replace,
            )
            .await
    }

    pub async fn remove_image(&self, evidence_id: &str, image_id: &str) -> Result<Evidence> {
        self.collection
            .mutate(
                "remove_image",
                || self.client.remove_image_from_evidence(evidence_id, image_id),
                collection::replace,
            )
            .await
    }

    /// Current view filtered to one case.
    pub fn by_case(&self, case_id: &str) -> Vec<Evidence> {
        self.collection
            .view()
            .into_iter()
            .filter(|e| e.belongs_to_case(case_id))
            .collect()
    }
}

#[async_trait]
impl CollectionController for EvidenceController {
    type Item = Evidence;

    fn collection(&self) -> &Collection<Evidence> {
        &self.collection
    }

    fn sync_slot(&self) -> &SyncSlot {
        &self.sync
    }

    async fn fetch_remote(&self) -> Result<Vec<Evidence>> {
        self.client.list_evidence().await
    }
}

// ============================================================================
// Tests
// ============================================================================
