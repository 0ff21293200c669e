use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{Result, VictimApi};
use crate::models::{Victim, VictimInput};
use crate::sync::SyncSlot;

use super::collection::{self, Collection};
use super::{CollectionController, ControllerSettings};

pub struct VictimController {
    client: Arc<dyn VictimApi>,
    collection: Collection<Victim>,
    sync: SyncSlot,
}

impl VictimController {
    pub const RESOURCE: &'static str = "victims";

    pub fn new(client: Arc<dyn VictimApi>, settings: &ControllerSettings) -> Self {
        Self {
            client,
            collection: Collection::new(Self::RESOURCE, settings),
            sync: SyncSlot::new(),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Victim> {
        self.client.get_victim(id).await
    }

    pub async fn create(&self, input: &VictimInput) -> Result<Victim> {
        self.collection
            .mutate("create", || self.client.create_victim(input), collection::append)
            .await
    }

    pub async fn update(&self, id: &str, input: &VictimInput) -> Result<Victim> {
        self.collection
            .mutate("update", || self.client.update_victim(id, input), collection::replace)
            .await
    }

    pub async fn delete(&self, id: &str, case_id: &str) -> Result<()> {
        self.collection
            .mutate(
                "delete",
                || self.client.delete_victim(id, case_id),
                |view, _| collection::remove(view, id),
            )
            .await
    }

    pub async fn add_evidence(&self, victim_id: &str, evidence_id: &str) -> Result<Victim> {
        self.collection
            .mutate(
                "add_evidence",
                || self.client.add_evidence_to_victim(victim_id, evidence_id),
                collection::replace,
            )
            .await
    }

    pub async fn remove_evidence(&self, victim_id: &str, evidence_id: &str) -> Result<Victim> {
        self.collection
            .mutate(
                "remove_evidence",
                || self.client.remove_evidence_from_victim(victim_id, evidence_id),
                collection::replace,
            )
            .await
    }

    pub fn by_case(&self, case_id: &str) -> Vec<Victim> {
        self.collection
            .view()
            .into_iter()
            .filter(|v| v.case_id.as_deref() == Some(case_id))
            .collect()
    }
}

#[async_trait]
impl CollectionController for VictimController {
    type Item = Victim;

    fn collection(&self) -> &Collection<Victim> {
        &self.collection
    }

    fn sync_slot(&self) -> &SyncSlot {
        &self.sync
    }

    async fn fetch_remote(&self) -> Result<Vec<Victim>> {
        self.client.list_victims().await
    }
}
