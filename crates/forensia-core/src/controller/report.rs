use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ReportApi, Result};
use crate::models::{Report, ReportInput};
use crate::sync::SyncSlot;

use super::collection::{self, Collection};
use super::{CollectionController, ControllerSettings};

pub struct ReportController {
    client: Arc<dyn ReportApi>,
    collection: Collection<Report>,
    sync: SyncSlot,
}

impl ReportController {
    pub const RESOURCE: &'static str = "reports";

    pub fn new(client: Arc<dyn ReportApi>, settings: &ControllerSettings) -> Self {
        Self {
            client,
            collection: Collection::new(Self::RESOURCE, settings),
            sync: SyncSlot::new(),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Report> {
        self.client.get_report(id).await
    }

    pub async fn create(&self, input: &ReportInput) -> Result<Report> {
        self.collection
            .mutate("create", || self.client.create_report(input), collection::append)
            .await
    }

    pub async fn update(&self, id: &str, input: &ReportInput) -> Result<Report> {
        self.collection
            .mutate("update", || self.client.update_report(id, input), collection::replace)
            .await
    }

    /// `user_id` is the requesting user; the service rejects non-authors.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<()> {
        self.collection
            .mutate(
                "delete",
                || self.client.delete_report(id, user_id),
                |view, _| collection::remove(view, id),
            )
            .await
    }

    pub async fn add_evidence(&self, report_id: &str, evidence_id: &str) -> Result<Report> {
        self.collection
            .mutate(
                "add_evidence",
                || self.client.add_evidence_to_report(report_id, evidence_id),
                collection::replace,
            )
            .await
    }

    pub async fn remove_evidence(&self, report_id: &str, evidence_id: &str) -> Result<Report> {
        self.collection
            .mutate(
                "remove_evidence",
                || self.client.remove_evidence_from_report(report_id, evidence_id),
                collection::replace,
            )
            .await
    }

    pub fn by_author(&self, user_id: &str) -> Vec<Report> {
        self.collection
            .view()
            .into_iter()
            .filter(|r| r.author_id.as_deref() == Some(user_id))
            .collect()
    }
}

#[async_trait]
impl CollectionController for ReportController {
    type Item = Report;

    fn collection(&self) -> &Collection<Report> {
        &self.collection
    }

    fn sync_slot(&self) -> &SyncSlot {
        &self.sync
    }

    async fn fetch_remote(&self) -> Result<Vec<Report>> {
        self.client.list_reports().await
    }
}
