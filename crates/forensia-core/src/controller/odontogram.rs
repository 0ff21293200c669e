use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{OdontogramApi, Result};
use crate::models::{Odontogram, OdontogramInput};
use crate::sync::SyncSlot;

use super::collection::{self, Collection};
use super::{CollectionController, ControllerSettings};

/// Dental charts, one collection shared across the app.
pub struct OdontogramController {
    client: Arc<dyn OdontogramApi>,
    collection: Collection<Odontogram>,
    sync: SyncSlot,
}

impl OdontogramController {
    pub const RESOURCE: &'static str = "odontograms";

    pub fn new(client: Arc<dyn OdontogramApi>, settings: &ControllerSettings) -> Self {
        Self {
            client,
            collection: Collection::new(Self::RESOURCE, settings),
            sync: SyncSlot::new(),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Odontogram> {
        self.client.get_odontogram(id).await
    }

    pub async fn create(&self, input: &OdontogramInput) -> Result<Odontogram> {
        self.collection
            .mutate("create", || self.client.create_odontogram(input), collection::append)
            .await
    }

    pub async fn update(&self, id: &str, input: &OdontogramInput) -> Result<Odontogram> {
        self.collection
            .mutate(
                "update",
                || self.client.update_odontogram(id, input),
                collection::replace,
            )
            .await
    }

    pub async fn delete(&self, id: &str, victim_id: &str) -> Result<()> {
        self.collection
            .mutate(
                "delete",
                || self.client.delete_odontogram(id, victim_id),
                |view, _| collection::remove(view, id),
            )
            .await
    }

    /// The chart recorded for a victim, from the current view.
    pub fn for_victim(&self, victim_id: &str) -> Option<Odontogram> {
        self.collection
            .view()
            .into_iter()
            .find(|o| o.victim_id.as_deref() == Some(victim_id))
    }
}

#[async_trait]
impl CollectionController for OdontogramController {
    type Item = Odontogram;

    fn collection(&self) -> &Collection<Odontogram> {
        &self.collection
    }

    fn sync_slot(&self) -> &SyncSlot {
        &self.sync
    }

    async fn fetch_remote(&self) -> Result<Vec<Odontogram>> {
        self.client.list_odontograms().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ListSource;
    use crate::models::ToothRecord;
    use crate::testing::{self, FakeBackend};

    fn setup() -> (Arc<FakeBackend>, OdontogramController) {
        let backend = Arc::new(FakeBackend::new());
        backend.seed_odontograms(vec![testing::odontogram("o1", "v1")]);
        let controller = OdontogramController::new(backend.clone(), &ControllerSettings::default());
        (backend, controller)
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_is_cached_until_update() {
        let (backend, controller) = setup();
        controller.list(false).await.expect("list");
        assert_eq!(
            controller.list(false).await.expect("list").source,
            ListSource::Cache
        );

        let input = OdontogramInput {
            teeth: Some(vec![ToothRecord {
                number: 36,
                state: "obturado".to_string(),
                notes: Some("amalgama".to_string()),
            }]),
            ..Default::default()
        };
        controller.update("o1", &input).await.expect("update");

        let chart = controller.for_victim("v1").expect("chart in view");
        assert_eq!(chart.tooth(36).map(|t| t.state.as_str()), Some("obturado"));

        assert_eq!(
            controller.list(false).await.expect("list").source,
            ListSource::Network
        );
        assert_eq!(backend.calls("list_odontograms"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_then_delete() {
        let (_backend, controller) = setup();
        controller.list(false).await.expect("list");

        let created = controller
            .create(&OdontogramInput {
                victim_id: Some("v2".to_string()),
                ..Default::default()
            })
            .await
            .expect("create");
        assert!(controller.for_victim("v2").is_some());

        controller.delete(&created.id, "v2").await.expect("delete");
        assert!(controller.for_victim("v2").is_none());
        assert_eq!(controller.data().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_delete_keeps_record() {
        let (backend, controller) = setup();
        controller.list(false).await.expect("list");
        backend.fail("delete_odontogram", "No autorizado");

        let err = controller.delete("o1", "v1").await.unwrap_err();
        assert_eq!(err.message(), "No autorizado");
        assert!(controller.for_victim("v1").is_some());
        assert!(controller.collection().has_cache());
    }
}
