//! In-memory stand-in for the case service, used by controller tests.
//!
//! Every call is counted by operation name. Individual operations can be made
//! to fail or to take time (on tokio's paused clock) to exercise the guards.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::api::{
    ApiError, EvidenceApi, EvidenceImageApi, OdontogramApi, ReportApi, Result, VictimApi,
};
use crate::models::{
    Evidence, EvidenceImage, EvidenceImageInput, EvidenceInput, Odontogram, OdontogramInput,
    Record, Report, ReportInput, Victim, VictimInput,
};

#[derive(Default)]
pub(crate) struct FakeBackend {
    evidence: Mutex<Vec<Evidence>>,
    odontograms: Mutex<Vec<Odontogram>>,
    reports: Mutex<Vec<Report>>,
    victims: Mutex<Vec<Victim>>,
    images: Mutex<Vec<EvidenceImage>>,
    calls: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, String>>,
    latency: Mutex<HashMap<String, Duration>>,
    next_id: Mutex<u64>,
}

/// Build a record from an input payload plus server-assigned fields.
pub(crate) fn materialize<T: Record, I: Serialize>(input: &I, fields: &[(&str, &str)]) -> T {
    let mut value = serde_json::to_value(input).expect("serialize input");
    let object = value.as_object_mut().expect("input is an object");
    for (key, field) in fields {
        object.insert((*key).to_string(), Value::String((*field).to_string()));
    }
    serde_json::from_value(value).expect("materialize record")
}

/// Overlay the set fields of `input` onto `record`.
fn merge<T: Record, I: Serialize>(record: &T, input: &I) -> T {
    let mut value = serde_json::to_value(record).expect("serialize record");
    let patch = serde_json::to_value(input).expect("serialize input");
    if let (Some(target), Some(patch)) = (value.as_object_mut(), patch.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
    serde_json::from_value(value).expect("merge record")
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("{} no encontrado", id))
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Mutex::new(100),
            ..Default::default()
        }
    }

    /// The next created record gets number `n` (ids are prefix + number).
    pub(crate) fn next_ids_from(&self, n: u64) {
        *self.next_id.lock() = n.saturating_sub(1);
    }

    pub(crate) fn calls(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }

    pub(crate) fn fail(&self, op: &str, message: &str) {
        self.failures
            .lock()
            .insert(op.to_string(), message.to_string());
    }

    pub(crate) fn recover(&self, op: &str) {
        self.failures.lock().remove(op);
    }

    pub(crate) fn set_latency(&self, op: &str, latency: Duration) {
        self.latency.lock().insert(op.to_string(), latency);
    }

    pub(crate) fn seed_evidence(&self, rows: Vec<Evidence>) {
        *self.evidence.lock() = rows;
    }

    pub(crate) fn seed_images(&self, rows: Vec<EvidenceImage>) {
        *self.images.lock() = rows;
    }

    pub(crate) fn seed_victims(&self, rows: Vec<Victim>) {
        *self.victims.lock() = rows;
    }

    pub(crate) fn seed_reports(&self, rows: Vec<Report>) {
        *self.reports.lock() = rows;
    }

    pub(crate) fn seed_odontograms(&self, rows: Vec<Odontogram>) {
        *self.odontograms.lock() = rows;
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{}{}", prefix, *next)
    }

    /// Count the call, wait out any configured latency, then apply failures.
    async fn enter(&self, op: &str) -> Result<()> {
        *self.calls.lock().entry(op.to_string()).or_insert(0) += 1;
        let latency = self.latency.lock().get(op).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let failure = self.failures.lock().get(op).cloned();
        match failure {
            Some(message) => Err(ApiError::Remote(message)),
            None => Ok(()),
        }
    }
}

pub(crate) fn evidence(id: &str, kind: &str) -> Evidence {
    materialize(&EvidenceInput::with_kind(kind), &[("id", id)])
}

pub(crate) fn image(id: &str, evidence_id: &str) -> EvidenceImage {
    materialize(
        &EvidenceImageInput {
            url: Some(format!("https://img.local/{}.jpg", id)),
            description: None,
        },
        &[("id", id), ("evidenciaId", evidence_id)],
    )
}

pub(crate) fn victim(id: &str, name: &str) -> Victim {
    materialize(
        &VictimInput {
            name: Some(name.to_string()),
            case_id: Some("c1".to_string()),
            identified: Some(true),
        },
        &[("id", id)],
    )
}

pub(crate) fn report(id: &str, title: &str) -> Report {
    materialize(
        &ReportInput {
            title: Some(title.to_string()),
            author_id: Some("u1".to_string()),
            ..Default::default()
        },
        &[("id", id)],
    )
}

pub(crate) fn odontogram(id: &str, victim_id: &str) -> Odontogram {
    materialize(
        &OdontogramInput {
            victim_id: Some(victim_id.to_string()),
            ..Default::default()
        },
        &[("id", id)],
    )
}

fn find<T: Record>(rows: &Mutex<Vec<T>>, id: &str) -> Result<T> {
    rows.lock()
        .iter()
        .find(|r| r.id() == id)
        .cloned()
        .ok_or_else(|| not_found(id))
}

fn modify<T: Record>(rows: &Mutex<Vec<T>>, id: &str, change: impl FnOnce(&mut T)) -> Result<T> {
    let mut rows = rows.lock();
    let row = rows
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| not_found(id))?;
    change(row);
    Ok(row.clone())
}

fn delete<T: Record>(rows: &Mutex<Vec<T>>, id: &str) -> Result<()> {
    let mut rows = rows.lock();
    let before = rows.len();
    rows.retain(|r| r.id() != id);
    if rows.len() == before {
        return Err(not_found(id));
    }
    Ok(())
}

#[async_trait]
impl EvidenceApi for FakeBackend {
    async fn list_evidence(&self) -> Result<Vec<Evidence>> {
        self.enter("list_evidence").await?;
        Ok(self.evidence.lock().clone())
    }

    async fn get_evidence(&self, id: &str) -> Result<Evidence> {
        self.enter("get_evidence").await?;
        find(&self.evidence, id)
    }

    async fn create_evidence(&self, input: &EvidenceInput) -> Result<Evidence> {
        self.enter("create_evidence").await?;
        let id = self.next_id("e");
        let record: Evidence = materialize(input, &[("id", id.as_str())]);
        self.evidence.lock().push(record.clone());
        Ok(record)
    }

    async fn update_evidence(&self, id: &str, input: &EvidenceInput) -> Result<Evidence> {
        self.enter("update_evidence").await?;
        let current = find(&self.evidence, id)?;
        let updated = merge(&current, input);
        modify(&self.evidence, id, |row| *row = updated)
    }

    async fn delete_evidence(&self, id: &str, _case_id: &str) -> Result<()> {
        self.enter("delete_evidence").await?;
        delete(&self.evidence, id)
    }

    async fn add_image_to_evidence(&self, evidence_id: &str, image_id: &str) -> Result<Evidence> {
        self.enter("add_image_to_evidence").await?;
        modify(&self.evidence, evidence_id, |row| {
            row.image_ids.push(image_id.to_string())
        })
    }

    async fn remove_image_from_evidence(
        &self,
        evidence_id: &str,
        image_id: &str,
    ) -> Result<Evidence> {
        self.enter("remove_image_from_evidence").await?;
        modify(&self.evidence, evidence_id, |row| {
            row.image_ids.retain(|i| i != image_id)
        })
    }
}

#[async_trait]
impl OdontogramApi for FakeBackend {
    async fn list_odontograms(&self) -> Result<Vec<Odontogram>> {
        self.enter("list_odontograms").await?;
        Ok(self.odontograms.lock().clone())
    }

    async fn get_odontogram(&self, id: &str) -> Result<Odontogram> {
        self.enter("get_odontogram").await?;
        find(&self.odontograms, id)
    }

    async fn create_odontogram(&self, input: &OdontogramInput) -> Result<Odontogram> {
        self.enter("create_odontogram").await?;
        let id = self.next_id("o");
        let record: Odontogram = materialize(input, &[("id", id.as_str())]);
        self.odontograms.lock().push(record.clone());
        Ok(record)
    }

    async fn update_odontogram(&self, id: &str, input: &OdontogramInput) -> Result<Odontogram> {
        self.enter("update_odontogram").await?;
        let current = find(&self.odontograms, id)?;
        let updated = merge(&current, input);
        modify(&self.odontograms, id, |row| *row = updated)
    }

    async fn delete_odontogram(&self, id: &str, _victim_id: &str) -> Result<()> {
        self.enter("delete_odontogram").await?;
        delete(&self.odontograms, id)
    }
}

#[async_trait]
impl ReportApi for FakeBackend {
    async fn list_reports(&self) -> Result<Vec<Report>> {
        self.enter("list_reports").await?;
        Ok(self.reports.lock().clone())
    }

    async fn get_report(&self, id: &str) -> Result<Report> {
        self.enter("get_report").await?;
        find(&self.reports, id)
    }

    async fn create_report(&self, input: &ReportInput) -> Result<Report> {
        self.enter("create_report").await?;
        let id = self.next_id("r");
        let record: Report = materialize(input, &[("id", id.as_str())]);
        self.reports.lock().push(record.clone());
        Ok(record)
    }

    async fn update_report(&self, id: &str, input: &ReportInput) -> Result<Report> {
        self.enter("update_report").await?;
        let current = find(&self.reports, id)?;
        let updated = merge(&current, input);
        modify(&self.reports, id, |row| *row = updated)
    }

    async fn delete_report(&self, id: &str, user_id: &str) -> Result<()> {
        self.enter("delete_report").await?;
        let report = find(&self.reports, id)?;
        if report.author_id.as_deref() != Some(user_id) {
            return Err(ApiError::AccessDenied("Solo el autor puede eliminar".into()));
        }
        delete(&self.reports, id)
    }

    async fn add_evidence_to_report(&self, report_id: &str, evidence_id: &str) -> Result<Report> {
        self.enter("add_evidence_to_report").await?;
        modify(&self.reports, report_id, |row| {
            row.evidence_ids.push(evidence_id.to_string())
        })
    }

    async fn remove_evidence_from_report(
        &self,
        report_id: &str,
        evidence_id: &str,
    ) -> Result<Report> {
        self.enter("remove_evidence_from_report").await?;
        modify(&self.reports, report_id, |row| {
            row.evidence_ids.retain(|e| e != evidence_id)
        })
    }
}

#[async_trait]
impl VictimApi for FakeBackend {
    async fn list_victims(&self) -> Result<Vec<Victim>> {
        self.enter("list_victims").await?;
        Ok(self.victims.lock().clone())
    }

    async fn get_victim(&self, id: &str) -> Result<Victim> {
        self.enter("get_victim").await?;
        find(&self.victims, id)
    }

    async fn create_victim(&self, input: &VictimInput) -> Result<Victim> {
        self.enter("create_victim").await?;
        let id = self.next_id("v");
        let record: Victim = materialize(input, &[("id", id.as_str())]);
        self.victims.lock().push(record.clone());
        Ok(record)
    }

    async fn update_victim(&self, id: &str, input: &VictimInput) -> Result<Victim> {
        self.enter("update_victim").await?;
        let current = find(&self.victims, id)?;
        let updated = merge(&current, input);
        modify(&self.victims, id, |row| *row = updated)
    }

    async fn delete_victim(&self, id: &str, _case_id: &str) -> Result<()> {
        self.enter("delete_victim").await?;
        delete(&self.victims, id)
    }

    async fn add_evidence_to_victim(&self, victim_id: &str, evidence_id: &str) -> Result<Victim> {
        self.enter("add_evidence_to_victim").await?;
        modify(&self.victims, victim_id, |row| {
            row.evidence_ids.push(evidence_id.to_string())
        })
    }

    async fn remove_evidence_from_victim(
        &self,
        victim_id: &str,
        evidence_id: &str,
    ) -> Result<Victim> {
        self.enter("remove_evidence_from_victim").await?;
        modify(&self.victims, victim_id, |row| {
            row.evidence_ids.retain(|e| e != evidence_id)
        })
    }
}

#[async_trait]
impl EvidenceImageApi for FakeBackend {
    async fn list_images(&self, evidence_id: &str) -> Result<Vec<EvidenceImage>> {
        self.enter("list_images").await?;
        Ok(self
            .images
            .lock()
            .iter()
            .filter(|i| i.evidence_id.as_deref() == Some(evidence_id))
            .cloned()
            .collect())
    }

    async fn get_image(&self, _evidence_id: &str, image_id: &str) -> Result<EvidenceImage> {
        self.enter("get_image").await?;
        find(&self.images, image_id)
    }

    async fn create_image(
        &self,
        evidence_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        self.enter("create_image").await?;
        let id = self.next_id("img");
        let record: EvidenceImage =
            materialize(input, &[("id", id.as_str()), ("evidenciaId", evidence_id)]);
        self.images.lock().push(record.clone());
        Ok(record)
    }

    async fn update_image(
        &self,
        _evidence_id: &str,
        image_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        self.enter("update_image").await?;
        let current = find(&self.images, image_id)?;
        let updated = merge(&current, input);
        modify(&self.images, image_id, |row| *row = updated)
    }

    async fn delete_image(&self, _evidence_id: &str, image_id: &str) -> Result<()> {
        self.enter("delete_image").await?;
        delete(&self.images, image_id)
    }
}
