//! Remote client contracts the controllers are written against.
//!
//! One trait per resource type. `HttpClient` implements all of them over REST;
//! tests plug in an in-memory backend.

use async_trait::async_trait;

use crate::models::{
    Evidence, EvidenceImage, EvidenceImageInput, EvidenceInput, Odontogram, OdontogramInput,
    Report, ReportInput, Victim, VictimInput,
};

use super::error::Result;

#[async_trait]
pub trait EvidenceApi: Send + Sync {
    async fn list_evidence(&self) -> Result<Vec<Evidence>>;
    async fn get_evidence(&self, id: &str) -> Result<Evidence>;
    async fn create_evidence(&self, input: &EvidenceInput) -> Result<Evidence>;
    async fn update_evidence(&self, id: &str, input: &EvidenceInput) -> Result<Evidence>;
    /// `case_id` is the owning case; the service checks it before cascading.
    async fn delete_evidence(&self, id: &str, case_id: &str) -> Result<()>;
    async fn add_image_to_evidence(&self, evidence_id: &str, image_id: &str) -> Result<Evidence>;
    async fn remove_image_from_evidence(
        &self,
        evidence_id: &str,
        image_id: &str,
    ) -> Result<Evidence>;
}

#[async_trait]
pub trait OdontogramApi: Send + Sync {
    async fn list_odontograms(&self) -> Result<Vec<Odontogram>>;
    async fn get_odontogram(&self, id: &str) -> Result<Odontogram>;
    async fn create_odontogram(&self, input: &OdontogramInput) -> Result<Odontogram>;
    async fn update_odontogram(&self, id: &str, input: &OdontogramInput) -> Result<Odontogram>;
    async fn delete_odontogram(&self, id: &str, victim_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ReportApi: Send + Sync {
    async fn list_reports(&self) -> Result<Vec<Report>>;
    async fn get_report(&self, id: &str) -> Result<Report>;
    async fn create_report(&self, input: &ReportInput) -> Result<Report>;
    async fn update_report(&self, id: &str, input: &ReportInput) -> Result<Report>;
    /// `user_id` is the requesting author; only authors may delete their reports.
    async fn delete_report(&self, id: &str, user_id: &str) -> Result<()>;
    async fn add_evidence_to_report(&self, report_id: &str, evidence_id: &str) -> Result<Report>;
    async fn remove_evidence_from_report(
        &self,
        report_id: &str,
        evidence_id: &str,
    ) -> Result<Report>;
}

#[async_trait]
pub trait VictimApi: Send + Sync {
    async fn list_victims(&self) -> Result<Vec<Victim>>;
    async fn get_victim(&self, id: &str) -> Result<Victim>;
    async fn create_victim(&self, input: &VictimInput) -> Result<Victim>;
    async fn update_victim(&self, id: &str, input: &VictimInput) -> Result<Victim>;
    async fn delete_victim(&self, id: &str, case_id: &str) -> Result<()>;
    async fn add_evidence_to_victim(&self, victim_id: &str, evidence_id: &str) -> Result<Victim>;
    async fn remove_evidence_from_victim(
        &self,
        victim_id: &str,
        evidence_id: &str,
    ) -> Result<Victim>;
}

/// Images are always addressed through their parent evidence.
#[async_trait]
pub trait EvidenceImageApi: Send + Sync {
    async fn list_images(&self, evidence_id: &str) -> Result<Vec<EvidenceImage>>;
    async fn get_image(&self, evidence_id: &str, image_id: &str) -> Result<EvidenceImage>;
    async fn create_image(
        &self,
        evidence_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage>;
    async fn update_image(
        &self,
        evidence_id: &str,
        image_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage>;
    async fn delete_image(&self, evidence_id: &str, image_id: &str) -> Result<()>;
}

/// A client that serves every resource type.
pub trait ResourceClient:
    EvidenceApi + OdontogramApi + ReportApi + VictimApi + EvidenceImageApi
{
}

impl<T> ResourceClient for T where
    T: EvidenceApi + OdontogramApi + ReportApi + VictimApi + EvidenceImageApi
{
}
