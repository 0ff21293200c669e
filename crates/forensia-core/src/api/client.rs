//! REST client for the forensic case service.
//!
//! `HttpClient` implements every resource trait in `api::resource`. It owns the
//! transport concerns (bearer auth, timeouts, rate-limit backoff, response
//! envelopes) so the controllers only ever see records or an `ApiError`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    Evidence, EvidenceImage, EvidenceImageInput, EvidenceInput, Odontogram, OdontogramInput,
    Report, ReportInput, Victim, VictimInput,
};

use super::error::{ApiError, Result};
use super::resource::{EvidenceApi, EvidenceImageApi, OdontogramApi, ReportApi, VictimApi};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

const EVIDENCE_PATH: &str = "evidencias";
const ODONTOGRAM_PATH: &str = "odontogramas";
const REPORT_PATH: &str = "reportes";
const VICTIM_PATH: &str = "victimas";
const IMAGE_SEGMENT: &str = "imagenes";

// ============================================================================
// Response envelopes
// ============================================================================

/// Single-record responses come bare or wrapped as `{record}` / `{data}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordEnvelope<T> {
    Wrapped {
        #[serde(alias = "data")]
        record: T,
    },
    Bare(T),
}

impl<T> RecordEnvelope<T> {
    fn into_inner(self) -> T {
        match self {
            RecordEnvelope::Wrapped { record } => record,
            RecordEnvelope::Bare(record) => record,
        }
    }
}

#[derive(Deserialize)]
struct ListWrapper<T> {
    #[serde(alias = "records", alias = "items", alias = "results")]
    data: Vec<T>,
}

/// First characters of a body, for parse error messages.
fn preview(text: &str) -> String {
    text.chars().take(200).collect()
}

fn decode_record<T: DeserializeOwned>(text: &str) -> Result<T> {
    let envelope: RecordEnvelope<T> = serde_json::from_str(text).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "{} (response starts with: {})",
            e,
            preview(text)
        ))
    })?;
    Ok(envelope.into_inner())
}

fn decode_list<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    // Try parsing as a bare array first, then the common wrapper shapes
    if let Ok(records) = serde_json::from_str::<Vec<T>>(text) {
        return Ok(records);
    }
    match serde_json::from_str::<ListWrapper<T>>(text) {
        Ok(wrapper) => Ok(wrapper.data),
        Err(e) => Err(ApiError::InvalidResponse(format!(
            "{} (response starts with: {})",
            e,
            preview(text)
        ))),
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the case service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let trimmed = base_url.as_ref().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(trimmed.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so an id can never add segments or a query to the route.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, backing off on 429, and return the response body text.
    async fn send(
        &self,
        method: Method,
        path: &[&str],
        body: Option<&Value>,
        query: &[(&str, &str)],
    ) -> Result<String> {
        let url = self.url(path)?;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .headers(self.auth_headers()?);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let text = response.text().await?;
                    debug!(method = %method, url = %url, bytes = text.len(), "Response received");
                    return Ok(text);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Vec<T>> {
        let text = self.send(Method::GET, path, None, &[]).await?;
        decode_list(&text)
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let text = self.send(Method::GET, path, None, &[]).await?;
        decode_record(&text)
    }

    async fn write<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let text = self.send(method, path, Some(&body), &[]).await?;
        decode_record(&text)
    }

    /// POST/DELETE on a relationship sub-resource, returning the updated parent.
    async fn link<T: DeserializeOwned>(&self, method: Method, path: &[&str]) -> Result<T> {
        let text = self.send(method, path, None, &[]).await?;
        decode_record(&text)
    }

    async fn delete(&self, path: &[&str], query: &[(&str, &str)]) -> Result<()> {
        self.send(Method::DELETE, path, None, query).await?;
        Ok(())
    }
}

// ============================================================================
// Resource implementations
// ============================================================================

#[async_trait]
impl EvidenceApi for HttpClient {
    async fn list_evidence(&self) -> Result<Vec<Evidence>> {
        self.get_list(&[EVIDENCE_PATH]).await
    }

    async fn get_evidence(&self, id: &str) -> Result<Evidence> {
        self.get_one(&[EVIDENCE_PATH, id]).await
    }

    async fn create_evidence(&self, input: &EvidenceInput) -> Result<Evidence> {
        self.write(Method::POST, &[EVIDENCE_PATH], input).await
    }

    async fn update_evidence(&self, id: &str, input: &EvidenceInput) -> Result<Evidence> {
        self.write(Method::PUT, &[EVIDENCE_PATH, id], input).await
    }

    async fn delete_evidence(&self, id: &str, case_id: &str) -> Result<()> {
        self.delete(&[EVIDENCE_PATH, id], &[("casoId", case_id)])
            .await
    }

    async fn add_image_to_evidence(&self, evidence_id: &str, image_id: &str) -> Result<Evidence> {
        self.link(
            Method::POST,
            &[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT, image_id],
        )
        .await
    }

    async fn remove_image_from_evidence(
        &self,
        evidence_id: &str,
        image_id: &str,
    ) -> Result<Evidence> {
        self.link(
            Method::DELETE,
            &[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT, image_id],
        )
        .await
    }
}

#[async_trait]
impl OdontogramApi for HttpClient {
    async fn list_odontograms(&self) -> Result<Vec<Odontogram>> {
        self.get_list(&[ODONTOGRAM_PATH]).await
    }

    async fn get_odontogram(&self, id: &str) -> Result<Odontogram> {
        self.get_one(&[ODONTOGRAM_PATH, id]).await
    }

    async fn create_odontogram(&self, input: &OdontogramInput) -> Result<Odontogram> {
        self.write(Method::POST, &[ODONTOGRAM_PATH], input).await
    }

    async fn update_odontogram(&self, id: &str, input: &OdontogramInput) -> Result<Odontogram> {
        self.write(Method::PUT, &[ODONTOGRAM_PATH, id], input).await
    }

    async fn delete_odontogram(&self, id: &str, victim_id: &str) -> Result<()> {
        self.delete(&[ODONTOGRAM_PATH, id], &[("victimaId", victim_id)])
            .await
    }
}

#[async_trait]
impl ReportApi for HttpClient {
    async fn list_reports(&self) -> Result<Vec<Report>> {
        self.get_list(&[REPORT_PATH]).await
    }

    async fn get_report(&self, id: &str) -> Result<Report> {
        self.get_one(&[REPORT_PATH, id]).await
    }

    async fn create_report(&self, input: &ReportInput) -> Result<Report> {
        self.write(Method::POST, &[REPORT_PATH], input).await
    }

    async fn update_report(&self, id: &str, input: &ReportInput) -> Result<Report> {
        self.write(Method::PUT, &[REPORT_PATH, id], input).await
    }

    async fn delete_report(&self, id: &str, user_id: &str) -> Result<()> {
        self.delete(&[REPORT_PATH, id], &[("usuarioId", user_id)])
            .await
    }

    async fn add_evidence_to_report(&self, report_id: &str, evidence_id: &str) -> Result<Report> {
        self.link(
            Method::POST,
            &[REPORT_PATH, report_id, EVIDENCE_PATH, evidence_id],
        )
        .await
    }

    async fn remove_evidence_from_report(
        &self,
        report_id: &str,
        evidence_id: &str,
    ) -> Result<Report> {
        self.link(
            Method::DELETE,
            &[REPORT_PATH, report_id, EVIDENCE_PATH, evidence_id],
        )
        .await
    }
}

#[async_trait]
impl VictimApi for HttpClient {
    async fn list_victims(&self) -> Result<Vec<Victim>> {
        self.get_list(&[VICTIM_PATH]).await
    }

    async fn get_victim(&self, id: &str) -> Result<Victim> {
        self.get_one(&[VICTIM_PATH, id]).await
    }

    async fn create_victim(&self, input: &VictimInput) -> Result<Victim> {
        self.write(Method::POST, &[VICTIM_PATH], input).await
    }

    async fn update_victim(&self, id: &str, input: &VictimInput) -> Result<Victim> {
        self.write(Method::PUT, &[VICTIM_PATH, id], input).await
    }

    async fn delete_victim(&self, id: &str, case_id: &str) -> Result<()> {
        self.delete(&[VICTIM_PATH, id], &[("casoId", case_id)])
            .await
    }

    async fn add_evidence_to_victim(&self, victim_id: &str, evidence_id: &str) -> Result<Victim> {
        self.link(
            Method::POST,
            &[VICTIM_PATH, victim_id, EVIDENCE_PATH, evidence_id],
        )
        .await
    }

    async fn remove_evidence_from_victim(
        &self,
        victim_id: &str,
        evidence_id: &str,
    ) -> Result<Victim> {
        self.link(
            Method::DELETE,
            &[VICTIM_PATH, victim_id, EVIDENCE_PATH, evidence_id],
        )
        .await
    }
}

#[async_trait]
impl EvidenceImageApi for HttpClient {
    async fn list_images(&self, evidence_id: &str) -> Result<Vec<EvidenceImage>> {
        self.get_list(&[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT])
            .await
    }

    async fn get_image(&self, evidence_id: &str, image_id: &str) -> Result<EvidenceImage> {
        self.get_one(&[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT, image_id])
            .await
    }

    async fn create_image(
        &self,
        evidence_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        self.write(
            Method::POST,
            &[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT],
            input,
        )
        .await
    }

    async fn update_image(
        &self,
        evidence_id: &str,
        image_id: &str,
        input: &EvidenceImageInput,
    ) -> Result<EvidenceImage> {
        self.write(
            Method::PUT,
            &[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT, image_id],
            input,
        )
        .await
    }

    async fn delete_image(&self, evidence_id: &str, image_id: &str) -> Result<()> {
        self.delete(&[EVIDENCE_PATH, evidence_id, IMAGE_SEGMENT, image_id], &[])
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
