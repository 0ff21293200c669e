//! Remote API access for the forensic case service.
//!
//! This module provides:
//! - the per-resource client traits the controllers call into
//! - `HttpClient`, the REST implementation of those traits
//! - `ApiError`, the single error type every client reports
//!
//! Requests authenticate with a bearer token obtained elsewhere; this crate
//! never stores credentials.

pub mod client;
pub mod error;
pub mod resource;

pub use client::HttpClient;
pub use error::{ApiError, Result};
pub use resource::{
    EvidenceApi, EvidenceImageApi, OdontogramApi, ReportApi, ResourceClient, VictimApi,
};
