//! Forensia core: cached, self-refreshing access to the forensic case service.
//!
//! Each resource type (evidence, evidence images, odontograms, reports,
//! victims) gets one controller that caches the fetched collection with a
//! TTL, collapses concurrent fetches into one request, keeps a view in step
//! with local mutations and can poll the service in the background.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use forensia_core::{CollectionController, Config, Controllers, HttpClient};
//!
//! let config = Config::load()?;
//! let client = HttpClient::new(config.api_base_url(), config.request_timeout())?;
//! let controllers = Controllers::new(Arc::new(client), &config.controller_settings());
//!
//! let evidence = controllers.evidence.list(false).await?;
//! println!("{} evidence items", evidence.data.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod models;
pub mod registry;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, HttpClient, ResourceClient};
pub use config::Config;
pub use controller::{
    CollectionController, ControllerSettings, EvidenceController, EvidenceImageController,
    ListResult, ListSource, OdontogramController, ReportController, Snapshot, VictimController,
};
pub use registry::Controllers;
