//! BrandVault library -- brand catalog service.
//!
//! This crate provides the components for running a small brand-catalog
//! HTTP service: request handling, logo validation and sniffing,
//! a pluggable catalog store, and pluggable blob storage for logo bytes.

use std::sync::Arc;

pub mod catalog;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod server;
pub mod service;
pub mod storage;

use crate::config::Config;
use crate::service::BrandCatalog;
use crate::storage::backend::BlobStore;

/// Shared application state passed to all handlers via `axum::extract::State`.
///
/// Built once at startup (adapters injected explicitly, no process-wide
/// globals) and reused across requests.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// The brand catalog service: validation and coordination logic.
    pub service: BrandCatalog,
    /// Blob store, shared with the service; the logo route reads from it.
    pub blobs: Arc<dyn BlobStore>,
}
