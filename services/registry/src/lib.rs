//! # Helm Chart Registry
//!
//! A stand-in for an OCI artifact registry that serves synthetic Helm charts.
//! Every manifest request builds a fresh chart: a JSON chart descriptor as the
//! config blob and a gzip-compressed tarball as the single layer. Both blobs
//! land in a content-addressed store, where later blob requests find them.
//!
//! ## Features
//!
//! - Manifest and blob GET under `/v2/`, with multi-segment repository names
//! - Blob upload acknowledgement (POST/PUT), storing uploaded bodies by digest
//! - Pluggable content store via [`ContentStore`], in memory by default
//! - Stable or always-regenerated manifest content, see [`ManifestMode`]
//! - OCI-style JSON error bodies
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use helm_registry::{MemoryStore, RegistryBuilder, RegistryConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegistryBuilder::new()
//!     .store(Arc::new(MemoryStore::new()))
//!     .config(RegistryConfig::default())
//!     .build();
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//! axum::serve(listener, registry).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod blob;
mod chart;
mod config;
mod digest;
mod error;
mod manifest;
mod store;
mod target;

pub use api::RegistryBuilder;
pub use chart::{ChartDescriptor, ChartSynthesizer, SynthesisError};
pub use config::{ConfigError, ManifestMode, RegistryConfig};
pub use digest::{Digest, InvalidDigest};
pub use error::{RegistryError, RegistryResult};
pub use manifest::{
    Descriptor, HELM_CHART_CONTENT_MEDIA_TYPE, HELM_CONFIG_MEDIA_TYPE, Manifest,
    OCI_MANIFEST_MEDIA_TYPE,
};
pub use store::{ArcStore, ContentStore, MemoryStore};
pub use target::{ObjectType, Target};
